use crate::error::SettingsError;
use crate::richtext::list_layout::ListLayoutSettings;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

const QUALIFIER: &str = "net.roblillack";
const ORGANIZATION: &str = "RichTextEditor";
const APPLICATION: &str = "rte";
const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Behavior knobs of the editor controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub font_size_change_amount: f32,
    pub default_indentation_size: f32,
    pub allows_rich_text_paste_only_from_this_class: bool,
    pub tab_key_always_indents_outdents: bool,
    pub list_layout: ListLayoutSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        EditorSettings {
            min_font_size: 10.0,
            max_font_size: 128.0,
            font_size_change_amount: 10.0,
            default_indentation_size: 30.0,
            allows_rich_text_paste_only_from_this_class: true,
            tab_key_always_indents_outdents: false,
            list_layout: ListLayoutSettings::default(),
        }
    }
}

impl EditorSettings {
    /// Repair values a hand-edited file may get wrong
    pub fn normalized(mut self) -> Self {
        let defaults = EditorSettings::default();
        if !self.min_font_size.is_finite() || self.min_font_size <= 0.0 {
            self.min_font_size = defaults.min_font_size;
        }
        if !self.max_font_size.is_finite() || self.max_font_size <= 0.0 {
            self.max_font_size = defaults.max_font_size;
        }
        if self.min_font_size > self.max_font_size {
            std::mem::swap(&mut self.min_font_size, &mut self.max_font_size);
        }
        if !self.font_size_change_amount.is_finite() || self.font_size_change_amount <= 0.0 {
            self.font_size_change_amount = defaults.font_size_change_amount;
        }
        if !self.default_indentation_size.is_finite() || self.default_indentation_size < 0.0 {
            self.default_indentation_size = defaults.default_indentation_size;
        }
        self
    }

    /// Clamp a font size to the configured bounds
    pub fn clamp_font_size(&self, size: f32) -> f32 {
        size.clamp(self.min_font_size, self.max_font_size)
    }
}

pub fn settings_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
}

/// Read settings from a file. A missing file yields `Ok(None)`.
pub fn read_settings(path: &Path) -> Result<Option<EditorSettings>, SettingsError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(SettingsError::io(path, err)),
    };
    let settings =
        toml::from_str::<EditorSettings>(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(settings.normalized()))
}

/// Load settings, falling back to defaults when the file is missing or broken
pub fn load_settings(path: &Path) -> EditorSettings {
    match read_settings(path) {
        Ok(Some(settings)) => settings,
        Ok(None) => EditorSettings::default(),
        Err(err) => {
            tracing::warn!("{err}; using default settings");
            EditorSettings::default()
        }
    }
}

/// Load settings from the platform config directory
pub fn load_default_settings() -> EditorSettings {
    match settings_file_path() {
        Some(path) => load_settings(&path),
        None => {
            tracing::warn!("{}; using default settings", SettingsError::NoConfigDir);
            EditorSettings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &EditorSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| SettingsError::io(parent, err))?;
    }

    let toml = toml::to_string_pretty(settings)?;

    fs::write(path, toml).map_err(|err| SettingsError::io(path, err))
}
