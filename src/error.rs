//! Error types for the editor core.

use std::path::PathBuf;

/// Result type alias for HTML import.
pub type ImportResult<T> = std::result::Result<T, HtmlImportError>;

/// Result type alias for editor commands that take unchecked input.
pub type EditResult<T> = std::result::Result<T, EditError>;

/// Why a string could not be turned into a styled document.
///
/// Never fatal: callers fall back to treating the input as plain text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HtmlImportError {
    /// Nothing but whitespace was supplied.
    #[error("HTML input is empty")]
    Empty,

    /// The tokenizer reported errors and no content could be recovered.
    #[error("malformed HTML ({} parse errors)", errors.len())]
    Malformed { errors: Vec<String> },
}

/// Errors reading or writing the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// No configuration directory could be determined for this platform.
    #[error("no configuration directory available")]
    NoConfigDir,

    #[error("failed to access settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl SettingsError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Rejected editor input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    /// A hyperlink target that is not an absolute URL.
    #[error("invalid hyperlink '{input}': {source}")]
    InvalidHyperlink {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// A font size that is not a finite number.
    #[error("invalid font size {0}")]
    InvalidFontSize(f32),
}
