use clap::{Parser, Subcommand};
use rich_text_editor::richtext::html_converter::{document_from_html, html_from_document, is_html};
use rich_text_editor::richtext::list_layout::ListMarkerLayout;
use rich_text_editor::richtext::styled_document::{DefaultAttributes, Font, StyledDocument};
use rich_text_editor::settings::{
    EditorSettings, load_settings, save_settings, settings_file_path,
};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rte")]
#[command(about = "Convert and inspect rich text as HTML", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Default font family for unstyled text
    #[arg(long, global = true, default_value = "Helvetica")]
    font: String,

    /// Default font size in points
    #[arg(long, global = true, default_value = "12")]
    size: f32,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import HTML and write it back out in normalized form
    Export {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Print the plain text of an HTML document, with list markers
    Text {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Report whether the input looks like HTML (exit status 1 if not)
    Check {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Show the settings file location and the effective settings
    Settings {
        /// Write the effective settings to the settings file
        #[arg(long)]
        write: bool,
    },
}

fn read_input(file: Option<&PathBuf>) -> Result<String, String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e)),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(input)
        }
    }
}

fn load_document(input: &str, defaults: &DefaultAttributes) -> StyledDocument {
    match document_from_html(input, defaults) {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(%err, "input is not usable HTML; treating it as plain text");
            StyledDocument::from_plain_text(
                input,
                &defaults.text_attributes(),
                &defaults.paragraph_style,
            )
        }
    }
}

fn effective_settings() -> (Option<PathBuf>, EditorSettings) {
    let path = settings_file_path();
    let settings = path.as_deref().map(load_settings).unwrap_or_default();
    (path, settings)
}

fn cmd_export(file: Option<PathBuf>, defaults: &DefaultAttributes) -> Result<(), String> {
    let input = read_input(file.as_ref())?;
    let document = load_document(&input, defaults);
    print!("{}", html_from_document(&document, defaults));
    Ok(())
}

fn cmd_text(file: Option<PathBuf>, defaults: &DefaultAttributes) -> Result<(), String> {
    let input = read_input(file.as_ref())?;
    let document = load_document(&input, defaults);
    let (_, settings) = effective_settings();
    let layout = ListMarkerLayout::new(settings.list_layout);
    println!("{}", layout.render_plain_text(&document));
    Ok(())
}

fn cmd_check(file: Option<PathBuf>) -> Result<(), String> {
    let input = read_input(file.as_ref())?;
    if is_html(&input) {
        println!("html");
        Ok(())
    } else {
        println!("text");
        std::process::exit(1);
    }
}

fn cmd_settings(write: bool) -> Result<(), String> {
    let (path, settings) = effective_settings();
    match &path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no settings directory available"),
    }
    let toml = toml::to_string_pretty(&settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    print!("{}", toml);

    if write {
        let path = path.ok_or_else(|| "No settings directory available".to_string())?;
        save_settings(&path, &settings).map_err(|e| e.to_string())?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let defaults = DefaultAttributes {
        font: Font::new(args.font, args.size),
        ..Default::default()
    };

    let result = match args.command {
        Commands::Export { file } => cmd_export(file, &defaults),
        Commands::Text { file } => cmd_text(file, &defaults),
        Commands::Check { file } => cmd_check(file),
        Commands::Settings { write } => cmd_settings(write),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
