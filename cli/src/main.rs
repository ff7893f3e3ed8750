use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;

use novelsync_backend::app_settings::ConvertSettings;
use novelsync_backend::converter::Converter;
use novelsync_backend::get_create_novelsync_dir;
use novelsync_backend::logger::{get_log_level, info, set_log_level_str};
use novelsync_backend::ui::Ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Synchronize a yWriter 7 project with OpenDocument files", long_about = None)]
struct Cli {
    /// The document to write back, or an .odt file to create a new project from.
    #[arg(value_name = "FILE_PATH")]
    source: PathBuf,

    /// Confirm overwriting the project without asking.
    #[arg(short, long, default_value_t = false)]
    yes: bool,

    /// Settings JSON file. Defaults to settings.json in the novelsync directory, if present.
    #[arg(long, value_name = "FILE_PATH", env = "NOVELSYNC_SETTINGS")]
    settings: Option<PathBuf>,

    /// Language code used when the project has none.
    #[arg(long, env = "NOVELSYNC_LANGUAGE")]
    language: Option<String>,

    /// Country code used when the project has none.
    #[arg(long, env = "NOVELSYNC_COUNTRY")]
    country: Option<String>,

    /// Log level: silent, error, warn, info or debug.
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

/// Prints to the terminal, asks on stdin.
struct ConsoleUi {
    assume_yes: bool,
}

impl Ui for ConsoleUi {
    fn ask_yes_no(&mut self, text: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [y/N] ", text);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn set_info_what(&mut self, message: &str) {
        println!("{}", message);
    }

    fn set_info_how(&mut self, message: &str) {
        println!("{}", message);
    }

    fn show_warning(&mut self, message: &str) {
        eprintln!("Warning: {}", message);
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("Error: {}", message);
    }
}

fn load_settings(cli: &Cli) -> Result<ConvertSettings> {
    let path = match &cli.settings {
        Some(p) => Some(p.clone()),
        None => {
            let dir = get_create_novelsync_dir()
                .map_err(|e| anyhow::anyhow!("Failed to get novelsync directory: {}", e))?;
            let p = dir.join("settings.json");
            if p.is_file() { Some(p) } else { None }
        }
    };

    let settings = match path {
        Some(p) => ConvertSettings::load_from_json(&p)
            .with_context(|| format!("Cannot use settings: {}", p.display()))?,
        None => ConvertSettings::default(),
    };

    Ok(settings.with_locale(cli.language.clone(), cli.country.clone()))
}

fn main() {
    // The .env file may define NOVELSYNC_DIR and the locale fallbacks.
    dotenv().ok();

    let cli = Cli::parse();

    if let Some(level) = &cli.log_level {
        if !set_log_level_str(level) {
            eprintln!("Error: Unknown log level: {}", level);
            exit(1);
        }
    }

    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit(1);
        }
    };
    info(&format!("novelsync {}, log level {}", env!("CARGO_PKG_VERSION"), get_log_level().as_str()));

    let ui = ConsoleUi { assume_yes: cli.yes };
    let mut converter = Converter::new(ui, settings);

    // Errors are already reported through the Ui.
    if converter.run(&cli.source).is_err() {
        exit(1);
    }
}
