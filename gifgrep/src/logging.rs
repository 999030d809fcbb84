// ABOUTME: env_logger setup for the command-line entry point
// ABOUTME: The interactive browser owns the screen, so its logs go to a file instead of stderr

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

const LOG_FILE: &str = "gifgrep.log";

/// `<cache_dir>/gifgrep/gifgrep.log`
pub fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("gifgrep").join(LOG_FILE))
}

fn builder(verbose: bool) -> Builder {
    let default_level = if verbose { "debug" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format_timestamp_millis();
    builder
}

/// Installs the global logger. Call once, before anything logs.
pub fn init(verbose: bool, interactive: bool) -> Result<()> {
    let mut builder = builder(verbose);

    if interactive {
        match log_file_path() {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create log directory: {}", parent.display())
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                builder.target(Target::Pipe(Box::new(file)));
            }
            // Nowhere safe to write; stay quiet rather than draw over the screen.
            None => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    } else {
        builder.target(Target::Stderr);
    }

    builder.try_init().context("Failed to initialize logger")
}
