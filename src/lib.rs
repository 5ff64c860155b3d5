pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

pub use crate::core::config;

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

pub enum AppCommand {
    Sync { output_dir: Option<PathBuf> },
}

/// Resolves configuration: an explicit path must load, otherwise the default
/// location is tried and built-in defaults are used when it has no file.
pub fn load_config(config_path: Option<&str>) -> Result<config::AppConfig> {
    match config_path {
        Some(path) => config::AppConfig::load_from_path(path),
        None => config::AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let mut config = load_config(config_path)?;

    match command {
        AppCommand::Sync { output_dir } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            debug!("Loaded config: {config:#?}");
            cli::sync::run(&config).await?;
        }
    }
    Ok(())
}
