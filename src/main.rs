use anyhow::Result;
use clap::{Parser, Subcommand};
use curmap::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch CLDR currency data and regenerate all output files (default)
    Sync {
        /// Directory to write output files to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => curmap::cli::setup::setup(),
        Some(Commands::Sync { output_dir }) => {
            curmap::run_command(
                curmap::AppCommand::Sync { output_dir },
                cli.config_path.as_deref(),
            )
            .await
        }
        None => {
            curmap::run_command(
                curmap::AppCommand::Sync { output_dir: None },
                cli.config_path.as_deref(),
            )
            .await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Process failed");
    }
    result
}
