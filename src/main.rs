use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use xdg_open_wsl::config::Config;
use xdg_open_wsl::launcher::{DryRunLauncher, SystemLauncher};
use xdg_open_wsl::logging::{LogContext, LogSettings};
use xdg_open_wsl::{open, Dispatcher};

/// xdg-open for WSL - open a file or URL with its Windows handler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File path or URL to open
    file_or_url: String,

    /// Append diagnostic records to this file
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    debug: bool,

    /// Print the Windows command instead of running it
    #[arg(long)]
    dry_run: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    if let Some(config_path) = &args.config {
        Config::load_from_file(config_path)
    } else {
        Config::load_default()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("xdg-open-wsl: {e:#}");
            return ExitCode::from(1);
        }
    };

    // --logfile wins over the config file, which wins over ~/.xdg-open-wsl
    let log_file = args
        .logfile
        .clone()
        .or_else(|| config.logging.file.clone())
        .or_else(|| Config::default_log_path().ok());
    let log = LogContext::init(&LogSettings {
        file: log_file,
        file_level: config.logging.level.clone(),
        debug: args.debug,
    });
    debug!("Logging to {:?}", log.log_file());

    let dispatcher = Dispatcher::from_config(&config).await;
    debug!("Using {} path translation", dispatcher.strategy().name());
    let result = if args.dry_run {
        open(&dispatcher, &DryRunLauncher, &args.file_or_url).await
    } else {
        open(&dispatcher, &SystemLauncher, &args.file_or_url).await
    };

    let code = match result {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => e.exit_code(),
    };

    // Flush the log file before exiting
    drop(log);
    ExitCode::from(code)
}
