//! Harvester CLI
//!
//! Local execution entry point.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use harvester::{error::Result, models::Config, pipeline, utils::log::TeeWriter};

/// Harvester - post metadata and media collector
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Harvests post metadata and media into a CSV dataset"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "harvester.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest every uncached URL
    Run {
        /// Read additional URLs from this file (one per line)
        #[arg(long)]
        urls_file: Option<PathBuf>,
    },

    /// Validate the configuration and URL list
    Validate,

    /// Show cache and dataset progress
    Info,
}

/// Initialize logging to the console and the log file.
fn init_logging(verbose: bool, log_file: &Path) {
    let level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{}",
            harvester::utils::log::format_line(record.level(), record.args())
        )
    });

    match TeeWriter::open(log_file) {
        Ok(tee) => {
            builder.target(env_logger::Target::Pipe(Box::new(tee)));
        }
        Err(e) => eprintln!("Cannot open log file {}: {}", log_file.display(), e),
    }

    builder.init();
}

/// Load the configuration file; a missing file means defaults, a broken one is fatal.
fn load_config(path: &Path) -> Result<(Config, bool)> {
    if path.exists() {
        Ok((Config::load(path)?, true))
    } else {
        Ok((Config::default(), false))
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, found) = load_config(&cli.config)?;
    init_logging(cli.verbose, &config.paths.log_file);

    log::info!("Starting harvester...");
    if found {
        log::info!("Loaded configuration from {}", cli.config.display());
    } else {
        log::warn!(
            "Config not found at {}. Using defaults.",
            cli.config.display()
        );
    }

    match cli.command {
        Command::Run { urls_file } => {
            if let Some(path) = urls_file {
                config.paths.urls_file = Some(path);
            }
            config.validate()?;

            let summary = pipeline::run_harvest(&config)
                .await
                .inspect_err(|e| log::error!("Harvest aborted: {}", e))?;

            log::info!(
                "Processed {} of {} pending url(s); {} failed and will be retried next run",
                summary.processed(),
                summary.to_process,
                summary.failed
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} url(s))", config.url_list()?.len());
        }

        Command::Info => {
            let (plan, rows) = pipeline::inspect(&config).await?;

            log::info!("Cache file: {}", config.paths.cache_file.display());
            log::info!("Dataset file: {} ({} row(s))", config.paths.dataset_file.display(), rows);
            log::info!("Media directory: {}", config.paths.media_dir.display());
            log::info!(
                "URLs: {} ({} unique), {} already processed, {} pending",
                plan.total,
                plan.unique,
                plan.already_cached,
                plan.to_process
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
