//! Manu Filter - Main entrypoint.
//!
//! Command-line front end for a persisted cuckoo filter. Every command
//! opens the snapshot named on the command line (or in the configuration
//! file), applies the operation and writes the snapshot back if it changed.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use manu_filter_lib::config::{self, ConfigLoader, LogConfig, ManuConfig, ENV_PREFIX};
use manu_filter_lib::data_structures::manu_cuckoo_filter::ManuCuckooFilter;

/// Command line arguments for Manu Filter.
#[derive(Parser, Debug)]
#[clap(name = "manu-filter", version, author, about)]
struct Args {
    /// Path to configuration file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Snapshot file; overrides `persistence.path`
    #[clap(short, long, value_parser)]
    filter: Option<PathBuf>,

    /// Command to execute
    #[clap(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty filter snapshot from the configured geometry
    Create {
        /// Replace an existing snapshot
        #[clap(long)]
        force: bool,
    },

    /// Insert items
    Insert {
        /// Items to insert
        #[clap(required = true)]
        items: Vec<String>,
    },

    /// Check items; exits with status 1 if any is absent
    Contains {
        /// Items to look up
        #[clap(required = true)]
        items: Vec<String>,
    },

    /// Delete items
    Delete {
        /// Items to delete
        #[clap(required = true)]
        items: Vec<String>,
    },

    /// Print filter statistics as JSON
    Stats,

    /// Validate the configuration file
    Validate,

    /// Generate a default configuration file
    GenConfig {
        /// Path to output configuration file
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
}

/// Initialize the logging system.
fn init_logging(log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(log.source_location)
        .with_line_number(log.source_location);

    let result = if log.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set global tracing subscriber: {e}"))
}

fn snapshot_path(args_path: Option<PathBuf>, config: &ManuConfig) -> Result<PathBuf> {
    args_path
        .or_else(|| config.persistence.path.clone())
        .context("no filter file given; pass --filter or set persistence.path")
}

fn open_filter(path: &Path) -> Result<ManuCuckooFilter> {
    ManuCuckooFilter::open(path).with_context(|| format!("failed to open filter {}", path.display()))
}

fn save_filter(filter: &ManuCuckooFilter, path: &Path) -> Result<()> {
    filter
        .persist(path)
        .with_context(|| format!("failed to write filter {}", path.display()))
}

fn run(args: Args, config: &ManuConfig) -> Result<bool> {
    match args.command {
        Command::Create { force } => {
            let path = snapshot_path(args.filter, config)?;
            if path.exists() && !force {
                anyhow::bail!("{} already exists; use --force to replace it", path.display());
            }
            let filter = ManuCuckooFilter::with_config(config.filter.to_filter_config())?;
            save_filter(&filter, &path)?;
            info!(path = %path.display(), bucket_count = filter.bucket_count(), "Filter created");
            Ok(true)
        }
        Command::Insert { items } => {
            let path = snapshot_path(args.filter, config)?;
            let mut filter = open_filter(&path)?;
            for item in &items {
                filter
                    .insert(item.as_bytes())
                    .with_context(|| format!("failed to insert {item:?}"))?;
            }
            save_filter(&filter, &path)?;
            info!(inserted = items.len(), occupied = filter.len(), "Items inserted");
            Ok(true)
        }
        Command::Contains { items } => {
            let path = snapshot_path(args.filter, config)?;
            let filter = open_filter(&path)?;
            let mut all_present = true;
            for item in &items {
                let present = filter.contains(item.as_bytes());
                all_present &= present;
                println!("{item}\t{}", if present { "maybe" } else { "absent" });
            }
            Ok(all_present)
        }
        Command::Delete { items } => {
            let path = snapshot_path(args.filter, config)?;
            let mut filter = open_filter(&path)?;
            let mut all_deleted = true;
            for item in &items {
                let deleted = filter.delete(item.as_bytes());
                all_deleted &= deleted;
                println!("{item}\t{}", if deleted { "deleted" } else { "not found" });
            }
            save_filter(&filter, &path)?;
            Ok(all_deleted)
        }
        Command::Stats => {
            let path = snapshot_path(args.filter, config)?;
            let filter = open_filter(&path)?;
            println!("{}", serde_json::to_string_pretty(&filter.stats())?);
            Ok(true)
        }
        Command::Validate => {
            info!("Configuration validated successfully");
            Ok(true)
        }
        Command::GenConfig { output } => {
            config::write_config(&ManuConfig::default(), &output)?;
            info!("Default configuration written to {:?}", output);
            Ok(true)
        }
    }
}

/// Main entry point for the application.
fn main() -> Result<()> {
    let args = Args::parse();

    // Generating a config must work even when the current one is broken.
    let config = if matches!(args.command, Command::GenConfig { .. }) {
        ManuConfig::default()
    } else {
        match ConfigLoader::new(args.config.as_deref(), ENV_PREFIX).load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                process::exit(2);
            }
        }
    };

    init_logging(&config.log)?;
    let config = manu_filter_lib::init(config)?;

    match run(args, config) {
        Ok(true) => Ok(()),
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{e:#}");
            Err(e)
        }
    }
}
