//! Backup Snapshot - Main entry point
//!
//! Create, verify and restore point-in-time snapshots of a directory tree.

use anyhow::{Context, Result};
use backup_snapshot::{integrity, utils, BackupManager, Config, RestoreConfirmation};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source directory (overrides config)
    #[arg(short, long, value_name = "DIR")]
    source: Option<PathBuf>,

    /// Backup root directory (overrides config)
    #[arg(short, long, value_name = "DIR")]
    backup_root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new timestamped snapshot of the source directory
    Create,

    /// Compare a snapshot against the current source directory
    Verify {
        /// Snapshot directory to check
        snapshot: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the content digest of every file under a directory
    Fingerprint {
        /// Directory to fingerprint (defaults to the source directory)
        dir: Option<PathBuf>,

        /// Print the fingerprint as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the source directory with a snapshot (destroys current content)
    Restore {
        /// Snapshot directory to restore from
        snapshot: PathBuf,

        /// Confirm that the current source content will be discarded
        #[arg(long)]
        yes: bool,
    },

    /// Create a snapshot, verify it, then restore from it
    Run {
        /// Confirm that the current source content will be discarded
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else {
        Config::default()
    };
    if let Some(source) = args.source {
        config.paths.source = source;
    }
    if let Some(backup_root) = args.backup_root {
        config.paths.backup_root = backup_root;
    }
    config.validate()?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::debug!(
        "backup-snapshot v{} (source: {}, backup root: {})",
        env!("CARGO_PKG_VERSION"),
        config.paths.source.display(),
        config.paths.backup_root.display()
    );

    let mut manager = BackupManager::from_config(&config);

    match args.command {
        Command::Create => {
            let snapshot = manager.create_backup()?;
            println!("{}", snapshot.display());
        }
        Command::Verify { snapshot, json } => {
            let result = manager.verify_integrity(&snapshot)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{result}");
            }
            if !result.is_identical() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Fingerprint { dir, json } => {
            let root = dir.unwrap_or_else(|| config.paths.source.clone());
            let fingerprint = integrity::fingerprint(&root)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&fingerprint)?);
            } else {
                for (path, digest) in &fingerprint.files {
                    println!("{digest}  {path}");
                }
            }
        }
        Command::Restore { snapshot, yes } => {
            manager.restore_backup(&snapshot, RestoreConfirmation::from(yes))?;
            println!("Backup restored from {}", snapshot.display());
        }
        Command::Run { yes } => {
            let confirmation = RestoreConfirmation::from(yes);
            if confirmation != RestoreConfirmation::Confirmed {
                anyhow::bail!("`run` ends with a destructive restore; pass --yes to proceed");
            }

            let snapshot = manager.create_backup()?;
            println!("Backup created at {}", snapshot.display());

            let result = manager.verify_integrity(&snapshot)?;
            println!("{result}");

            manager.restore_backup(&snapshot, confirmation)?;
            println!("Backup restored from {}", snapshot.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
