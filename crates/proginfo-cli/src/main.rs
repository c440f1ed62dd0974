//! ProgInfo CLI - inspect and back up installed programs.
//!
//! Reads the uninstall registrations of the local Windows registry through
//! proginfo-core and prints them as JSON. Logs go to stderr so the output
//! can be piped.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use proginfo_core::config::AppConfig;
use proginfo_core::{BackupManifestEntry, ProgramInfoApi, ProgramRecord};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "proginfo")]
#[command(about = "Inspect, back up and restore installed programs")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Backup folder (defaults to the local data directory)
    #[arg(long, global = true)]
    backup_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List installed programs as JSON
    List {
        /// Only programs whose display name contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Skip computing missing sizes from install directories
        #[arg(long)]
        no_fallbacks: bool,
    },
    /// Scan and write a new backup
    Backup,
    /// List existing backups
    Backups,
    /// Delete a backup by id
    Delete { id: String },
    /// Restore a backup by id into the registry
    Restore { id: String },
    /// Restore the most recent backup into the registry
    RestoreLatest,
    /// Run a program's uninstaller
    Uninstall {
        /// Exact display name
        name: String,

        /// Use the quiet uninstall command
        #[arg(short, long)]
        quiet: bool,
    },
    /// Open a program's install location
    OpenLocation { name: String },
    /// Open the registry editor at a program's uninstall key
    OpenRegistry { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let default_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let backup_dir = match args.backup_dir {
        Some(dir) => dir,
        None => default_backup_dir()?,
    };

    let fetch_fallbacks = !matches!(args.command, Command::List { no_fallbacks: true, .. });
    let api = ProgramInfoApi::builder()
        .fetch_fallbacks(fetch_fallbacks)
        .build()
        .context("Failed to initialize")?;

    match args.command {
        Command::List { filter, .. } => {
            let mut programs = api.list_programs().await;
            if let Some(filter) = filter {
                let needle = filter.to_lowercase();
                programs.retain(|p| p.name().is_some_and(|n| n.to_lowercase().contains(&needle)));
            }
            print_json(&programs)?;
        }
        Command::Backup => {
            let programs = api.list_programs().await;
            if !api.create_backup(&programs, &backup_dir) {
                bail!("Backup failed");
            }
            info!("Backup written to {}", backup_dir.display());
        }
        Command::Backups => print_json(&api.backup_infos(&backup_dir))?,
        Command::Delete { id } => {
            let entry = find_backup(&api, &backup_dir, &id)?;
            if !api.delete_backup(&backup_dir, entry.id) {
                bail!("Failed to delete backup {}", id);
            }
        }
        Command::Restore { id } => {
            let entry = find_backup(&api, &backup_dir, &id)?;
            if !api.restore_backup(&backup_dir, &entry) {
                bail!("Failed to restore backup {}", id);
            }
        }
        Command::RestoreLatest => {
            if !api.restore_latest_backup(&backup_dir) {
                bail!("No backup restored from {}", backup_dir.display());
            }
        }
        Command::Uninstall { name, quiet } => {
            let program = find_program(&api, &name).await?;
            if !api.uninstall(&program, quiet).await {
                bail!("Uninstall of {} failed", name);
            }
        }
        Command::OpenLocation { name } => {
            let program = find_program(&api, &name).await?;
            if !api.open_location(&program).await {
                bail!("Cannot open install location of {}", name);
            }
        }
        Command::OpenRegistry { name } => {
            let program = find_program(&api, &name).await?;
            if !api.open_registry_location(&program).await {
                bail!("Cannot open registry key of {}", name);
            }
        }
    }

    Ok(())
}

fn default_backup_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(AppConfig::APP_NAME).join("backups"))
        .ok_or_else(|| anyhow!("No local data directory; pass --backup-dir"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn find_backup(api: &ProgramInfoApi, folder: &Path, id: &str) -> Result<BackupManifestEntry> {
    api.backup_infos(folder)
        .into_iter()
        .find(|entry| entry.id.to_string().eq_ignore_ascii_case(id.trim()))
        .ok_or_else(|| anyhow!("No backup {} in {}", id, folder.display()))
}

async fn find_program(api: &ProgramInfoApi, name: &str) -> Result<ProgramRecord> {
    api.list_programs()
        .await
        .into_iter()
        .find(|program| program.name() == Some(name))
        .ok_or_else(|| anyhow!("No program named {:?}", name))
}
