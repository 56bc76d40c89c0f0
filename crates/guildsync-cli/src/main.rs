//! guildsync - command line access to the guild site's collections.
//!
//! Reads go through the same tiered store the site uses: memory cache, local
//! store, then the static JSON files. Edits land in the local store; use
//! `export` to produce the JSON to commit back into the site's `data/` folder.

mod cli;
mod commands;

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use guildsync_core::{remote, Config, FileStore, LocalStore, MemoryStore, SyncedCollectionStore};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

/// Initialize the tracing subscriber for logging.
/// The returned guard must stay alive for the file writer to flush.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().unwrap_or(OsStr::new("guildsync.log"));
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env()?;

    if let Some(ref remote) = cli.remote {
        config.remote_base = remote.clone();
    }
    if let Some(ref storage) = cli.storage {
        config.storage_dir = Some(storage.clone());
    }
    Ok(config)
}

fn build_store(config: &Config, ephemeral: bool) -> Result<SyncedCollectionStore> {
    let local: Arc<dyn LocalStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let dir = config.storage_dir()?;
        debug!(dir = %dir.display(), "Using local store directory");
        Arc::new(FileStore::new(dir).context("Failed to open local store")?)
    };

    let remote = remote::from_base(&config.remote_base, config.request_timeout())
        .context("Failed to create remote client")?;

    Ok(SyncedCollectionStore::new(local, remote).with_ttl(config.cache_ttl()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _guard = init_tracing(config.log_file.as_deref());
    info!(remote = %config.remote_base, "guildsync starting");

    let store = build_store(&config, cli.ephemeral)?;
    let mut stdout = io::stdout().lock();
    commands::run(&store, cli.command, &mut stdout).await
}
