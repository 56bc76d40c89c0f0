use std::io::Write;

use anyhow::{Context, Result};
use guildsync_core::{Record, SyncedCollectionStore, Written};
use tracing::warn;

use crate::cli::{parse_fields, Command};

pub async fn run(store: &SyncedCollectionStore, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::List { name } => {
            let collection = store.read(name).await;
            writeln!(out, "{}", serde_json::to_string_pretty(&collection.items)?)?;
        }
        Command::Stats => {
            let stats = store.get_stats().await;
            writeln!(out, "photos:       {}", stats.photo_count)?;
            writeln!(out, "members:      {}", stats.member_count)?;
            writeln!(out, "last updated: {}", format_millis(stats.last_updated))?;
        }
        Command::Add { name, fields } => {
            let written = store.add(name, parse_fields(&fields)?).await;
            print_written(out, written)?;
        }
        Command::Update { name, id, fields } => {
            let patch = parse_fields(&fields)?;
            match store.update(name, &id, &patch).await {
                Some(written) => print_written(out, written)?,
                None => anyhow::bail!("No record with id {} in {}", id, name),
            }
        }
        Command::Delete { name, id } => match store.delete(name, &id).await {
            Some(written) => print_written(out, written)?,
            None => anyhow::bail!("No record with id {} in {}", id, name),
        },
        Command::Status => {
            for status in store.cache_status() {
                writeln!(
                    out,
                    "{:<8} cache: {:<10} local: {}",
                    status.name,
                    match (&status.cache_age, status.cache_fresh) {
                        (Some(age), true) => age.clone(),
                        (Some(_), false) => "expired".to_string(),
                        (None, _) => "empty".to_string(),
                    },
                    match (status.local_last_updated, status.local_items) {
                        (Some(ts), Some(items)) => format!("{} items, updated {}", items, format_millis(ts)),
                        _ => "none".to_string(),
                    }
                )?;
            }
        }
        Command::ClearCache => {
            store.clear_cache();
            writeln!(out, "Cache cleared")?;
        }
        Command::ClearAll => {
            store.clear_all().context("Failed to clear local store")?;
            writeln!(out, "Cache and local store cleared")?;
        }
        Command::Reload { name } => {
            let collection = store.force_reload(name).await;
            writeln!(out, "Reloaded {}: {} items, updated {}", name, collection.len(), format_millis(collection.last_updated))?;
        }
        Command::Restore { name } => {
            let collection = store
                .restore_from_remote(name)
                .await
                .with_context(|| format!("Failed to restore {} from remote", name))?;
            writeln!(out, "Restored {}: {} items", name, collection.len())?;
        }
        Command::Export { name, out: path } => {
            let json = store.export(name).await?;
            match path {
                Some(path) => {
                    std::fs::write(&path, format!("{}\n", json))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    writeln!(out, "Wrote {}", path.display())?;
                }
                None => writeln!(out, "{}", json)?,
            }
        }
    }
    Ok(())
}

fn print_written(out: &mut impl Write, written: Written<Record>) -> Result<()> {
    if let Err(e) = &written.saved {
        warn!(error = %e, "Change was not saved to the local store");
        writeln!(out, "warning: change not saved: {}", e)?;
    }
    writeln!(out, "{}", serde_json::to_string_pretty(&written.value)?)?;
    Ok(())
}

fn format_millis(millis: i64) -> String {
    if millis <= 0 {
        return "never".to_string();
    }
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y/%m/%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}
