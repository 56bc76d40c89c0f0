use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use guildsync_core::CollectionName;
use serde_json::{Map, Value};

#[derive(Debug, Parser)]
#[command(name = "guildsync", version, about = "Inspect and edit the guild site's photo and member collections")]
pub struct Cli {
    /// Config file (defaults to ~/.config/guildsync/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL or directory of the static collection files
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Directory of the local persistent store
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Keep the local store in memory for this run only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every record in a collection
    List { name: CollectionName },

    /// Print record counts and latest activity
    Stats,

    /// Add a record: `add photos title="Raid night" url=...`
    Add {
        name: CollectionName,
        /// key=value pairs; values are parsed as JSON when possible
        fields: Vec<String>,
    },

    /// Merge fields into an existing record
    Update {
        name: CollectionName,
        id: String,
        fields: Vec<String>,
    },

    /// Remove a record by id
    Delete { name: CollectionName, id: String },

    /// Show what each tier currently holds
    Status,

    /// Drop the in-memory cache
    ClearCache,

    /// Drop the in-memory cache and the local store
    ClearAll,

    /// Clear the cache and read a collection again
    Reload { name: CollectionName },

    /// Overwrite the local store with the remote copy
    Restore { name: CollectionName },

    /// Print the collection as JSON for the static files
    Export {
        name: CollectionName,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Parse `key=value` pairs into a JSON object.
/// `count=3` gives a number, `tags=["a","b"]` an array, `title=Raid` a string.
pub fn parse_fields(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Expected key=value, got {:?}", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Empty field name in {:?}", pair);
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}
