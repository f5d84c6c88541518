//! # Signal File → Redis Migration Tool
//!
//! One-shot importer for deployments moving from the JSON file mirror to the
//! Redis mirror. Reads an existing signals JSON file (newest-first array) and
//! rebuilds the Redis list with the same contents and ordering.
//!
//! The target list is cleared first, so re-running the migration is
//! idempotent rather than duplicating entries.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use lib_common::connections::store_redis::RedisSignalStore;
use lib_common::{SIGNAL_CAPACITY, SignalRecord, SignalStore};

#[derive(Parser, Debug)]
#[clap(about = "Import an existing signals JSON file into the Redis signal list.", version)]
struct Args {
    /// Path to the signals JSON file to import.
    #[clap(long, env = "SIGNALS_FILE", default_value = "signals.json")]
    signals_file: PathBuf,

    /// Redis connection URL.
    #[clap(long, env = "REDIS_URL", default_value = "redis://127.0.0.1/")]
    redis_url: String,

    /// Maximum number of signals retained after import.
    #[clap(long, env = "SIGNAL_CAPACITY", default_value_t = SIGNAL_CAPACITY)]
    capacity: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let contents = fs::read(&args.signals_file).with_context(|| {
        format!(
            "Could not read {}; nothing to migrate",
            args.signals_file.display()
        )
    })?;
    let signals: Vec<SignalRecord> = serde_json::from_slice(&contents)
        .with_context(|| format!("{} is not a valid signal array", args.signals_file.display()))?;

    if signals.is_empty() {
        println!("No signals to migrate.");
        return Ok(());
    }
    println!(
        "Loaded {} signal(s) from {}",
        signals.len(),
        args.signals_file.display()
    );

    let store = RedisSignalStore::new(&args.redis_url, args.capacity)
        .with_context(|| format!("Could not connect to Redis at {}", args.redis_url))?;

    // Rebuild from scratch so re-runs do not duplicate entries.
    store.clear().context("Failed to clear the Redis signal list")?;

    // Push oldest first so the newest signal ends up at the head of the list.
    for record in signals.iter().rev() {
        store
            .push(record)
            .context("Failed to push a signal into Redis")?;
    }

    println!(
        "Migrated {} signal(s) to Redis at {}",
        signals.len(),
        args.redis_url
    );
    Ok(())
}
