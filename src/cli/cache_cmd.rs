//! Cache CLI commands

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::storage::{Cache, Config, ProjectError};

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show cache location and size
    Status,

    /// List cached entries
    List,

    /// Re-hash every entry and evict corrupt ones
    Verify,

    /// Remove every entry
    Clear,
}

pub fn run(cmd: CacheCommands, output: &Output, cache_dir: Option<&Path>) -> Result<()> {
    let cache = open(cache_dir)?;
    match cmd {
        CacheCommands::Status => status(output, &cache),
        CacheCommands::List => list(output, &cache),
        CacheCommands::Verify => verify(output, &cache),
        CacheCommands::Clear => clear(output, &cache),
    }
}

fn open(cache_dir: Option<&Path>) -> Result<Cache> {
    let config = Config::load()?;
    let dir = config
        .cache_dir(cache_dir)
        .ok_or(ProjectError::NoCacheDir)?;
    Cache::open(&dir).with_context(|| format!("Failed to open cache: {}", dir.display()))
}

fn status(output: &Output, cache: &Cache) -> Result<()> {
    let stats = cache.stats()?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "path": cache.path().display().to_string(),
            "entries": stats.entries,
            "total_bytes": stats.total_bytes,
        }));
    } else {
        println!("Cache Status");
        println!("{}", "=".repeat(40));
        println!("Path: {}", cache.path().display());
        println!("Entries: {}", stats.entries);
        println!("Size: {} bytes", stats.total_bytes);
    }

    Ok(())
}

fn list(output: &Output, cache: &Cache) -> Result<()> {
    let entries = cache.entries()?;

    if output.is_json() {
        output.data(&entries);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Cache is empty");
        return Ok(());
    }

    println!("{:<18} {:>10} {:<20} PATH", "KEY", "SIZE", "CREATED");
    println!("{}", "-".repeat(80));
    for entry in &entries {
        println!(
            "{:<18} {:>10} {:<20} {}",
            &entry.key[..16.min(entry.key.len())],
            entry.size,
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.path.display()
        );
    }

    Ok(())
}

fn verify(output: &Output, cache: &Cache) -> Result<()> {
    let evicted = cache.verify()?;
    let remaining = cache.stats()?.entries;

    if output.is_json() {
        output.data(&serde_json::json!({
            "evicted": evicted,
            "entries": remaining,
        }));
    } else {
        output.success(&format!(
            "Verified cache: {} evicted, {} intact",
            evicted, remaining
        ));
    }

    Ok(())
}

fn clear(output: &Output, cache: &Cache) -> Result<()> {
    let removed = cache.clear()?;

    if output.is_json() {
        output.data(&serde_json::json!({ "removed": removed }));
    } else {
        let noun = if removed == 1 { "entry" } else { "entries" };
        output.success(&format!("Cleared {} cache {}", removed, noun));
    }

    Ok(())
}
