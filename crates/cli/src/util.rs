//! Shared utilities for CLI commands

use crate::config::{StoreConfig, STORE_DIR};
use anyhow::{Context, Result};
use filemap_index::Mapper;
use std::path::PathBuf;

/// Find the store directory: the explicit flag if given, otherwise walk up
/// from the current directory to the nearest `.filemap/`.
pub fn find_store_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }

    let mut current = std::env::current_dir().context("Failed to get current directory")?;
    loop {
        let candidate = current.join(STORE_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => anyhow::bail!("Not inside a filemap store (no {STORE_DIR} directory found)"),
        }
    }
}

/// Open the mapper for an existing store.
pub fn open_mapper(explicit: Option<PathBuf>) -> Result<Mapper> {
    let store_dir = find_store_dir(explicit)?;
    let config = StoreConfig::load(&store_dir)?;
    tracing::debug!(store = %store_dir.display(), root = %config.root, "opening mapping store");
    Mapper::with_config(&store_dir, &config.root, config.mapper_config())
        .with_context(|| format!("Failed to open store at {}", store_dir.display()))
}
