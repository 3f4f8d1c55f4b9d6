//! Create a new mapping store

use crate::config::{MissingPathSetting, StoreConfig, STORE_DIR};
use anyhow::Result;
use filemap_index::PathIndex;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub fn run(store: Option<PathBuf>, root: &str, strict_remove: bool) -> Result<()> {
    let store_dir = match store {
        Some(dir) => dir,
        None => std::env::current_dir()?.join(STORE_DIR),
    };
    if StoreConfig::exists(&store_dir) {
        anyhow::bail!("Store already initialized at {}", store_dir.display());
    }
    std::fs::create_dir_all(&store_dir)?;

    let config = StoreConfig {
        root: root.to_string(),
        missing_path: if strict_remove {
            MissingPathSetting::Error
        } else {
            MissingPathSetting::Ignore
        },
    };
    config.save(&store_dir)?;

    // Create the database up front so read-only commands work immediately.
    PathIndex::open(&store_dir)?;

    println!(
        "Initialized mapping store at {}",
        store_dir.display().bold()
    );
    println!("Physical root: {root}");
    Ok(())
}
