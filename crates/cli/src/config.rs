//! Store configuration file

use anyhow::{Context, Result};
use filemap_index::{MapperConfig, MissingPath};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory name holding the database and config
pub const STORE_DIR: &str = ".filemap";
const CONFIG_FILE: &str = "config.toml";

/// Contents of `.filemap/config.toml`
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Physical root directory the mappings resolve under
    pub root: String,
    /// What a non-recursive remove does when the path was never mapped
    #[serde(default)]
    pub missing_path: MissingPathSetting,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPathSetting {
    #[default]
    Ignore,
    Error,
}

impl StoreConfig {
    /// True when a config file already exists in `store_dir`.
    pub fn exists(store_dir: &Path) -> bool {
        store_dir.join(CONFIG_FILE).exists()
    }

    pub fn load(store_dir: &Path) -> Result<Self> {
        let path = store_dir.join(CONFIG_FILE);
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, store_dir: &Path) -> Result<()> {
        let path = store_dir.join(CONFIG_FILE);
        let raw = toml::to_string_pretty(self).context("Failed to serialize store config")?;
        std::fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Translate file settings into mapper configuration.
    pub fn mapper_config(&self) -> MapperConfig {
        MapperConfig {
            missing_path: match self.missing_path {
                MissingPathSetting::Ignore => MissingPath::Ignore,
                MissingPathSetting::Error => MissingPath::Error,
            },
        }
    }
}
