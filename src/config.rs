use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "codequery";
const CONFIG_FILE: &str = "config.json";

/// Search configuration stored in the user's config directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Match literals, phrases and regexes case-sensitively
    #[serde(default)]
    pub case_sensitive: bool,

    /// Reject queries with more distinct terms than this (0 = unlimited)
    #[serde(default)]
    pub max_query_terms: usize,

    /// Evaluate leaf predicates across documents in parallel
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Files larger than this are skipped when loading a directory
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_parallel() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_query_terms: 0,
            parallel: default_parallel(),
            max_file_size: default_max_file_size(),
        }
    }
}

impl SearchConfig {
    /// Load config from the config directory, or return default if not found
    pub fn load() -> Result<Self> {
        match get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from an explicit file, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to an explicit file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

/// Path to the config file, if the platform has a config directory
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_NAME).join(CONFIG_FILE))
}
