use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings for the `wiki-anchors` tool. Every field may be omitted from the
/// file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file holding pages, anchors and comments
    pub store_path: PathBuf,
    /// Longest edit script a single remap will accept
    pub max_edit_ops: usize,
    /// Give up refining a diff after this many milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_timeout_ms: Option<u64>,
    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: Self::default_store_path(),
            max_edit_ops: 10_000,
            diff_timeout_ms: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config.with_expanded_store_path()))
    }

    /// Load the config file if there is one, otherwise the defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(config_path)?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/wiki-anchors");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn default_store_path() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/wiki-anchors");
        PathBuf::from(data_dir.as_ref()).join("anchors.json")
    }

    /// `~` and `$VAR` in the store location, left as written if a variable
    /// is undefined
    fn with_expanded_store_path(mut self) -> Self {
        if let Some(expanded) = Self::expand_path(&self.store_path) {
            self.store_path = expanded;
        }
        self
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        shellexpand::full(&path.to_string_lossy())
            .ok()
            .map(|expanded| PathBuf::from(expanded.as_ref()))
    }
}
