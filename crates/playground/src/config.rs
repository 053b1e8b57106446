//! Playground configuration
//!
//! Read from a TOML file; every field is optional. Lookup order for the
//! file is an explicit path, then `<config_dir>/codepencil/config.toml`.
//! Debounce delays can also be overridden through the environment:
//!
//! ```toml
//! data_dir = "/tmp/pencil"
//! persist_debounce_ms = 800
//! resize_step = 2.5
//! ```

use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::DEFAULT_PREFIX;

/// Overrides `persist_debounce_ms`.
pub const ENV_PERSIST_MS: &str = "CODEPENCIL_PERSIST_MS";

/// Overrides `preview_debounce_ms`.
pub const ENV_PREVIEW_MS: &str = "CODEPENCIL_PREVIEW_MS";

const APP_DIR: &str = "codepencil";
const CONFIG_FILE: &str = "config.toml";

/// Errors from loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Where storage, the preview page and the log live
    pub data_dir: Option<PathBuf>,
    /// Namespace for storage keys
    pub storage_prefix: String,
    /// Quiet period before edits and layout changes are written
    pub persist_debounce_ms: u64,
    /// Quiet period before the preview is rebuilt
    pub preview_debounce_ms: u64,
    /// Percentage points moved per keyboard resize
    pub resize_step: f64,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_prefix: DEFAULT_PREFIX.to_string(),
            persist_debounce_ms: 500,
            preview_debounce_ms: 250,
            resize_step: 5.0,
        }
    }
}

impl PlaygroundConfig {
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config file that must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw, path)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<config_dir>/codepencil/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load the default config file, or the defaults when there is none.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read_ms = |name: &str| {
            let raw = lookup(name)?;
            match raw.trim().parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    warn!("Ignoring {}={:?}: not a number of milliseconds", name, raw);
                    None
                }
            }
        };

        if let Some(ms) = read_ms(ENV_PERSIST_MS) {
            self.persist_debounce_ms = ms;
        }
        if let Some(ms) = read_ms(ENV_PREVIEW_MS) {
            self.preview_debounce_ms = ms;
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }

    /// The configured data directory, else `<data_local_dir>/codepencil`,
    /// else `.codepencil` in the working directory.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR)))
    }
}
