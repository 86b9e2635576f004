use anyhow::{Context, Result};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub backend: BackendConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Analysis endpoint the snip payloads are POSTed to.
    pub endpoint: String,
    /// Deadline for a single analysis request. On expiry the client returns
    /// the same fallback result used for transport failures.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Resolution cap for the full-screen grab, bounds the upload payload.
    pub max_width: u32,
    pub max_height: u32,
    /// Drags narrower or shorter than this are treated as accidental clicks.
    pub min_selection_px: i32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://seal-app-d2359.ondigitalocean.app/analyze".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            min_selection_px: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            backend: BackendConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the platform config file, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_file = paths::get_config_file()?;

        if config_file.exists() {
            Self::load_from(&config_file)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_json::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to the platform config file
    pub fn save(&self) -> Result<()> {
        paths::ensure_directories()?;
        self.save_to(&paths::get_config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}
