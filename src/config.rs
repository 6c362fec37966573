use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Settings;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub default_format: Option<String>,
    pub relay_timeout_ms: Option<u64>,
    pub max_raw_chars: Option<usize>,
}

impl Config {
    /// Load config from ~/.config/ytcap/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            relay_timeout: self
                .relay_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.relay_timeout),
            max_raw_chars: self.max_raw_chars.unwrap_or(defaults.max_raw_chars),
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytcap")
        .join("config.toml")
}
