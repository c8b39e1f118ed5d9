// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{ProxyError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest, `CLAUDE2OAI_SECTION__KEY`)
    /// 2. Config file at `path` (optional)
    /// 3. Defaults (lowest)
    ///
    /// CLI overrides are applied by the caller on the returned value.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists
            .add_source(File::from(path.to_path_buf()).required(false))
            // Override with environment variables
            .add_source(
                Environment::with_prefix("CLAUDE2OAI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ProxyError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| ProxyError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.streaming.channel_capacity == 0 {
            return Err(ProxyError::Config(
                "streaming.channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.claude.api_base_url.is_empty() {
            return Err(ProxyError::Config("claude.api_base_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".claude2oai")
            .join("config.toml")
    }
}
