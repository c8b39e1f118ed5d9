// CLI module for claude2oai
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// claude2oai - OpenAI Chat Completions compatible gateway for Anthropic Claude
#[derive(Parser, Debug)]
#[command(name = "claude2oai", version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML config file (default: ~/.claude2oai/config.toml)
    #[arg(long, short, env = "CLAUDE2OAI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, overrides server.host
    #[arg(long, env = "CLAUDE2OAI_HOST")]
    pub host: Option<String>,

    /// Port to listen on, overrides server.port
    #[arg(long, short, env = "CLAUDE2OAI_PORT")]
    pub port: Option<u16>,
}

impl Args {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(AppConfig::default_config_path)
    }

    /// Apply command-line overrides on top of the layered configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
