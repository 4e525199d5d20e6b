use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use crate::http::buffer::MAXLINE;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "COURIER_CONFIG";
/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Size of the connection slot table
    pub max_clients: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory uploaded files are written to
    pub dir: PathBuf,
    /// Capacity of each connection's line buffer
    pub max_line: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            max_clients: 20,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("images"),
            max_line: MAXLINE,
        }
    }
}

impl Config {
    /// Loads the file named by `COURIER_CONFIG` (defaults if unset), then applies `LISTEN`.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {path}"))?;
                Self::from_yaml_str(&text)
                    .with_context(|| format!("invalid config file {path}"))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server.max_clients == 0 {
            anyhow::bail!("server.max_clients must be at least 1");
        }
        if self.uploads.max_line < 64 {
            anyhow::bail!("uploads.max_line must be at least 64, got {}", self.uploads.max_line);
        }
        Ok(())
    }
}
