use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub news_api_key: Option<String>,

    #[serde(default = "default_country")]
    pub news_country: String,

    #[serde(default = "default_page_size")]
    pub news_page_size: u32,

    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_minutes: u32,

    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub server: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    pub username: String,
    pub password: String,

    #[serde(default = "default_from_address")]
    pub from_address: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newswire");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("newswire.db").to_string_lossy().to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_fetch_interval() -> u32 {
    240
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "news@newswire.local".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            news_api_key: None,
            news_country: default_country(),
            news_page_size: default_page_size(),
            fetch_interval_minutes: default_fetch_interval(),
            smtp: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config =
                toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newswire")
            .join("config.toml")
    }
}
