use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    pub openai_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_feed_title")]
    pub feed_title: String,

    #[serde(default = "default_feed_description")]
    pub feed_description: String,

    #[serde(default = "default_feed_link")]
    pub feed_link: String,

    /// Domain the audio links in the feed point at.
    #[serde(default = "default_feed_domain")]
    pub feed_domain: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Offline mode: skips the model provider and feeds a fixed sample
    /// topic through the pipeline.
    #[serde(default)]
    pub development: bool,
}

fn default_data_dir() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bookcast");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.to_string_lossy().to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_feed_title() -> String {
    "Bookcast".to_string()
}

fn default_feed_description() -> String {
    "Daily analyses of books worth rereading".to_string()
}

fn default_feed_link() -> String {
    "https://example.com".to_string()
}

fn default_feed_domain() -> String {
    "example.com".to_string()
}

fn default_port() -> u16 {
    4567
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            openai_api_key: None,
            model: default_model(),
            feed_title: default_feed_title(),
            feed_description: default_feed_description(),
            feed_link: default_feed_link(),
            feed_domain: default_feed_domain(),
            port: default_port(),
            development: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
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
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookcast")
            .join("config.toml")
    }

    pub fn feed_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("feed").join("feed.rss")
    }

    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
            .join("feed")
            .join("history.json")
    }

    pub fn audio_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("audio")
    }

    pub fn audio_path(&self, id: &str) -> PathBuf {
        self.audio_dir().join(format!("{id}.mp3"))
    }
}
