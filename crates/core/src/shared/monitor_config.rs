use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_CAMERA, DEFAULT_CONFIDENCE, DEFAULT_COOLDOWN_SECS, DEFAULT_INPUT_FORMAT,
    DEFAULT_SNAPSHOT_DIR,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cooldown must be a non-negative number of seconds that fits a duration (got {0})")]
    InvalidCooldown(f64),
    #[error("confidence must be between 0.0 and 1.0 (got {0})")]
    InvalidConfidence(f64),
    #[error("a chat id is required when a bot token is set")]
    MissingChatId,
    #[error("notification queue capacity must be at least 1")]
    ZeroQueueCapacity,
}

/// Runtime settings for one monitoring session.
///
/// Every field has a default, so a config file only needs the keys it
/// changes. Secrets are usually left out of the file and supplied through
/// the environment instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub camera: String,
    pub input_format: Option<String>,
    /// Resolution requested from the camera; frames are rescaled regardless.
    pub video_size: Option<(u32, u32)>,
    pub framerate: Option<u32>,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: Option<String>,
    pub cooldown_secs: f64,
    pub snapshot_dir: PathBuf,
    pub model: Option<PathBuf>,
    pub model_url: Option<String>,
    pub confidence: f64,
    /// `Some(capacity)` sends notifications from a background worker.
    pub notify_queue: Option<usize>,
    pub preview: Option<PathBuf>,
    pub preview_every: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera: DEFAULT_CAMERA.to_string(),
            input_format: DEFAULT_INPUT_FORMAT.map(str::to_string),
            video_size: None,
            framerate: None,
            bot_token: None,
            chat_id: None,
            api_base: None,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            model: None,
            model_url: None,
            confidence: DEFAULT_CONFIDENCE,
            notify_queue: None,
            preview: None,
            preview_every: 5,
        }
    }
}

impl MonitorConfig {
    /// Per-user config location, picked up when no file is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Intrusion Detector").join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads `explicit` if given (it must exist), otherwise the per-user
    /// file if present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::info!("Using config {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cooldown()?;
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::InvalidConfidence(self.confidence));
        }
        let has_token = self.bot_token.as_deref().is_some_and(|t| !t.is_empty());
        let has_chat = self.chat_id.as_deref().is_some_and(|c| !c.trim().is_empty());
        if has_token && !has_chat {
            return Err(ConfigError::MissingChatId);
        }
        if self.notify_queue == Some(0) {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }

    /// Rejects negative, NaN, infinite and out-of-range values.
    pub fn cooldown(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.cooldown_secs)
            .map_err(|_| ConfigError::InvalidCooldown(self.cooldown_secs))
    }

    /// Telegram credentials when both are present and non-empty.
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        let token = self.bot_token.as_deref().filter(|t| !t.is_empty())?;
        let chat = self.chat_id.as_deref().filter(|c| !c.trim().is_empty())?;
        Some((token, chat))
    }
}
