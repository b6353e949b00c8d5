//! Configuration management for twiml-reminder.
//!
//! Loads config from YAML files in standard locations. Telephony and
//! email credentials can also come from environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yml::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Escape XML-special characters in caller values before rendering.
    pub escape_input: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8768,
            escape_input: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            api_base: "https://api.twilio.com".into(),
            timeout_secs: 10,
        }
    }
}

impl TwilioConfig {
    /// Override fields from `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`,
    /// `TWILIO_FROM_NUMBER` and `TWILIO_TO_NUMBER`.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields = [
            ("TWILIO_ACCOUNT_SID", &mut self.account_sid),
            ("TWILIO_AUTH_TOKEN", &mut self.auth_token),
            ("TWILIO_FROM_NUMBER", &mut self.from_number),
            ("TWILIO_TO_NUMBER", &mut self.to_number),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub address: String,
    pub password: String,
    pub recipient: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".into(),
            smtp_port: 587,
            address: String::new(),
            password: String::new(),
            recipient: String::new(),
        }
    }
}

impl EmailConfig {
    /// Override fields from `EMAIL_ADDRESS`, `EMAIL_PASSWORD` and
    /// `RECIPIENT_EMAIL`.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields = [
            ("EMAIL_ADDRESS", &mut self.address),
            ("EMAIL_PASSWORD", &mut self.password),
            ("RECIPIENT_EMAIL", &mut self.recipient),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub twilio: TwilioConfig,
    pub email: EmailConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// An explicit `path` must be readable and valid. Without one, the
    /// first existing file among these is used, falling back to defaults:
    /// 1. ./config.yaml
    /// 2. ~/.config/twiml-reminder/config.yaml
    /// 3. /etc/twiml-reminder/config.yaml
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            let config = Self::from_file(path)?;
            info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        let candidates = [
            std::env::current_dir().ok().map(|d| d.join("config.yaml")),
            dirs::home_dir().map(|h| h.join(".config/twiml-reminder/config.yaml")),
            Some(PathBuf::from("/etc/twiml-reminder/config.yaml")),
        ];
        let Some(config_path) = candidates.into_iter().flatten().find(|p| p.exists()) else {
            info!("No config file found, using defaults");
            return Ok(Self::default());
        };

        match Self::from_file(&config_path) {
            Ok(config) => {
                info!("Loaded config from {}", config_path.display());
                Ok(config)
            }
            Err(e) => {
                tracing::warn!("{e}, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
