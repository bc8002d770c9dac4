//! Configuration management

use crate::error::{ErrorContext, PanelError, PanelResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "cms-panel";

/// Top-level configuration of the admin panel client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Remote backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/".to_string(),
            timeout_seconds: 30,
            user_agent: format!("cms-panel/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Session and UX timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Pause between a success notification and the screen swap
    pub transition_delay_ms: u64,
    /// How long toasts stay visible
    pub toast_duration_ms: u64,
    /// Interval of the background token revalidation; 0 disables it
    pub revalidate_interval_secs: u64,
    pub min_password_length: usize,
    /// How long a confirmation prompt waits before counting as "cancel"
    pub confirm_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transition_delay_ms: 500,
            toast_duration_ms: 3000,
            revalidate_interval_secs: 300,
            min_password_length: 6,
            confirm_timeout_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn revalidate_interval(&self) -> Option<Duration> {
        (self.revalidate_interval_secs > 0)
            .then(|| Duration::from_secs(self.revalidate_interval_secs))
    }
}

/// Where durable client state lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File holding a remembered credential token
    pub token_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_file: app_dir().join("token"),
        }
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl PanelConfig {
    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PanelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PanelError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: PanelConfig = toml::from_str(&content).map_err(|e| PanelError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else defaults
    pub fn load(path: Option<&Path>) -> PanelResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> PanelResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| PanelError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| PanelError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> PanelResult<()> {
        let base_url = url::Url::parse(&self.api.base_url).map_err(|e| PanelError::Config {
            message: format!("Invalid api.base_url '{}': {}", self.api.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Use an absolute URL such as http://localhost:3000/api/"),
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(crate::config_error!(
                format!("api.base_url must use http or https, got '{}'", base_url.scheme()),
                "config"
            ));
        }

        if self.api.timeout_seconds == 0 {
            return Err(crate::config_error!(
                "api.timeout_seconds must be greater than 0",
                "config"
            ));
        }

        if self.session.min_password_length == 0 {
            return Err(crate::config_error!(
                "session.min_password_length must be greater than 0",
                "config"
            ));
        }

        if self.logging.log_to_file && self.logging.log_file_path.is_none() {
            return Err(crate::config_error!(
                "logging.log_file_path must be set when logging.log_to_file is true",
                "config"
            ));
        }

        Ok(())
    }
}
