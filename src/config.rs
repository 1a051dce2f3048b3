//! Client configuration.
//!
//! Resolution order: built-in defaults, then `config.toml`, then CLI flags and
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REDIRECT_DELAY_MS: u64 = 1500;
const DATA_DIR_NAME: &str = ".roadmap-tracker";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
    /// Directory holding `session.json` and `config.toml`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Pause between a successful roadmap creation and the dashboard.
    pub redirect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: None,
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn default_data_dir() -> ServiceResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(DATA_DIR_NAME))
            .ok_or_else(|| ServiceError::Config("couldn't find home dir".to_string()))
    }

    pub fn resolve(overrides: &ConfigOverrides) -> ServiceResult<Self> {
        let path = match &overrides.config_path {
            Some(path) => path.clone(),
            None => match &overrides.data_dir {
                Some(dir) => dir.join("config.toml"),
                None => Self::default_data_dir()?.join("config.toml"),
            },
        };

        let mut config = Self::from_file(&path)?;
        if let Some(url) = &overrides.api_base_url {
            config.api_base_url = url.clone();
        }
        if let Some(dir) = &overrides.data_dir {
            config.data_dir = Some(dir.clone());
        }
        config.api_base_url = normalize_base_url(&config.api_base_url);
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> ServiceResult<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| ServiceError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ServiceResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = self.to_toml()?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn to_toml(&self) -> ServiceResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServiceResult<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ServiceError::Config("api_base_url cannot be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ServiceError::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ServiceError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> ServiceResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_data_dir(),
        }
    }

    pub fn session_path(&self) -> ServiceResult<PathBuf> {
        Ok(self.data_dir()?.join("session.json"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

/// Trim trailing slashes and default to `http://` for bare hosts.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}
