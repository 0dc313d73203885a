//! # Configuration
//!
//! Settings live in a single YAML file, by default
//! `<config dir>/budget-calendar/config.yaml`:
//!
//! ```yaml
//! api_base_url: "http://127.0.0.1:5000"
//! events_path: "/spend"
//! spend_path: "/spend"
//! request_timeout_secs: 10
//! message_timeout_secs: 5
//! currency_symbol: "$"
//! ```
//!
//! Every key is optional. A missing file means all defaults. The file
//! location can be moved with `BUDGET_CALENDAR_CONFIG`, and
//! `BUDGET_CALENDAR_API_URL` overrides the base URL of the event store.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_PATH_ENV: &str = "BUDGET_CALENDAR_CONFIG";
pub const API_URL_ENV: &str = "BUDGET_CALENDAR_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root URL of the event store, without a trailing path
    pub api_base_url: String,
    /// Path answering `GET` with the list of events
    pub events_path: String,
    /// Path accepting `POST` add/update/delete requests
    pub spend_path: String,
    pub request_timeout_secs: u64,
    /// How long a status message stays visible
    pub message_timeout_secs: u64,
    pub currency_symbol: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            events_path: "/spend".to_string(),
            spend_path: "/spend".to_string(),
            request_timeout_secs: 10,
            message_timeout_secs: 5,
            currency_symbol: "$".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `$BUDGET_CALENDAR_CONFIG` or the default location, then
    /// apply environment overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path);

        let config = match path {
            Some(path) => Self::load_from(&path)?,
            None => {
                debug!("No config directory available, using defaults");
                Self::default()
            }
        };

        Ok(config.with_api_base_url_override(std::env::var(API_URL_ENV).ok()))
    }

    /// Load from a specific file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<config dir>/budget-calendar/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("budget-calendar").join("config.yaml"))
    }

    /// Replace the base URL when an override is set and non-empty
    pub fn with_api_base_url_override(mut self, api_base_url: Option<String>) -> Self {
        if let Some(url) = api_base_url.filter(|url| !url.trim().is_empty()) {
            info!("Using event store at {} from {}", url, API_URL_ENV);
            self.api_base_url = url;
        }
        self
    }

    /// Full URL for a path on the event store
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_secs(self.message_timeout_secs)
    }
}
