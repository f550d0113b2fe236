use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Base URL of the recommendation service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// JSON file standing in for the browser's local storage
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Directory CSV exports are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// How often countdown texts are recomputed, in seconds
    #[serde(default = "default_countdown_interval_secs")]
    pub countdown_interval_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            store_path: default_store_path(),
            export_dir: default_export_dir(),
            countdown_interval_secs: default_countdown_interval_secs(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".hackrec").join("storage.json")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_countdown_interval_secs() -> u64 {
    60
}

impl ClientConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with HACKREC__ prefix
    /// 2. hackrec.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: HACKREC__BASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_secs(self.countdown_interval_secs.max(1))
    }
}

/// Load configuration from file and environment variables
///
/// See [`ClientConfig::load`] for the precedence rules.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("hackrec").required(false))
        .add_source(
            Environment::with_prefix("HACKREC")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
