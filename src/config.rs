use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::protocol::{DEFAULT_NAME, DEFAULT_SMARTTHINGS_PATH};
use crate::types::ApiVersion;
use crate::{Error, Result};

/// Entity configuration, normally read from a TOML file:
///
/// ```toml
/// access_token = "..."
/// device_id = "..."
/// # optional
/// name = "Living room AC"
/// smartthings_path = "/usr/local/bin/smartthings"
/// api_version = "current"
/// timeout_secs = 30
/// ```
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    pub access_token: String,
    pub device_id: String,
    #[serde(default = "default_smartthings_path")]
    pub smartthings_path: String,
    #[serde(default)]
    pub api_version: ApiVersion,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_owned()
}

fn default_smartthings_path() -> String {
    DEFAULT_SMARTTHINGS_PATH.to_owned()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("name", &self.name)
            .field("access_token", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("smartthings_path", &self.smartthings_path)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::Config("access_token must not be empty".to_string()));
        }
        if self.device_id.trim().is_empty() {
            return Err(Error::Config("device_id must not be empty".to_string()));
        }
        if self.smartthings_path.trim().is_empty() {
            return Err(Error::Config("smartthings_path must not be empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}
