use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use crate::devices::{DeviceInfo, Registration};
use crate::ingest::DEFAULT_TRAIL_LENGTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub devices: Vec<DeviceKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_trail_length")]
    pub trail_length: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            trail_length: default_trail_length(),
        }
    }
}

fn default_trail_length() -> usize {
    DEFAULT_TRAIL_LENGTH
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// A device provisioned ahead of time instead of through `/api/register-device`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceKey {
    pub device_id: String,
    pub api_key: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tracking.trail_length == 0 {
            return Err(ConfigError::Invalid(
                "tracking.trail_length must be at least 1".into(),
            ));
        }
        if let Some(dup) = self
            .devices
            .iter()
            .enumerate()
            .find(|(i, d)| self.devices[..*i].iter().any(|o| o.device_id == d.device_id))
        {
            return Err(ConfigError::Invalid(format!(
                "duplicate device_id {}",
                dup.1.device_id
            )));
        }
        Ok(())
    }

    pub fn provisioned_devices(&self) -> Vec<Registration> {
        let now = Utc::now();
        self.devices
            .iter()
            .map(|d| Registration {
                device_id: d.device_id.clone(),
                api_key: d.api_key.clone(),
                info: DeviceInfo {
                    name: d.name.clone(),
                    ..Default::default()
                },
                registered_at: now,
            })
            .collect()
    }
}
