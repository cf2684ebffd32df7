use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::ClientError;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Client settings, persisted as pretty-printed JSON.
///
/// Keys missing from the file take their default value, so older files keep
/// loading after new settings are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub device_id: String,
    pub api_key: String,
    /// Seconds between samples, and the minimum spacing between reports.
    pub update_interval: u64,
    /// Meters the device must move before a new report is sent.
    pub min_distance: f64,
    pub battery_monitor: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            device_id: String::new(),
            api_key: String::new(),
            update_interval: 30,
            min_distance: 10.0,
            battery_monitor: true,
        }
    }
}

/// NaN would make every distance comparison false and silence the client.
pub fn valid_min_distance(meters: f64) -> bool {
    meters.is_finite() && meters >= 0.0
}

impl ClientConfig {
    /// Loads the config at `path`, writing a default file if there is none.
    /// Any failure is logged and the defaults are returned instead.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!("Wrote default config to {}", path.display()),
                Err(e) => error!("Error saving config: {}", e),
            }
            return config;
        }

        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Error loading config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.update_interval == 0 {
            return Err(ClientError::Input(
                "update_interval must be at least 1 second".into(),
            ));
        }
        if !valid_min_distance(self.min_distance) {
            return Err(ClientError::Input(format!(
                "min_distance must be a finite number of meters >= 0, got {}",
                self.min_distance
            )));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ClientError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval)
    }

    pub fn is_registered(&self) -> bool {
        !self.device_id.is_empty()
    }
}
