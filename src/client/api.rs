use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::devices::DeviceInfo;
use crate::geo::timestamp;
use crate::ingest::Telemetry;

use super::{ClientConfig, ClientError, Reading};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination for reports that passed the update gate.
pub trait ReportSink {
    fn send(
        &self,
        config: &ClientConfig,
        reading: &Reading,
    ) -> impl Future<Output = Result<(), ClientError>>;
}

#[derive(Debug, Serialize)]
struct OutgoingReport<'a> {
    device_id: &'a str,
    api_key: &'a str,
    latitude: f64,
    longitude: f64,
    timestamp: String,
    #[serde(flatten)]
    telemetry: &'a Telemetry,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    device_id: String,
    #[serde(default)]
    api_key: String,
}

/// HTTP client for the tracking server.
pub struct TrackerApi {
    client: Client,
    base_url: String,
}

impl TrackerApi {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Returns the minted `(device_id, api_key)`.
    pub async fn register_device(
        &self,
        info: &DeviceInfo,
    ) -> Result<(String, String), ClientError> {
        let response = self
            .client
            .post(self.url("/api/register-device"))
            .json(info)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let credentials: Credentials = response.json().await?;
        if credentials.device_id.is_empty() {
            return Err(ClientError::Registration(
                "server returned no device_id".into(),
            ));
        }
        Ok((credentials.device_id, credentials.api_key))
    }
}

impl ReportSink for TrackerApi {
    async fn send(&self, config: &ClientConfig, reading: &Reading) -> Result<(), ClientError> {
        let report = OutgoingReport {
            device_id: &config.device_id,
            api_key: &config.api_key,
            latitude: reading.sample.latitude,
            longitude: reading.sample.longitude,
            timestamp: timestamp::format(&reading.sample.timestamp),
            telemetry: &reading.telemetry,
        };

        let response = self
            .client
            .post(self.url("/api/update-location"))
            .json(&report)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

/// Describes this device from `DEVICE_*` environment variables.
pub fn device_info_from_env() -> DeviceInfo {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    DeviceInfo {
        name: var("DEVICE_NAME")
            .or_else(|| Some(format!("Device-{}", chrono::Utc::now().timestamp()))),
        model: var("DEVICE_MODEL").or_else(|| Some("Unknown".to_string())),
        platform: var("DEVICE_PLATFORM").or_else(|| Some(std::env::consts::OS.to_string())),
        version: var("DEVICE_VERSION").or_else(|| Some(env!("CARGO_PKG_VERSION").to_string())),
    }
}

/// Registers with the server unless `config` already holds a device id. New
/// credentials are written back to `config_path`.
pub async fn ensure_registered(
    api: &TrackerApi,
    config: &mut ClientConfig,
    config_path: &Path,
) -> Result<(), ClientError> {
    if config.is_registered() {
        return Ok(());
    }

    let (device_id, api_key) = api.register_device(&device_info_from_env()).await?;
    config.device_id = device_id;
    config.api_key = api_key;
    if let Err(e) = config.save(config_path) {
        error!("Error saving config: {}", e);
    }
    info!("Device registered successfully with ID: {}", config.device_id);
    Ok(())
}
