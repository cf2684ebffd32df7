use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use utoipa::ToSchema;
use uuid::Uuid;

use super::AuthError;

/// Metadata a device describes itself with when registering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeviceInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub device_id: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub info: DeviceInfo,
    pub registered_at: DateTime<Utc>,
}

/// Known devices and their API keys. Lives for the process lifetime;
/// registrations made at runtime are not persisted.
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, Registration>>,
}

impl DeviceRegistry {
    pub fn new(preprovisioned: Vec<Registration>) -> Self {
        let devices = preprovisioned
            .into_iter()
            .map(|r| (r.device_id.clone(), r))
            .collect();
        Self {
            devices: RwLock::new(devices),
        }
    }

    pub fn register(&self, info: DeviceInfo) -> Registration {
        let registration = Registration {
            device_id: Uuid::new_v4().to_string(),
            api_key: Uuid::new_v4().simple().to_string(),
            info,
            registered_at: Utc::now(),
        };
        info!(
            "Registered device {} ({})",
            registration.device_id,
            registration.info.name.as_deref().unwrap_or("unnamed")
        );
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(registration.device_id.clone(), registration.clone());
        registration
    }

    pub fn authenticate(&self, device_id: &str, api_key: &str) -> Result<(), AuthError> {
        let devices = self.devices.read().unwrap_or_else(PoisonError::into_inner);
        let device = devices
            .get(device_id)
            .ok_or_else(|| AuthError::UnknownDevice(device_id.to_string()))?;
        if device.api_key != api_key {
            return Err(AuthError::InvalidKey(device_id.to_string()));
        }
        Ok(())
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(device_id)
    }

    pub fn len(&self) -> usize {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
