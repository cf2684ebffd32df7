use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::devices::{AuthError, DeviceRegistry};
use crate::ingest::{LocationStore, StoreError};

use super::api::error::ErrorResponse;
use super::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<LocationStore>,
    pub devices: Arc<DeviceRegistry>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, StoreError> {
        let store = LocationStore::new(config.tracking.trail_length)?;
        let devices = DeviceRegistry::new(config.provisioned_devices());
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            devices: Arc::new(devices),
        })
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let error = match self {
            AuthError::UnknownDevice(_) => "invalid_device",
            AuthError::InvalidKey(_) => "invalid_api_key",
        };
        (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(error))).into_response()
    }
}

pub fn authenticate_device(
    state: &AppState,
    device_id: &str,
    api_key: &str,
) -> Result<(), AuthError> {
    state.devices.authenticate(device_id, api_key).map_err(|e| {
        log::warn!("Rejected report: {}", e);
        e
    })
}

#[derive(Debug)]
pub struct RegistrationDisabled;

impl IntoResponse for RegistrationDisabled {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("registration_disabled")),
        )
            .into_response()
    }
}

pub fn require_registration_enabled(state: &AppState) -> Result<(), RegistrationDisabled> {
    if state.config.registration.enabled {
        Ok(())
    } else {
        Err(RegistrationDisabled)
    }
}
