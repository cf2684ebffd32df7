use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::geo::{timestamp, CoordinateSample};
use crate::ingest::{Telemetry, TrackedEntity};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{authenticate_device, AppState};

const ANONYMOUS: &str = "anonymous";

/// Position posted by the browser page.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationReport {
    #[serde(default)]
    pub user_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Defaults to the time the server received the report.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Position posted by a registered tracking device.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeviceLocationReport {
    pub device_id: String,
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub telemetry: Telemetry,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordedResponse {
    pub status: String,
    pub identifier: String,
    pub trail_length: usize,
}

impl RecordedResponse {
    fn ok(identifier: &str, trail_length: usize) -> Self {
        RecordedResponse {
            status: "ok".to_string(),
            identifier: identifier.to_string(),
            trail_length,
        }
    }
}

fn build_sample(
    latitude: f64,
    longitude: f64,
    ts: Option<&str>,
) -> Result<CoordinateSample, ApiError> {
    let ts = match ts {
        Some(raw) => timestamp::parse(raw)?,
        None => Utc::now(),
    };
    Ok(CoordinateSample::new(latitude, longitude, ts)?)
}

#[utoipa::path(
    post,
    path = "/location",
    request_body = LocationReport,
    responses(
        (status = 200, description = "Location recorded", body = RecordedResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Identifier belongs to a registered device", body = ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn receive_location(
    State(state): State<AppState>,
    payload: Result<Json<LocationReport>, JsonRejection>,
) -> ApiResult<Json<RecordedResponse>> {
    let Json(report) = payload?;
    let sample = build_sample(report.latitude, report.longitude, report.timestamp.as_deref())?;

    let identifier = report
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(ANONYMOUS);

    // Device trails only take authenticated reports.
    if state.devices.contains(identifier) {
        log::warn!("Rejected unauthenticated report for device {}", identifier);
        return Err(ApiError::Reserved(identifier.to_string()));
    }

    let trail_length = state.store.record(identifier, sample);
    log::info!(
        "Received from {}: {}, {}",
        identifier,
        sample.latitude,
        sample.longitude
    );
    Ok(Json(RecordedResponse::ok(identifier, trail_length)))
}

#[utoipa::path(
    post,
    path = "/api/update-location",
    request_body = DeviceLocationReport,
    responses(
        (status = 200, description = "Location recorded", body = RecordedResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unknown device or wrong API key", body = ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    payload: Result<Json<DeviceLocationReport>, JsonRejection>,
) -> ApiResult<Json<RecordedResponse>> {
    let Json(report) = payload?;
    authenticate_device(&state, &report.device_id, &report.api_key)?;
    let sample = build_sample(report.latitude, report.longitude, report.timestamp.as_deref())?;

    let trail_length = state
        .store
        .record_with_telemetry(&report.device_id, sample, report.telemetry);
    log::info!(
        "Device {} at {}, {}",
        report.device_id,
        sample.latitude,
        sample.longitude
    );
    Ok(Json(RecordedResponse::ok(&report.device_id, trail_length)))
}

#[utoipa::path(
    get,
    path = "/locations",
    responses(
        (status = 200, description = "All tracked identifiers", body = BTreeMap<String, TrackedEntity>)
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, TrackedEntity>> {
    Json(state.store.snapshot())
}

#[utoipa::path(
    get,
    path = "/api/devices/{id}/trail",
    params(
        ("id" = String, Path, description = "Tracked identifier")
    ),
    responses(
        (status = 200, description = "Trail of one identifier", body = TrackedEntity),
        (status = 404, description = "Identifier never reported", body = ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn device_trail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TrackedEntity>> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or(ApiError::NotFound("identifier_not_found"))
}
