use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::devices::DeviceInfo;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{require_registration_enabled, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterDeviceResponse {
    pub device_id: String,
    pub api_key: String,
}

#[utoipa::path(
    post,
    path = "/api/register-device",
    request_body = DeviceInfo,
    responses(
        (status = 200, description = "Device registered", body = RegisterDeviceResponse),
        (status = 400, description = "Malformed device description", body = ErrorResponse),
        (status = 403, description = "Registration disabled", body = ErrorResponse)
    ),
    tag = "devices"
)]
pub async fn register_device(
    State(state): State<AppState>,
    payload: Result<Json<DeviceInfo>, JsonRejection>,
) -> ApiResult<Json<RegisterDeviceResponse>> {
    require_registration_enabled(&state)?;
    let Json(info) = payload?;

    let registration = state.devices.register(info);
    Ok(Json(RegisterDeviceResponse {
        device_id: registration.device_id,
        api_key: registration.api_key,
    }))
}
