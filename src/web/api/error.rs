use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::devices::AuthError;
use crate::geo::GeoError;
use crate::web::auth::RegistrationDisabled;

#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Forbidden(RegistrationDisabled),
    Validation(String),
    NotFound(&'static str),
    /// The identifier belongs to a registered device.
    Reserved(String),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl From<RegistrationDisabled> for ApiError {
    fn from(e: RegistrationDisabled) -> Self {
        ApiError::Forbidden(e)
    }
}

impl From<GeoError> for ApiError {
    fn from(e: GeoError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => e.into_response(),
            ApiError::Forbidden(e) => e.into_response(),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ApiError::Reserved(id) => {
                let msg = format!("{} is a registered device, use /api/update-location", id);
                (
                    StatusCode::FORBIDDEN,
                    Json(ErrorResponse::with_message("identifier_reserved", &msg)),
                )
                    .into_response()
            }
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(what))).into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
