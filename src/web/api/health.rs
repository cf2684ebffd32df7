use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::web::auth::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub tracked: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        tracked: state.store.len(),
    })
}
