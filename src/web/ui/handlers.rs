use axum::{extract::State, response::IntoResponse};

use crate::web::auth::AppState;

use super::templates::MapTemplate;

const MAP_REFRESH_MS: u64 = 5_000;

pub async fn map(State(state): State<AppState>) -> impl IntoResponse {
    MapTemplate {
        refresh_ms: MAP_REFRESH_MS,
        trail_length: state.store.capacity(),
    }
}
