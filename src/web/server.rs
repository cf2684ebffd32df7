use axum::{routing::get, routing::post, Router};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::ingest::StoreError;

use super::api::devices as device_handlers;
use super::api::health as health_handlers;
use super::api::locations as location_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::Config;
use super::ui::handlers as ui_handlers;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // UI routes
        .route("/", get(ui_handlers::map))
        // Location endpoints
        .route("/location", post(location_handlers::receive_location))
        .route("/locations", get(location_handlers::list_locations))
        .route(
            "/api/update-location",
            post(location_handlers::update_location),
        )
        .route(
            "/api/devices/{id}/trail",
            get(location_handlers::device_trail),
        )
        // Device endpoints
        .route(
            "/api/register-device",
            post(device_handlers::register_device),
        )
        .route("/health", get(health_handlers::health))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();
    let state = AppState::from_config(config)?;

    log::info!(
        "Tracking up to {} positions per identifier, {} provisioned device(s)",
        state.store.capacity(),
        state.devices.len()
    );

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
