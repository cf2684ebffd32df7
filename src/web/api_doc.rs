use utoipa::OpenApi;

use super::api::devices::RegisterDeviceResponse;
use super::api::error::ErrorResponse;
use super::api::health::HealthResponse;
use super::api::locations::{DeviceLocationReport, LocationReport, RecordedResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::locations::receive_location,
        super::api::locations::update_location,
        super::api::locations::list_locations,
        super::api::locations::device_trail,
        super::api::devices::register_device,
        super::api::health::health,
    ),
    components(
        schemas(
            LocationReport,
            DeviceLocationReport,
            RecordedResponse,
            RegisterDeviceResponse,
            HealthResponse,
            ErrorResponse,
            crate::geo::CoordinateSample,
            crate::ingest::TrackedEntity,
            crate::ingest::Telemetry,
            crate::devices::DeviceInfo,
        )
    ),
    info(
        title = "Bus Tracker API",
        description = "Location ingest and live trails for tracked buses and devices",
        version = "0.1.0"
    ),
    tags(
        (name = "locations", description = "Location reports and trails"),
        (name = "devices", description = "Device registration"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/location",
            "/api/update-location",
            "/locations",
            "/api/devices/{id}/trail",
            "/api/register-device",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
