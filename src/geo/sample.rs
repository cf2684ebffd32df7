use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{timestamp, GeoError, GeoPoint};

/// One reported position. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "RawSample")]
pub struct CoordinateSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "timestamp")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

/// Wire shape before the range check in [`CoordinateSample::new`].
#[derive(Deserialize)]
struct RawSample {
    latitude: f64,
    longitude: f64,
    #[serde(with = "timestamp")]
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawSample> for CoordinateSample {
    type Error = GeoError;

    fn try_from(raw: RawSample) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude, raw.timestamp)
    }
}

impl CoordinateSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Result<Self, GeoError> {
        let point = GeoPoint::new(latitude, longitude)?;
        Ok(Self {
            latitude: point.latitude,
            longitude: point.longitude,
            timestamp,
        })
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn distance_to(&self, other: &CoordinateSample) -> f64 {
        self.point().distance_to(&other.point())
    }

    /// Signed seconds from `earlier` to `self`.
    pub fn seconds_since(&self, earlier: &CoordinateSample) -> f64 {
        (self.timestamp - earlier.timestamp).num_milliseconds() as f64 / 1000.0
    }
}
