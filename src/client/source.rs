use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::geo::{CoordinateSample, GeoPoint};
use crate::ingest::Telemetry;

use super::ClientError;

/// New York City, used when no base position is configured.
pub const DEFAULT_BASE: GeoPoint = GeoPoint {
    latitude: 40.7128,
    longitude: -74.0060,
};

/// Roughly 100 m at mid latitudes.
const JITTER_DEG: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub sample: CoordinateSample,
    pub telemetry: Telemetry,
}

/// Where positions come from. Platform location services plug in here.
pub trait LocationSource {
    fn read(&mut self) -> Result<Reading, ClientError>;

    /// Battery charge in percent, if the platform can tell.
    fn battery_level(&mut self) -> Option<f64> {
        None
    }
}

/// Random positions within ~100 m of a base point.
pub struct SimulatedSource {
    base: GeoPoint,
    rng: StdRng,
}

impl SimulatedSource {
    pub fn new(base: GeoPoint) -> Self {
        Self {
            base,
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub fn with_seed(base: GeoPoint, seed: u64) -> Self {
        Self {
            base,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl LocationSource for SimulatedSource {
    fn read(&mut self) -> Result<Reading, ClientError> {
        let latitude = (self.base.latitude + self.rng.gen_range(-JITTER_DEG..=JITTER_DEG))
            .clamp(-90.0, 90.0);
        let longitude = self.base.longitude + self.rng.gen_range(-JITTER_DEG..=JITTER_DEG);
        let longitude = if longitude > 180.0 {
            longitude - 360.0
        } else if longitude < -180.0 {
            longitude + 360.0
        } else {
            longitude
        };

        let sample = CoordinateSample::new(latitude, longitude, Utc::now())
            .map_err(|e| ClientError::Location(e.to_string()))?;
        let telemetry = Telemetry {
            accuracy: Some(self.rng.gen_range(5.0..20.0)),
            altitude: Some(self.rng.gen_range(0.0..50.0)),
            speed: Some(self.rng.gen_range(0.0..10.0)),
            heading: Some(self.rng.gen_range(0.0..359.0)),
            battery: None,
        };
        Ok(Reading { sample, telemetry })
    }

    fn battery_level(&mut self) -> Option<f64> {
        Some(self.rng.gen_range(20.0..100.0))
    }
}
