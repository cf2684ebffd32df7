use super::{haversine_m, GeoError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || latitude.abs() > 90.0 {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || longitude.abs() > 180.0 {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parses `"lat, lon"` in decimal degrees.
    pub fn from_coordinates(coordinates: &str) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Self::new(lat, lon).ok()
    }

    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_m(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}
