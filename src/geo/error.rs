use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("latitude out of range: {0}")]
    InvalidLatitude(f64),
    #[error("longitude out of range: {0}")]
    InvalidLongitude(f64),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
