mod distance;
mod error;
mod point;
mod sample;
pub mod timestamp;

pub use distance::haversine_m;
pub use error::GeoError;
pub use point::GeoPoint;
pub use sample::CoordinateSample;
