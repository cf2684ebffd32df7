mod color;
mod entity;
mod error;
mod store;

pub use color::color_for;
pub use entity::{Telemetry, TrackedEntity};
pub use error::StoreError;
pub use store::{LocationStore, DEFAULT_TRAIL_LENGTH};
