mod error;
mod registry;

pub use error::AuthError;
pub use registry::{DeviceInfo, DeviceRegistry, Registration};
