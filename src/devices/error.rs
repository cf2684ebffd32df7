use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("invalid api key for device {0}")]
    InvalidKey(String),
}
