use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("trail length must be at least 1")]
    ZeroCapacity,
}
