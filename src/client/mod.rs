//! The tracking device side: sample a position, decide whether it moved
//! enough to be worth reporting, and post it to the server.

mod api;
mod config;
mod error;
mod gate;
mod runner;
pub mod setup;
mod source;
mod state;

pub use api::{ensure_registered, ReportSink, TrackerApi};
pub use config::{valid_min_distance, ClientConfig};
pub use error::ClientError;
pub use gate::should_update;
pub use runner::Runner;
pub use source::{LocationSource, Reading, SimulatedSource, DEFAULT_BASE};
pub use state::LastLocationStore;
