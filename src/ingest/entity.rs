use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use utoipa::ToSchema;

use crate::geo::CoordinateSample;

use super::color_for;

/// Optional extras a device sends alongside its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Telemetry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    /// Percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
}

impl Telemetry {
    pub fn is_empty(&self) -> bool {
        *self == Telemetry::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackedEntity {
    pub identifier: String,
    pub color: String,
    #[schema(value_type = Vec<CoordinateSample>)]
    pub trail: VecDeque<CoordinateSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_telemetry: Option<Telemetry>,
}

impl TrackedEntity {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            color: color_for(identifier),
            trail: VecDeque::new(),
            last_telemetry: None,
        }
    }

    /// Appends `sample` and drops the oldest entries beyond `capacity`.
    pub(super) fn push(&mut self, sample: CoordinateSample, capacity: usize) {
        self.trail.push_back(sample);
        while self.trail.len() > capacity {
            self.trail.pop_front();
        }
    }
}
