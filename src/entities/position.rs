use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// One observation of the walker's location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub coordinates: Coordinates,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl PositionSample {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            recorded_at: Utc::now(),
            accuracy_m: None,
        }
    }
}
