//! Error types for the goalkeeper

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeeperError {
    /// Malformed `position:` payload from a teammate
    #[error("Invalid position format in message: {0}")]
    Parse(String),

    /// The range sensor returned zero or a non-finite distance
    #[error("Sensor fault: invalid range reading {distance}")]
    SensorFault { distance: f64 },

    /// Two sightings share the same x, so the slope is undefined
    #[error("Degenerate trajectory: both sightings at x = {x}")]
    DegenerateTrajectory { x: f64 },

    /// A move would have left the field and was rejected
    #[error("Move to ({x:.3}, {y:.3}) rejected: outside the field")]
    OutOfBounds { x: f64, y: f64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for KeeperError {
    fn from(e: std::io::Error) -> Self {
        KeeperError::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for KeeperError {
    fn from(e: serde_yaml::Error) -> Self {
        KeeperError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KeeperError>;
