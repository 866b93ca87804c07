use crate::math::Vec2;
use crate::motion::Pose;

pub mod classifier;
pub mod raycast;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use self::classifier::SightingClassifier;

#[cfg(feature = "simulation")]
pub use self::simulation::SimulatedLaser;

/// Single-beam range sensor mounted along the keeper's heading.
///
/// The pose is handed in so a simulated sensor can raycast from it; a
/// physical laser is free to ignore it.
pub trait RangeSensor: Send {
    fn measure(&mut self, pose: &Pose) -> f64;
}

impl<F> RangeSensor for F
where
    F: FnMut(&Pose) -> f64 + Send,
{
    fn measure(&mut self, pose: &Pose) -> f64 {
        self(pose)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Classification {
    /// The beam ended on the field edge
    Nothing,
    Teammate,
    BallOrOpponent,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Sighting {
    pub class: Classification,
    pub position: Vec2,
    /// Range the sighting was measured at
    pub distance: f64,
}
