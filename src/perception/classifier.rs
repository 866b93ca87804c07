use super::{Classification, RangeSensor, Sighting};
use crate::error::{KeeperError, Result};
use crate::field::Field;
use crate::math::Vec2;
use crate::motion::{Kinematics, Pose};

/// Interprets single laser readings as field edge, teammate or ball/opponent.
#[derive(Debug, Clone)]
pub struct SightingClassifier {
    field: Field,
    epsilon_degree: f64,
    boundary_tolerance: f64,
}

impl SightingClassifier {
    pub fn new(field: Field, epsilon_degree: f64, boundary_tolerance: f64) -> SightingClassifier {
        SightingClassifier {
            field,
            epsilon_degree,
            boundary_tolerance,
        }
    }

    pub fn sighting_position(pose: &Pose, distance: f64) -> Vec2 {
        pose.position() + Vec2::from_degrees(pose.facing_degree) * distance
    }

    pub fn classify(
        &self,
        pose: &Pose,
        laser: &mut dyn RangeSensor,
        teammate: Vec2,
    ) -> Result<Sighting> {
        let distance = checked_range(laser.measure(pose))?;
        let position = Self::sighting_position(pose, distance);

        let class = if self.field.on_boundary(position, self.boundary_tolerance) {
            Classification::Nothing
        } else if position == teammate {
            Classification::Teammate
        } else {
            Classification::BallOrOpponent
        };

        Ok(Sighting {
            class,
            position,
            distance,
        })
    }

    /// Width probe: a robot is wide enough that rays just inside its
    /// half-angle still hit it, a ball is not. Returns `true` for a ball.
    ///
    /// The heading is restored before returning, on the error path too.
    pub fn disambiguate_ball(
        &self,
        body: &mut Kinematics,
        laser: &mut dyn RangeSensor,
        teammate: Vec2,
        distance: f64,
    ) -> Result<bool> {
        let distance = checked_range(distance)?;
        let half_angle = (self.field.robot_radius / distance).atan().to_degrees();
        let offset = half_angle - self.epsilon_degree;
        let facing = body.pose().facing_degree;

        for heading in [facing + offset, facing - offset] {
            let probe = body.probe(heading);
            let sighting = self.classify(probe.pose(), laser, teammate)?;
            if sighting.class != Classification::Nothing {
                log::debug!(
                    "Probe at {:.1} deg saw {:?}, target is a robot",
                    probe.pose().facing_degree,
                    sighting.class
                );
                return Ok(false);
            }
        }

        Ok(true)
    }
}

fn checked_range(distance: f64) -> Result<f64> {
    if distance.is_finite() && distance > 0.0 {
        Ok(distance)
    } else {
        Err(KeeperError::SensorFault { distance })
    }
}
