use crate::error::{KeeperError, Result};
use crate::field::Field;
use crate::math::{bearing_degrees, normalize_degrees, Vec2};
use std::ops::Deref;

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    /// Heading in degrees, always in `[0, 360)`. 0 faces the opponent's end.
    pub facing_degree: f64,
}

impl Pose {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Relative step directions, as offsets from the current heading.
#[derive(Debug, Clone, Copy)]
enum Step {
    Forward,
    Backward,
    Left,
    Right,
}

impl Step {
    fn offset_degrees(self) -> f64 {
        match self {
            Step::Forward => 0.0,
            Step::Backward => 180.0,
            Step::Right => 90.0,
            Step::Left => -90.0,
        }
    }
}

/// Position and heading of the keeper, bounded by the field.
#[derive(Debug, Clone)]
pub struct Kinematics {
    pose: Pose,
    field: Field,
    step_size: f64,
    face_movement: f64,
}

impl Kinematics {
    pub fn new(field: Field, face_movement: f64, start: Vec2, facing_degree: f64) -> Kinematics {
        Kinematics {
            pose: Pose {
                x: start.x,
                y: start.y,
                facing_degree: normalize_degrees(facing_degree),
            },
            step_size: field.step_size(),
            field,
            face_movement,
        }
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn move_forward(&mut self) -> Result<()> {
        self.step(Step::Forward)
    }

    pub fn move_backward(&mut self) -> Result<()> {
        self.step(Step::Backward)
    }

    pub fn move_left(&mut self) -> Result<()> {
        self.step(Step::Left)
    }

    pub fn move_right(&mut self) -> Result<()> {
        self.step(Step::Right)
    }

    fn step(&mut self, step: Step) -> Result<()> {
        let candidate = self.pose.position()
            + Vec2::from_degrees(self.pose.facing_degree + step.offset_degrees()) * self.step_size;

        if !self.field.contains(candidate) {
            return Err(KeeperError::OutOfBounds {
                x: candidate.x,
                y: candidate.y,
            });
        }

        self.pose.x = candidate.x;
        self.pose.y = candidate.y;
        Ok(())
    }

    pub fn rotate_clockwise(&mut self) {
        self.rotate_to_angle(self.pose.facing_degree - self.face_movement);
    }

    pub fn rotate_counter_clockwise(&mut self) {
        self.rotate_to_angle(self.pose.facing_degree + self.face_movement);
    }

    pub fn rotate_to_angle(&mut self, angle: f64) {
        self.pose.facing_degree = normalize_degrees(angle);
    }

    /// Turns once towards the target and walks straight at it in whole steps.
    /// The bearing is fixed up front, so the keeper may overshoot by up to
    /// one step. Returns the number of steps taken.
    pub fn go_to_location(&mut self, target_x: f64, target_y: f64) -> Result<usize> {
        let target = Vec2::new(target_x, target_y);
        let mut remaining = self.pose.position().distance(&target);
        if remaining == 0.0 {
            return Ok(0);
        }

        self.rotate_to_angle(bearing_degrees(self.pose.position(), target));

        let mut steps = 0;
        while remaining > 0.0 {
            self.move_forward()?;
            remaining -= self.step_size;
            steps += 1;
        }

        Ok(steps)
    }

    /// Points the keeper at `heading` until the returned guard is dropped.
    pub fn probe(&mut self, heading: f64) -> ProbeHeading<'_> {
        let original = self.pose.facing_degree;
        self.rotate_to_angle(heading);
        ProbeHeading {
            body: self,
            original,
        }
    }
}

/// Temporary heading override used by the width probe.
pub struct ProbeHeading<'a> {
    body: &'a mut Kinematics,
    original: f64,
}

impl Deref for ProbeHeading<'_> {
    type Target = Kinematics;

    fn deref(&self) -> &Kinematics {
        self.body
    }
}

impl Drop for ProbeHeading<'_> {
    fn drop(&mut self) {
        self.body.pose.facing_degree = self.original;
    }
}
