use crate::math::Vec2;
use serde::{Deserialize, Serialize};

/// Immutable dimensions of the pitch. The defended goal sits at x = 0 and
/// spans the goal band along y.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    pub robot_radius: f64,
    pub ball_radius: f64,
    pub field_length: f64,
    pub field_width: f64,
    pub goal_width: f64,
    pub goal_depth: f64,
}

impl Default for Field {
    fn default() -> Self {
        Field {
            robot_radius: 3.0,
            ball_radius: 2.0,
            field_length: 30.0,
            field_width: 10.0,
            goal_width: 5.0,
            goal_depth: 2.0,
        }
    }
}

impl Field {
    pub fn step_size(&self) -> f64 {
        self.robot_radius / 2.0
    }

    /// Defensive home point in front of the goal mouth.
    pub fn home(&self) -> Vec2 {
        Vec2::new(self.goal_depth + self.robot_radius, self.field_length / 2.0)
    }

    pub fn right_corner_guard(&self) -> Vec2 {
        Vec2::new(
            self.goal_width + self.robot_radius,
            (self.field_length + self.goal_width) / 2.0,
        )
    }

    pub fn left_corner_guard(&self) -> Vec2 {
        Vec2::new(
            self.goal_width + self.robot_radius,
            (self.field_length - self.goal_width) / 2.0,
        )
    }

    pub fn goal_band(&self) -> (f64, f64) {
        (
            (self.field_length - self.goal_width) / 2.0,
            (self.field_length + self.goal_width) / 2.0,
        )
    }

    pub fn will_enter_goal(&self, y: f64) -> bool {
        let (low, high) = self.goal_band();
        low <= y && y <= high
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.field_width).contains(&point.x) && (0.0..=self.field_length).contains(&point.y)
    }

    /// True when `point` lies on one of the four field edges, within `tolerance`.
    pub fn on_boundary(&self, point: Vec2, tolerance: f64) -> bool {
        point.x.abs() <= tolerance
            || (point.x - self.field_width).abs() <= tolerance
            || point.y.abs() <= tolerance
            || (point.y - self.field_length).abs() <= tolerance
    }
}
