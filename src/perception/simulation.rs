use super::raycast::{raycast, Circle};
use super::RangeSensor;
use crate::config::SimulationSettings;
use crate::field::Field;
use crate::math::Vec2;
use crate::motion::Pose;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

/// In-process laser over a scene of one rolling ball, static opponents and
/// an optional teammate. Every measurement advances the ball by one tick;
/// once it leaves the field a new shot is fired at the goal.
pub struct SimulatedLaser {
    field: Field,
    rng: StdRng,
    ball: Vec2,
    velocity: Vec2,
    ball_speed: f64,
    noise_std: f64,
    obstacles: Vec<Circle>,
    shots: u32,
}

impl SimulatedLaser {
    pub fn new(field: Field, settings: &SimulationSettings) -> SimulatedLaser {
        let rng = if settings.seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(settings.seed)
        };

        let mut obstacles: Vec<Circle> = settings
            .opponents
            .iter()
            .map(|center| Circle {
                center: *center,
                radius: field.robot_radius,
            })
            .collect();

        if let Some(teammate) = settings.teammate {
            obstacles.push(Circle {
                center: teammate,
                radius: field.robot_radius,
            });
        }

        let mut laser = SimulatedLaser {
            field,
            rng,
            ball: Vec2::default(),
            velocity: Vec2::default(),
            ball_speed: settings.ball_speed,
            noise_std: settings.noise_std,
            obstacles,
            shots: 0,
        };
        laser.new_shot();
        laser
    }

    pub fn ball(&self) -> Vec2 {
        self.ball
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    fn new_shot(&mut self) {
        let field = self.field;
        let margin = field.ball_radius;
        let (low, high) = field.goal_band();

        let start = Vec2::new(
            self.rng
                .gen_range(field.field_width * 0.5..field.field_width - margin),
            self.rng.gen_range(margin..field.field_length - margin),
        );
        // aim somewhere around the goal mouth, some shots go wide
        let aim = Vec2::new(
            0.0,
            self.rng
                .gen_range(low - field.goal_width * 0.5..high + field.goal_width * 0.5),
        );

        let heading = aim - start;
        self.velocity = heading * (self.ball_speed / heading.magnitude());
        self.ball = start;
        self.shots += 1;

        log::debug!(
            "Simulated shot {} from ({:.2}, {:.2}) towards y = {:.2}",
            self.shots,
            start.x,
            start.y,
            aim.y
        );
    }

    fn advance(&mut self) {
        self.ball = self.ball + self.velocity;
        if self.ball.x <= 0.0 || !self.field.contains(self.ball) {
            self.new_shot();
        }
    }
}

impl RangeSensor for SimulatedLaser {
    fn measure(&mut self, pose: &Pose) -> f64 {
        self.advance();

        let mut circles = self.obstacles.clone();
        circles.push(Circle {
            center: self.ball,
            radius: self.field.ball_radius,
        });

        let distance = raycast(&self.field, &circles, pose.position(), pose.facing_degree);
        if self.noise_std == 0.0 {
            return distance;
        }

        let noise: f64 = self.rng.sample(StandardNormal);
        distance + noise * self.noise_std
    }
}
