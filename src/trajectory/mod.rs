use crate::error::{KeeperError, Result};
use crate::math::Vec2;

/// Ring buffer holding the two most recent ball sightings, oldest first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SightingWindow {
    slots: [Vec2; 2],
    len: usize,
}

impl SightingWindow {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == 2
    }

    /// Appends a sighting, evicting the oldest when both slots are taken.
    pub fn push(&mut self, sighting: Vec2) {
        if self.is_full() {
            self.slots[0] = self.slots[1];
            self.slots[1] = sighting;
        } else {
            self.slots[self.len] = sighting;
            self.len += 1;
        }
    }

    /// Drops the oldest sighting and keeps only the newest.
    pub fn shift(&mut self) {
        if self.is_full() {
            self.slots[0] = self.slots[1];
            self.len = 1;
        }
    }

    pub fn oldest(&self) -> Option<Vec2> {
        (self.len > 0).then(|| self.slots[0])
    }

    pub fn newest(&self) -> Option<Vec2> {
        (self.len > 0).then(|| self.slots[self.len - 1])
    }

    /// Both sightings, oldest first, once the window is full.
    pub fn pair(&self) -> Option<(Vec2, Vec2)> {
        self.is_full().then(|| (self.slots[0], self.slots[1]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub slope: f64,
    pub intercept: f64,
}

impl Line {
    /// The unique line through two points with distinct x.
    pub fn through(p0: Vec2, p1: Vec2) -> Result<Line> {
        if p1.x == p0.x {
            return Err(KeeperError::DegenerateTrajectory { x: p0.x });
        }

        let slope = (p1.y - p0.y) / (p1.x - p0.x);
        Ok(Line {
            slope,
            intercept: p0.y - slope * p0.x,
        })
    }

    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Straight-line ball model over the last two sightings.
///
/// The fit is blind to the direction of travel; the defense loop filters
/// out balls heading away before asking for an estimate.
#[derive(Debug, Default, Clone)]
pub struct TrajectoryEstimator {
    window: SightingWindow,
}

impl TrajectoryEstimator {
    pub fn window(&self) -> &SightingWindow {
        &self.window
    }

    pub fn record(&mut self, sighting: Vec2) {
        self.window.push(sighting);
    }

    /// With two sightings, true when the ball moves towards the opponent's end.
    pub fn is_trending_away(&self) -> bool {
        match self.window.pair() {
            Some((older, newer)) => newer.x > older.x,
            None => false,
        }
    }

    /// Fits the two sightings, shifts the window and evaluates the line at
    /// the x of the sighting that remains. `Ok(None)` means keep collecting.
    pub fn estimate_y(&mut self) -> Result<Option<f64>> {
        let Some((older, newer)) = self.window.pair() else {
            return Ok(None);
        };

        self.window.shift();
        let line = Line::through(older, newer)?;

        // evaluated at the retained point, not projected to the goal line
        let retained = self.window.oldest().unwrap_or(newer);
        Ok(Some(line.y_at(retained.x)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn window_evicts_oldest() {
        let mut window = SightingWindow::default();
        assert!(window.is_empty());
        assert_eq!(window.newest(), None);

        window.push(Vec2::new(1.0, 1.0));
        assert_eq!(window.len(), 1);
        assert_eq!(window.oldest(), window.newest());
        assert_eq!(window.pair(), None);

        window.push(Vec2::new(2.0, 2.0));
        window.push(Vec2::new(3.0, 3.0));
        assert_eq!(window.len(), 2);
        assert_eq!(window.oldest(), Some(Vec2::new(2.0, 2.0)));
        assert_eq!(window.newest(), Some(Vec2::new(3.0, 3.0)));
        assert_eq!(
            window.pair(),
            Some((Vec2::new(2.0, 2.0), Vec2::new(3.0, 3.0)))
        );

        window.shift();
        assert_eq!(window.len(), 1);
        assert_eq!(window.oldest(), Some(Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn line_through_two_sightings() {
        let line = Line::through(Vec2::new(5.0, 5.0), Vec2::new(10.0, 7.0)).unwrap();
        assert_relative_eq!(line.slope, 0.4);
        assert_relative_eq!(line.intercept, 3.0);
    }

    #[test]
    fn estimate_needs_two_sightings() {
        let mut estimator = TrajectoryEstimator::default();
        assert_eq!(estimator.estimate_y(), Ok(None));
        estimator.record(Vec2::new(5.0, 5.0));
        assert_eq!(estimator.estimate_y(), Ok(None));
        assert_eq!(estimator.window().len(), 1);
    }

    #[test]
    fn estimate_reproduces_retained_point_and_shifts() {
        let mut estimator = TrajectoryEstimator::default();
        estimator.record(Vec2::new(5.0, 5.0));
        estimator.record(Vec2::new(10.0, 7.0));

        let y = estimator.estimate_y().unwrap().unwrap();
        assert_relative_eq!(y, 7.0);
        assert_eq!(estimator.window().len(), 1);
        assert_eq!(estimator.window().oldest(), Some(Vec2::new(10.0, 7.0)));
    }

    #[test]
    fn vertical_trajectory_is_degenerate() {
        let mut estimator = TrajectoryEstimator::default();
        estimator.record(Vec2::new(4.0, 5.0));
        estimator.record(Vec2::new(4.0, 9.0));

        assert_eq!(
            estimator.estimate_y(),
            Err(KeeperError::DegenerateTrajectory { x: 4.0 })
        );
        assert_eq!(estimator.window().len(), 1);
    }

    #[test]
    fn direction_of_travel() {
        let mut estimator = TrajectoryEstimator::default();
        estimator.record(Vec2::new(6.0, 5.0));
        assert!(!estimator.is_trending_away());
        estimator.record(Vec2::new(7.0, 5.0));
        assert!(estimator.is_trending_away());
        estimator.record(Vec2::new(3.0, 5.0));
        assert!(!estimator.is_trending_away());
    }
}
