use crate::config::KeeperSettings;
use crate::error::KeeperError;
use crate::field::Field;
use crate::intercom::TeammateCommand;
use crate::math::Vec2;
use crate::motion::{Kinematics, Pose};
use crate::perception::{Classification, RangeSensor, Sighting, SightingClassifier};
use crate::trajectory::TrajectoryEstimator;
use std::time::{Duration, Instant};

/// Out-of-field sentinel so an unknown teammate never matches a sighting.
pub const UNKNOWN_TEAMMATE: Vec2 = Vec2::new(-1.0, -1.0);

const HOME_TOLERANCE: f64 = 1e-9;

/// Match-end predicate, polled before every state-machine step.
pub trait MatchReferee: Send {
    fn is_match_over(&self) -> bool;
}

impl<F> MatchReferee for F
where
    F: Fn() -> bool + Send,
{
    fn is_match_over(&self) -> bool {
        self()
    }
}

/// Ends the match a fixed time after kick-off.
pub struct TimedMatch {
    end: Instant,
}

impl TimedMatch {
    pub fn new(duration: Duration) -> TimedMatch {
        TimedMatch {
            end: Instant::now() + duration,
        }
    }
}

impl MatchReferee for TimedMatch {
    fn is_match_over(&self) -> bool {
        Instant::now() >= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Clockwise,
    CounterClockwise,
}

impl SearchDirection {
    pub fn reversed(self) -> SearchDirection {
        match self {
            SearchDirection::Clockwise => SearchDirection::CounterClockwise,
            SearchDirection::CounterClockwise => SearchDirection::Clockwise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefensePhase {
    Reposition,
    Scan,
    /// A shot on goal was predicted to cross at this y
    Resolve(f64),
}

/// Search, track and defend loop of the goalkeeper.
pub struct Goalkeeper {
    field: Field,
    body: Kinematics,
    classifier: SightingClassifier,
    estimator: TrajectoryEstimator,
    laser: Box<dyn RangeSensor>,
    teammate: Vec2,
    search: SearchDirection,
    phase: DefensePhase,
}

impl Goalkeeper {
    /// Places the keeper at its home point, facing the opponent's end.
    pub fn new(field: Field, settings: &KeeperSettings, laser: Box<dyn RangeSensor>) -> Goalkeeper {
        Goalkeeper {
            body: Kinematics::new(field, settings.face_movement, field.home(), 0.0),
            classifier: SightingClassifier::new(
                field,
                settings.epsilon_degree,
                settings.boundary_tolerance,
            ),
            estimator: TrajectoryEstimator::default(),
            laser,
            teammate: UNKNOWN_TEAMMATE,
            search: SearchDirection::Clockwise,
            phase: DefensePhase::Reposition,
            field,
        }
    }

    pub fn pose(&self) -> &Pose {
        self.body.pose()
    }

    pub fn phase(&self) -> DefensePhase {
        self.phase
    }

    pub fn teammate(&self) -> Vec2 {
        self.teammate
    }

    pub fn search_direction(&self) -> SearchDirection {
        self.search
    }

    pub fn estimator(&self) -> &TrajectoryEstimator {
        &self.estimator
    }

    pub fn apply(&mut self, command: TeammateCommand) {
        match command {
            TeammateCommand::Relocate(target) => {
                log::info!("Teammate asks to relocate to ({:.2}, {:.2})", target.x, target.y);
                self.go_to(target);
            }
            TeammateCommand::TeammateAt(position) => {
                log::debug!("Teammate at ({}, {})", position.x, position.y);
                self.teammate = position;
            }
            TeammateCommand::ReverseSearch => {
                self.search = self.search.reversed();
                log::info!("Teammate reversed search, now {:?}", self.search);
            }
        }
    }

    /// Advances the state machine by one step. Returns the intercept y once
    /// a threat has been resolved and the keeper moved to block it.
    pub fn step(&mut self) -> Option<f64> {
        match self.phase {
            DefensePhase::Reposition => {
                self.reposition();
                None
            }
            DefensePhase::Scan => {
                if let Some(y) = self.scan() {
                    log::info!("Shot on goal predicted at y = {:.2}", y);
                    self.phase = DefensePhase::Resolve(y);
                }
                None
            }
            DefensePhase::Resolve(y) => {
                self.go_to(Vec2::new(self.field.home().x, y));
                self.phase = DefensePhase::Reposition;
                Some(y)
            }
        }
    }

    /// Steps until a threat is resolved, or `stop` fires.
    pub fn prevent_attack(&mut self, stop: &mut dyn FnMut() -> bool) -> Option<f64> {
        loop {
            if stop() {
                return None;
            }
            if let DefensePhase::Resolve(y) = self.phase {
                return Some(y);
            }
            self.step();
        }
    }

    /// Defends until the match is over or `stop` fires. Returns the number
    /// of intercepts made.
    pub fn run(&mut self, referee: &dyn MatchReferee, stop: &mut dyn FnMut() -> bool) -> usize {
        let mut halt = || stop() || referee.is_match_over();
        let mut intercepts = 0;
        while self.prevent_attack(&mut halt).is_some() {
            if let Some(y) = self.step() {
                intercepts += 1;
                log::info!("Intercept {} at y = {:.2}", intercepts, y);
            }
        }
        intercepts
    }

    fn go_to(&mut self, target: Vec2) {
        if let Err(err) = self.body.go_to_location(target.x, target.y) {
            log::warn!(
                "Stopped short of ({:.2}, {:.2}): {}",
                target.x,
                target.y,
                err
            );
        }
    }

    fn reposition(&mut self) {
        let home = self.field.home();
        if self.body.pose().position().distance(&home) > HOME_TOLERANCE {
            self.go_to(home);
        }
        self.body.rotate_to_angle(90.0);
        self.search = SearchDirection::Clockwise;
        self.phase = DefensePhase::Scan;
    }

    fn turn(&mut self) {
        match self.search {
            SearchDirection::Clockwise => self.body.rotate_clockwise(),
            SearchDirection::CounterClockwise => self.body.rotate_counter_clockwise(),
        }
    }

    /// One rotate-then-sense cycle. Returns an estimate inside the goal band.
    fn scan(&mut self) -> Option<f64> {
        let facing = self.body.pose().facing_degree;
        if facing > 90.0 && facing < 270.0 {
            self.body.rotate_to_angle(90.0);
        }

        let sighting = match self
            .classifier
            .classify(self.body.pose(), self.laser.as_mut(), self.teammate)
        {
            Ok(sighting) => sighting,
            Err(err) => {
                log::debug!("{}, treating as nothing seen", err);
                self.turn();
                return None;
            }
        };

        match sighting.class {
            Classification::Nothing | Classification::Teammate => {
                self.turn();
                None
            }
            Classification::BallOrOpponent => self.track(sighting),
        }
    }

    fn track(&mut self, sighting: Sighting) -> Option<f64> {
        let is_ball = match self.classifier.disambiguate_ball(
            &mut self.body,
            self.laser.as_mut(),
            self.teammate,
            sighting.distance,
        ) {
            Ok(is_ball) => is_ball,
            Err(err) => {
                log::debug!("{}, treating as nothing seen", err);
                self.turn();
                return None;
            }
        };

        if !is_ball {
            log::debug!(
                "Opponent at ({:.2}, {:.2}), scanning on",
                sighting.position.x,
                sighting.position.y
            );
            self.turn();
            return None;
        }

        self.estimator.record(sighting.position);
        if !self.estimator.window().is_full() {
            return None;
        }

        if self.estimator.is_trending_away() {
            log::debug!("Ball heading away from our goal, discarding round");
            return None;
        }

        match self.estimator.estimate_y() {
            Ok(Some(y)) if self.field.will_enter_goal(y) => Some(y),
            Ok(_) => None,
            Err(KeeperError::DegenerateTrajectory { x }) => {
                log::debug!("Both sightings at x = {:.3}, discarding round", x);
                None
            }
            Err(err) => {
                log::warn!("Trajectory estimate failed: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::raycast::distance_to_boundary;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Empty field, except for the given readings whenever the keeper looks along `heading`.
    fn scripted(heading: f64, readings: Vec<f64>) -> Box<dyn RangeSensor> {
        let field = Field::default();
        let mut readings = VecDeque::from(readings);
        Box::new(move |pose: &Pose| {
            if (pose.facing_degree - heading).abs() < 1e-9 {
                if let Some(reading) = readings.pop_front() {
                    return reading;
                }
            }
            distance_to_boundary(&field, pose.position(), pose.facing_degree)
        })
    }

    fn keeper(laser: Box<dyn RangeSensor>) -> Goalkeeper {
        Goalkeeper::new(Field::default(), &KeeperSettings::default(), laser)
    }

    fn never() -> impl FnMut() -> bool {
        || false
    }

    #[test]
    fn reposition_faces_the_pitch_and_starts_scanning() {
        let mut keeper = keeper(scripted(0.0, vec![]));
        assert_eq!(keeper.phase(), DefensePhase::Reposition);

        assert_eq!(keeper.step(), None);
        assert_eq!(keeper.phase(), DefensePhase::Scan);
        assert_eq!(keeper.pose().facing_degree, 90.0);
        assert_eq!(keeper.pose().position(), Field::default().home());
        assert_eq!(keeper.search_direction(), SearchDirection::Clockwise);
    }

    #[test]
    fn reposition_walks_back_home() {
        let mut keeper = keeper(scripted(0.0, vec![]));
        keeper.apply(TeammateCommand::Relocate(Vec2::new(8.0, 17.5)));
        assert!(keeper.pose().position().distance(&Field::default().home()) > 1.0);

        keeper.step();
        assert!(keeper.pose().position().distance(&Field::default().home()) <= 1.5);
        assert_eq!(keeper.pose().facing_degree, 90.0);
    }

    #[test]
    fn empty_field_scans_clockwise() {
        let mut keeper = keeper(scripted(0.0, vec![]));
        keeper.step();
        keeper.step();
        assert_eq!(keeper.pose().facing_degree, 88.0);
        keeper.step();
        assert_eq!(keeper.pose().facing_degree, 86.0);
        assert!(keeper.estimator().window().is_empty());
    }

    #[test]
    fn scan_never_looks_at_our_own_goal() {
        let field = Field::default();
        let headings = Arc::new(Mutex::new(Vec::new()));
        let seen = headings.clone();
        let laser = Box::new(move |pose: &Pose| {
            seen.lock().unwrap().push(pose.facing_degree);
            distance_to_boundary(&field, pose.position(), pose.facing_degree)
        });
        let mut keeper = Goalkeeper::new(field, &KeeperSettings::default(), laser);

        for _ in 0..1000 {
            keeper.step();
        }

        let headings = headings.lock().unwrap();
        assert_eq!(headings.len(), 999);
        assert!(headings.contains(&0.0));
        assert!(headings.contains(&270.0));
        for facing in headings.iter() {
            assert!(!(*facing > 90.0 && *facing < 270.0), "facing {}", facing);
        }
    }

    #[test]
    fn reversed_search_turns_counter_clockwise() {
        let mut keeper = keeper(scripted(0.0, vec![]));
        keeper.step();
        keeper.apply(TeammateCommand::ReverseSearch);
        keeper.step();
        // 92 lies inside the back half, so the next scan snaps to 90 first
        assert_eq!(keeper.pose().facing_degree, 92.0);
        keeper.step();
        assert_eq!(keeper.pose().facing_degree, 92.0);
    }

    #[test]
    fn sensor_fault_is_treated_as_nothing_seen() {
        let mut keeper = keeper(scripted(90.0, vec![0.0]));
        keeper.step();
        keeper.step();
        assert_eq!(keeper.phase(), DefensePhase::Scan);
        assert_eq!(keeper.pose().facing_degree, 88.0);
    }

    #[test]
    fn approaching_ball_resolves_and_intercepts() {
        // 15 clockwise steps from 90 lands on 60 degrees
        let mut keeper = keeper(scripted(60.0, vec![2.5, 2.0]));
        let mut stop = never();

        let y = keeper.prevent_attack(&mut stop).unwrap();
        // the estimate reproduces the newer sighting at (6.0, 15 + 2 sin 60)
        assert_relative_eq!(y, 15.0 + 2.0 * 60f64.to_radians().sin(), epsilon = 1e-9);
        assert_eq!(keeper.phase(), DefensePhase::Resolve(y));

        assert_eq!(keeper.step(), Some(y));
        assert_eq!(keeper.phase(), DefensePhase::Reposition);
        assert_relative_eq!(keeper.pose().x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(keeper.pose().y, 18.0, epsilon = 1e-9);
    }

    #[test]
    fn ball_moving_away_is_discarded() {
        let mut keeper = keeper(scripted(60.0, vec![2.0, 2.5, 2.0]));
        let mut stop = never();

        let y = keeper.prevent_attack(&mut stop).unwrap();
        // first pair was discarded, the estimate comes from (2.5, 2.0)
        assert_relative_eq!(y, 15.0 + 2.0 * 60f64.to_radians().sin(), epsilon = 1e-9);
        assert_eq!(keeper.estimator().window().len(), 1);
    }

    #[test]
    fn shot_wide_of_goal_keeps_scanning() {
        // second sighting lands at y = 15 + 4 sin 60, above the band
        let mut keeper = keeper(scripted(60.0, vec![5.0, 4.0]));
        for _ in 0..18 {
            keeper.step();
        }
        assert_eq!(keeper.phase(), DefensePhase::Scan);
        assert_eq!(keeper.estimator().window().len(), 1);
    }

    #[test]
    fn opponent_is_not_tracked() {
        let field = Field::default();
        let mut settings = KeeperSettings::default();
        settings.epsilon_degree = 2.0;
        // an opponent straight up the pitch, wide enough to catch both probes
        let opponent = crate::perception::raycast::Circle {
            center: Vec2::new(5.0, 27.0),
            radius: field.robot_radius,
        };
        let laser = Box::new(move |pose: &Pose| {
            crate::perception::raycast::raycast(
                &field,
                &[opponent],
                pose.position(),
                pose.facing_degree,
            )
        });
        let mut keeper = Goalkeeper::new(field, &settings, laser);
        keeper.apply(TeammateCommand::Relocate(Vec2::new(5.0, 2.0)));
        keeper.body.rotate_to_angle(90.0);
        keeper.phase = DefensePhase::Scan;

        keeper.step();
        assert!(keeper.estimator().window().is_empty());
        assert_eq!(keeper.pose().facing_degree, 88.0);
    }

    #[test]
    fn teammate_position_is_cached() {
        let mut keeper = keeper(scripted(0.0, vec![]));
        assert_eq!(keeper.teammate(), UNKNOWN_TEAMMATE);
        keeper.apply(TeammateCommand::TeammateAt(Vec2::new(3.0, 4.0)));
        assert_eq!(keeper.teammate(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn teammate_sighting_is_skipped() {
        // beam at 90 degrees stops at (5, 19), exactly where the teammate stands
        let mut keeper = keeper(scripted(90.0, vec![4.0]));
        keeper.apply(TeammateCommand::TeammateAt(Vec2::new(5.0, 19.0)));
        keeper.step();
        keeper.step();
        assert!(keeper.estimator().window().is_empty());
        assert_eq!(keeper.pose().facing_degree, 88.0);
    }

    #[test]
    fn stop_interrupts_an_endless_scan() {
        let mut keeper = keeper(scripted(0.0, vec![]));
        let mut calls = 0;
        let mut stop = || {
            calls += 1;
            calls > 100
        };
        assert_eq!(keeper.prevent_attack(&mut stop), None);
    }

    #[test]
    fn run_ends_with_the_match() {
        let mut keeper = keeper(scripted(60.0, vec![2.5, 2.0]));
        let polls = AtomicUsize::new(0);
        let referee = || polls.fetch_add(1, Ordering::SeqCst) >= 100;

        assert_eq!(keeper.run(&referee, &mut never()), 1);
        assert_eq!(polls.load(Ordering::SeqCst), 101);
    }

    #[test]
    fn match_end_stops_an_endless_scan() {
        let mut keeper = keeper(scripted(0.0, vec![]));
        let polls = AtomicUsize::new(0);
        let referee = || polls.fetch_add(1, Ordering::SeqCst) >= 1;
        let mut steps = 0;
        let mut stop = || {
            steps += 1;
            steps > 50_000
        };

        assert_eq!(keeper.run(&referee, &mut stop), 0);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert!(steps <= 2);
    }

    #[test]
    fn timed_match_expires() {
        assert!(TimedMatch::new(Duration::from_secs(0)).is_match_over());
        assert!(!TimedMatch::new(Duration::from_secs(60)).is_match_over());
    }
}
