//! Test doubles for every port.
//!
//! Public so integration tests and the headless simulator can drive agents
//! without an engine. [`MockNavigator`] is a simple kinematic mover.

use crate::alarm::SignalKind;
use crate::ports::{AnimPort, Navigator, PathStatus, SignalSink, WeaponPort};
use crate::world::AgentPose;
use glam::Vec3;
use sentinel_common::DIRECTION_EPSILON;

/// Arrival tolerance added on top of the stopping distance.
const ARRIVAL_SLACK: f32 = 1e-3;

/// Kinematic navigator for tests and headless runs.
#[derive(Debug, Clone)]
pub struct MockNavigator {
    /// Current position
    pub position: Vec3,
    /// Current facing
    pub forward: Vec3,
    /// Active destination
    pub destination: Option<Vec3>,
    /// Movement speed
    pub speed: f32,
    /// Arrival radius
    pub stopping_distance: f32,
    /// Whether movement is halted
    pub stopped: bool,
    /// Every `move_to` request, in order
    pub move_requests: Vec<Vec3>,
    /// Number of `stop` calls
    pub stop_calls: u32,
    /// Number of `resume` calls
    pub resume_calls: u32,
    /// Last position passed to `face`
    pub faced: Option<Vec3>,
    unreachable: bool,
    instant: bool,
}

impl MockNavigator {
    /// Creates a navigator at `position` facing +Z.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::Z,
            destination: None,
            speed: 0.0,
            stopping_distance: 0.0,
            stopped: false,
            move_requests: Vec::new(),
            stop_calls: 0,
            resume_calls: 0,
            faced: None,
            unreachable: false,
            instant: false,
        }
    }

    /// Teleports to every destination as soon as it is requested.
    #[must_use]
    pub const fn arriving_instantly(mut self) -> Self {
        self.instant = true;
        self
    }

    /// Makes every path query fail.
    #[must_use]
    pub const fn with_unreachable(mut self, unreachable: bool) -> Self {
        self.unreachable = unreachable;
        self
    }

    /// Sets the facing.
    #[must_use]
    pub fn facing(mut self, forward: Vec3) -> Self {
        self.forward = forward;
        self
    }

    /// Current pose.
    #[must_use]
    pub fn pose(&self) -> AgentPose {
        AgentPose::new(self.position, self.forward)
    }

    /// Last destination requested.
    #[must_use]
    pub fn last_move(&self) -> Option<Vec3> {
        self.move_requests.last().copied()
    }

    /// Moves toward the destination for `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.stopped {
            return;
        }
        let Some(destination) = self.destination else {
            return;
        };
        let to_dest = destination - self.position;
        let distance = to_dest.length();
        if distance <= self.stopping_distance {
            return;
        }
        let step = (self.speed * dt).min(distance);
        if distance > DIRECTION_EPSILON {
            let dir = to_dest / distance;
            self.forward = dir;
            self.position += dir * step;
        }
    }
}

impl Navigator for MockNavigator {
    fn move_to(&mut self, destination: Vec3) {
        self.move_requests.push(destination);
        self.destination = Some(destination);
        if self.instant {
            let to_dest = destination - self.position;
            if to_dest.length_squared() > DIRECTION_EPSILON {
                self.forward = to_dest.normalize();
            }
            self.position = destination;
        }
    }

    fn stop(&mut self) {
        self.stop_calls += 1;
        self.stopped = true;
    }

    fn resume(&mut self) {
        self.resume_calls += 1;
        self.stopped = false;
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn set_stopping_distance(&mut self, distance: f32) {
        self.stopping_distance = distance;
    }

    fn has_reached_destination(&self) -> bool {
        self.destination.map_or(true, |d| {
            d.distance(self.position) <= self.stopping_distance + ARRIVAL_SLACK
        })
    }

    fn calculate_path(&self, _target: Vec3) -> PathStatus {
        if self.unreachable {
            PathStatus::Invalid
        } else {
            PathStatus::Complete
        }
    }

    fn sample_navigable(&self, near: Vec3, _max_distance: f32) -> Option<Vec3> {
        (!self.unreachable).then_some(near)
    }

    fn face(&mut self, target: Vec3) {
        self.faced = Some(target);
        let to_target = target - self.position;
        if to_target.length_squared() > DIRECTION_EPSILON {
            self.forward = to_target.normalize();
        }
    }
}

/// Animation recorder.
#[derive(Debug, Clone, Default)]
pub struct MockAnimator {
    /// Last locomotion speed
    pub speed: f32,
    /// Look-around cues played
    pub look_arounds: u32,
    /// Attack animations played
    pub attacks: u32,
    /// Death animations played
    pub deaths: u32,
}

impl MockAnimator {
    /// Creates a recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimPort for MockAnimator {
    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn play_look_around(&mut self) {
        self.look_arounds += 1;
    }

    fn play_attack(&mut self) {
        self.attacks += 1;
    }

    fn play_death(&mut self) {
        self.deaths += 1;
    }
}

/// Weapon recorder.
#[derive(Debug, Clone, Default)]
pub struct MockWeapon {
    /// Positions attacked, in order
    pub attacks: Vec<Vec3>,
}

impl MockWeapon {
    /// Creates a recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl WeaponPort for MockWeapon {
    fn perform_attack(&mut self, target: Vec3) {
        self.attacks.push(target);
    }
}

/// Signal recorder.
#[derive(Debug, Clone, Default)]
pub struct RecordingSignalSink {
    /// Raised signals with their origins
    pub raised: Vec<(SignalKind, Vec3)>,
}

impl RecordingSignalSink {
    /// Creates a recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalSink for RecordingSignalSink {
    fn raise(&mut self, signal: SignalKind, origin: Vec3) {
        self.raised.push((signal, origin));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinematic_navigator_moves() {
        let mut nav = MockNavigator::new(Vec3::ZERO);
        nav.set_speed(2.0);
        nav.move_to(Vec3::new(10.0, 0.0, 0.0));
        assert!(!nav.has_reached_destination());
        nav.advance(1.0);
        assert!((nav.position.x - 2.0).abs() < 1e-5);
        nav.advance(10.0);
        assert!(nav.has_reached_destination());
    }

    #[test]
    fn test_stopped_navigator_holds() {
        let mut nav = MockNavigator::new(Vec3::ZERO);
        nav.set_speed(2.0);
        nav.move_to(Vec3::X * 10.0);
        nav.stop();
        nav.advance(1.0);
        assert_eq!(nav.position, Vec3::ZERO);
        nav.resume();
        nav.advance(1.0);
        assert!(nav.position.x > 0.0);
    }

    #[test]
    fn test_unreachable_navigator() {
        let nav = MockNavigator::new(Vec3::ZERO).with_unreachable(true);
        assert_eq!(nav.calculate_path(Vec3::X), PathStatus::Invalid);
        assert!(nav.sample_navigable(Vec3::X, 1.0).is_none());
    }

    #[test]
    fn test_instant_navigator() {
        let mut nav = MockNavigator::new(Vec3::ZERO).arriving_instantly();
        nav.move_to(Vec3::new(0.0, 0.0, 5.0));
        assert!(nav.has_reached_destination());
        assert_eq!(nav.position, Vec3::new(0.0, 0.0, 5.0));
    }
}
