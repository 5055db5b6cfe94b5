//! Patrol routes and waypoints.

use glam::Vec3;
use sentinel_common::ConfigError;
use serde::{Deserialize, Serialize};

/// What an agent does on arriving at a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WaypointAction {
    /// Move on immediately
    #[default]
    Continue,
    /// Stand still for the waypoint's wait time
    Wait,
    /// Stand still and play the look-around cue
    WaitAndLook,
}

impl WaypointAction {
    /// All actions, in declaration order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Continue, Self::Wait, Self::WaitAndLook]
    }

    /// Picks an action uniformly at random.
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        let all = Self::all();
        all[rng.usize(..all.len())]
    }
}

/// A single stop on a patrol route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// World position
    pub position: Vec3,
    /// Action performed on arrival
    #[serde(default)]
    pub action: WaypointAction,
    /// Wait time in seconds for `Wait` and `WaitAndLook`
    #[serde(default)]
    pub wait_time: f32,
    /// Replace `action` with a random one on every visit
    #[serde(default)]
    pub randomize_action: bool,
}

impl Waypoint {
    /// Creates a pass-through waypoint.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            action: WaypointAction::Continue,
            wait_time: 0.0,
            randomize_action: false,
        }
    }

    /// Sets the arrival action and its wait time.
    #[must_use]
    pub fn with_action(mut self, action: WaypointAction, wait_time: f32) -> Self {
        self.action = action;
        self.wait_time = wait_time;
        self
    }

    /// Enables per-visit action randomization.
    #[must_use]
    pub fn randomized(mut self) -> Self {
        self.randomize_action = true;
        self
    }

    /// Resolves the action for this visit.
    pub fn resolve_action(&self, rng: &mut fastrand::Rng) -> WaypointAction {
        if self.randomize_action {
            WaypointAction::random(rng)
        } else {
            self.action
        }
    }
}

/// Ordered, looping sequence of waypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    waypoints: Vec<Waypoint>,
}

impl PatrolRoute {
    /// Creates a route from waypoints.
    #[must_use]
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Creates a pass-through route from bare positions.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        Self::new(points.into_iter().map(Waypoint::new).collect())
    }

    /// Number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether the route has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Index following `index`, wrapping to 0 after the last waypoint.
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        if self.waypoints.is_empty() {
            0
        } else {
            (index + 1) % self.waypoints.len()
        }
    }

    /// All waypoints.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Rejects negative or non-finite wait times.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, wp) in self.waypoints.iter().enumerate() {
            if !wp.wait_time.is_finite() || wp.wait_time < 0.0 {
                return Err(ConfigError::InvalidRoute(format!(
                    "waypoint {i} has wait time {}",
                    wp.wait_time
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square() -> PatrolRoute {
        PatrolRoute::from_points([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 10.0),
        ])
    }

    #[test]
    fn test_next_index_wraps() {
        let route = square();
        assert_eq!(route.next_index(0), 1);
        assert_eq!(route.next_index(3), 0);
    }

    #[test]
    fn test_empty_route_next_index() {
        assert_eq!(PatrolRoute::default().next_index(5), 0);
    }

    #[test]
    fn test_fixed_action_resolution() {
        let mut rng = fastrand::Rng::with_seed(1);
        let wp = Waypoint::new(Vec3::ZERO).with_action(WaypointAction::Wait, 2.0);
        for _ in 0..10 {
            assert_eq!(wp.resolve_action(&mut rng), WaypointAction::Wait);
        }
    }

    #[test]
    fn test_randomized_action_covers_all() {
        let mut rng = fastrand::Rng::with_seed(7);
        let wp = Waypoint::new(Vec3::ZERO).randomized();
        let mut seen = [false; 3];
        for _ in 0..200 {
            let idx = match wp.resolve_action(&mut rng) {
                WaypointAction::Continue => 0,
                WaypointAction::Wait => 1,
                WaypointAction::WaitAndLook => 2,
            };
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_validate_negative_wait() {
        let route = PatrolRoute::new(vec![
            Waypoint::new(Vec3::ZERO).with_action(WaypointAction::Wait, -1.0)
        ]);
        assert!(route.validate().is_err());
        assert!(square().validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_index_visits_every_waypoint(len in 1usize..16, start in 0usize..16) {
            let route = PatrolRoute::from_points((0..len).map(|i| Vec3::new(i as f32, 0.0, 0.0)));
            let mut index = start % len;
            let mut visited = vec![0u32; len];
            for _ in 0..len * 3 {
                visited[index] += 1;
                index = route.next_index(index);
            }
            prop_assert!(visited.iter().all(|v| *v == 3));
        }
    }
}
