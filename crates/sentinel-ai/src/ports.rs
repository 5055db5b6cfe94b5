//! Capability ports the behavior engine drives.
//!
//! Movement, animation, weapons and signal effects live outside this crate.
//! States only talk to them through these narrow traits, so any engine can
//! plug in its own implementations.

use crate::alarm::SignalKind;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Result of a path query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathStatus {
    /// A full path to the target exists
    Complete,
    /// Only part of the way is reachable
    Partial,
    /// No path at all
    Invalid,
}

impl PathStatus {
    /// Whether the agent can make progress toward the target.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Complete | Self::Partial)
    }
}

/// Movement and pathfinding interface.
pub trait Navigator {
    /// Starts moving toward a destination.
    fn move_to(&mut self, destination: Vec3);
    /// Halts movement in place.
    fn stop(&mut self);
    /// Re-enables movement after a stop.
    fn resume(&mut self);
    /// Sets movement speed.
    fn set_speed(&mut self, speed: f32);
    /// Sets how close to the destination counts as arrived.
    fn set_stopping_distance(&mut self, distance: f32);
    /// Whether the last destination has been reached.
    fn has_reached_destination(&self) -> bool;
    /// Queries reachability of a target.
    fn calculate_path(&self, target: Vec3) -> PathStatus;
    /// Snaps a position onto the navigable surface within `max_distance`.
    fn sample_navigable(&self, near: Vec3, max_distance: f32) -> Option<Vec3>;
    /// Turns the agent to face a position.
    fn face(&mut self, target: Vec3);
}

/// Animation interface.
pub trait AnimPort {
    /// Drives the locomotion blend.
    fn set_speed(&mut self, speed: f32);
    /// Plays the look-around cue.
    fn play_look_around(&mut self);
    /// Plays the attack animation.
    fn play_attack(&mut self);
    /// Plays the death animation.
    fn play_death(&mut self);
}

/// Weapon interface.
pub trait WeaponPort {
    /// Performs a single attack against a position.
    fn perform_attack(&mut self, target: Vec3);
}

/// Receiver of raised escalation signals.
pub trait SignalSink {
    /// Raises a signal from `origin`.
    fn raise(&mut self, signal: SignalKind, origin: Vec3);
}

/// Bundle of ports lent to an agent for one call.
pub struct AgentPorts<'w> {
    /// Movement
    pub navigator: &'w mut dyn Navigator,
    /// Animation
    pub anim: &'w mut dyn AnimPort,
    /// Weapon
    pub weapon: &'w mut dyn WeaponPort,
    /// Signal effects
    pub signals: &'w mut dyn SignalSink,
}

impl<'w> AgentPorts<'w> {
    /// Bundles the four ports.
    pub fn new(
        navigator: &'w mut dyn Navigator,
        anim: &'w mut dyn AnimPort,
        weapon: &'w mut dyn WeaponPort,
        signals: &'w mut dyn SignalSink,
    ) -> Self {
        Self {
            navigator,
            anim,
            weapon,
            signals,
        }
    }

    /// Sets both navigator and animation speed.
    pub fn set_speed(&mut self, speed: f32) {
        self.navigator.set_speed(speed);
        self.anim.set_speed(speed);
    }
}
