//! Perception: vision cone, line of sight, dead-body scan and hearing.

use crate::config::AgentConfig;
use crate::world::{AgentPose, BodyRegistry, ObstructionQuery};
use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec3;
use sentinel_common::bearing_degrees;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A noise pushed by an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundEvent {
    /// Where the noise came from
    pub origin: Vec3,
    /// Loudness, compared against the hearing threshold
    pub intensity: f32,
}

impl SoundEvent {
    /// Creates a sound event.
    #[must_use]
    pub const fn new(origin: Vec3, intensity: f32) -> Self {
        Self { origin, intensity }
    }
}

/// Snapshot of what an agent perceived this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerceptionResult {
    /// Player is in sight
    pub target_visible: bool,
    /// A dead body is within scan radius
    pub body_found: bool,
    /// Loudest audible sound since the last poll
    pub sound: Option<SoundEvent>,
}

/// Vision and body-scan queries for one archetype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceptionService {
    detection_range: f32,
    half_cone: f32,
}

impl PerceptionService {
    /// Creates a service with explicit range and full cone angle in degrees.
    #[must_use]
    pub fn new(detection_range: f32, cone_angle: f32) -> Self {
        Self {
            detection_range,
            half_cone: cone_angle / 2.0,
        }
    }

    /// Creates a service from an agent config.
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            detection_range: config.detection_range,
            half_cone: config.half_cone_angle(),
        }
    }

    /// Maximum sight distance.
    #[must_use]
    pub const fn detection_range(&self) -> f32 {
        self.detection_range
    }

    /// Whether the observer sees `target`.
    ///
    /// True iff the target is within detection range, within half the cone
    /// angle of the observer's forward vector, and the segment between them
    /// is unobstructed. A missing target is never seen.
    pub fn can_see_target(
        &self,
        observer: &AgentPose,
        target: Option<Vec3>,
        obstruction: &dyn ObstructionQuery,
    ) -> bool {
        let Some(target) = target else {
            return false;
        };

        let to_target = target - observer.position;
        let distance = to_target.length();
        if distance > self.detection_range {
            return false;
        }

        let bearing = bearing_degrees(observer.forward, to_target);
        if bearing > self.half_cone {
            return false;
        }

        let blocked = obstruction.is_obstructed(observer.position, target);
        trace!(distance, bearing, blocked, "vision check");
        !blocked
    }

    /// Whether any dead body lies within `radius` of the observer.
    #[must_use]
    pub fn scan_for_bodies(&self, observer: Vec3, radius: f32, bodies: &BodyRegistry) -> bool {
        bodies.any_within(observer, radius)
    }
}

/// Per-agent queue of pushed sounds.
#[derive(Debug, Clone)]
pub struct HearingInbox {
    sender: Sender<SoundEvent>,
    receiver: Receiver<SoundEvent>,
}

impl Default for HearingInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl HearingInbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Handle collaborators use to push sounds.
    #[must_use]
    pub fn sender(&self) -> Sender<SoundEvent> {
        self.sender.clone()
    }

    /// Pushes a sound directly.
    pub fn push(&self, sound: SoundEvent) {
        // The inbox owns a receiver, so the channel cannot be disconnected.
        let _ = self.sender.send(sound);
    }

    /// Number of queued sounds.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Drains the inbox and returns the loudest sound at or above `threshold`.
    ///
    /// Ties keep the earliest sound.
    pub fn drain_loudest(&self, threshold: f32) -> Option<SoundEvent> {
        let mut loudest: Option<SoundEvent> = None;
        while let Ok(sound) = self.receiver.try_recv() {
            if sound.intensity < threshold {
                continue;
            }
            if loudest.map_or(true, |l| sound.intensity > l.intensity) {
                loudest = Some(sound);
            }
        }
        loudest
    }

    /// Drops everything queued.
    pub fn clear(&self) {
        while self.receiver.try_recv().is_ok() {}
    }
}
