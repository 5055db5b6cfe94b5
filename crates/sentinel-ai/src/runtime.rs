//! Mutable per-agent state.

use crate::alarm::EscalationCounters;
use crate::states::BehaviorTag;
use crate::task::TaskSlot;
use glam::Vec3;
use sentinel_common::EntityId;

/// Everything an agent mutates while running.
///
/// Created at spawn with the Spawn tag and dropped with the agent.
#[derive(Debug)]
pub struct AgentRuntime {
    /// Tag of the active state
    pub behavior: BehaviorTag,
    /// Last place the player was seen, heard or hit us from
    pub last_known_position: Option<Vec3>,
    /// Escalation counters
    pub counters: EscalationCounters,
    /// The single background-task slot
    pub tasks: TaskSlot,
    /// Patrol resume point
    pub patrol_index: usize,
    /// Whether perception checks run
    pub detector_enabled: bool,
    /// Guard post
    pub post: Vec3,
    /// Cast progress while channeling a signal
    pub cast_progress: Option<f32>,
    /// A body in scan range was already acted on
    pub body_reported: bool,
    /// Source of waypoint randomness
    pub rng: fastrand::Rng,
}

impl AgentRuntime {
    /// Creates the runtime of a freshly spawned agent.
    #[must_use]
    pub fn new(id: EntityId, post: Vec3) -> Self {
        Self {
            behavior: BehaviorTag::Spawn,
            last_known_position: None,
            counters: EscalationCounters::default(),
            tasks: TaskSlot::new(),
            patrol_index: 0,
            detector_enabled: true,
            post,
            cast_progress: None,
            body_reported: false,
            rng: fastrand::Rng::with_seed(id.raw()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_runtime() {
        let runtime = AgentRuntime::new(EntityId::from_raw(7), Vec3::ONE);
        assert_eq!(runtime.behavior, BehaviorTag::Spawn);
        assert!(runtime.tasks.is_idle());
        assert!(runtime.detector_enabled);
        assert!(!runtime.body_reported);
        assert_eq!(runtime.counters, EscalationCounters::default());
    }

    #[test]
    fn test_rng_seeded_from_id() {
        let mut a = AgentRuntime::new(EntityId::from_raw(42), Vec3::ZERO);
        let mut b = AgentRuntime::new(EntityId::from_raw(42), Vec3::ZERO);
        assert_eq!(a.rng.u32(..), b.rng.u32(..));
    }
}
