//! Per-call view handed to behavior states.

use crate::config::{AgentConfig, AlarmType, InitialBehavior};
use crate::events::{BehaviorEvent, EventPublisher};
use crate::perception::{PerceptionResult, PerceptionService};
use crate::ports::AgentPorts;
use crate::route::PatrolRoute;
use crate::runtime::AgentRuntime;
use crate::states::{Alarm, Alert, BehaviorState, Combat, Guard, Patrol, Transition};
use crate::world::Surroundings;
use glam::Vec3;
use sentinel_common::EntityId;
use tracing::trace;

/// Shared context of one agent for one call.
///
/// States borrow disjoint fields of this struct, so they reach into it
/// directly rather than through accessor methods when they need two
/// mutable parts at once.
pub struct AgentContext<'a, 'w> {
    /// Agent id
    pub id: EntityId,
    /// Archetype parameters
    pub config: &'a AgentConfig,
    /// Patrol route
    pub route: &'a PatrolRoute,
    /// Vision and body scan
    pub perception: &'a PerceptionService,
    /// Mutable agent state
    pub runtime: &'a mut AgentRuntime,
    /// Capability ports
    pub ports: &'a mut AgentPorts<'w>,
    /// World view
    pub world: &'a mut Surroundings<'w>,
    /// Event sink
    pub events: &'a EventPublisher,
    /// Seconds since the last tick
    pub dt: f32,
}

impl AgentContext<'_, '_> {
    /// Agent position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world.pose.position
    }

    /// Whether the player is in sight this tick.
    #[must_use]
    pub fn can_see_target(&self) -> bool {
        self.perception
            .can_see_target(&self.world.pose, self.world.target, self.world.obstruction)
    }

    /// Distance to the player, if there is one.
    #[must_use]
    pub fn target_distance(&self) -> Option<f32> {
        self.world
            .target
            .map(|target| target.distance(self.position()))
    }

    /// Whether a dead body lies within scan radius.
    #[must_use]
    pub fn body_in_range(&self) -> bool {
        self.perception.scan_for_bodies(
            self.position(),
            self.config.body_scan_radius,
            self.world.bodies,
        )
    }

    /// Sight and body scan in one snapshot; sounds are handled by the agent.
    #[must_use]
    pub fn perceive(&self) -> PerceptionResult {
        PerceptionResult {
            target_visible: self.can_see_target(),
            body_found: self.body_in_range(),
            sound: None,
        }
    }

    /// Liveness reported by the health collaborator.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.world.alive
    }

    /// Publishes a behavior event.
    pub fn publish(&self, event: BehaviorEvent) {
        self.events.publish(event);
    }

    /// The agent's standing duty.
    #[must_use]
    pub fn duty_state(&self) -> BehaviorState {
        match self.config.initial_behavior {
            InitialBehavior::Guard => BehaviorState::Guard(Guard::new()),
            InitialBehavior::Patrol => BehaviorState::Patrol(Patrol::new()),
        }
    }

    /// Alarm variant matching the configured alarm type.
    #[must_use]
    pub fn escalation_state(&self) -> BehaviorState {
        match self.config.alarm_type {
            AlarmType::SignalFromPosition => {
                BehaviorState::Alarm(Alarm::with_signal(self.config.signal))
            },
            AlarmType::None | AlarmType::GoToPanel => BehaviorState::Alarm(Alarm::new()),
        }
    }

    /// Whether the configured escalation path has budget left.
    ///
    /// Only the caps are consulted; a missing panel or signal is left for
    /// Alarm to report.
    #[must_use]
    pub fn escalation_budget_left(&self) -> bool {
        let counters = &self.runtime.counters;
        match self.config.alarm_type {
            AlarmType::None => true,
            AlarmType::GoToPanel => counters.panel_available(self.config),
            AlarmType::SignalFromPosition => self
                .config
                .signal
                .map_or(true, |kind| counters.signal_available(kind, self.config)),
        }
    }

    /// Sight check shared by Patrol and Guard.
    ///
    /// A sighting at or inside combat-entry range goes straight to Combat;
    /// farther away the agent records the position and goes to Alert.
    pub fn sighting_transition(&mut self) -> Transition {
        if !self.runtime.detector_enabled || !self.can_see_target() {
            return None;
        }
        let target = self.world.target?;
        let distance = target.distance(self.position());
        trace!(agent = %self.id, distance, "player sighted");
        if distance <= self.config.combat_entry_range {
            Some(BehaviorState::Combat(Combat::new()))
        } else {
            self.runtime.last_known_position = Some(target);
            Some(BehaviorState::Alert(Alert::new(target)))
        }
    }
}
