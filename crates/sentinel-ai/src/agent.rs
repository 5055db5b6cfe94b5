//! Per-agent composition root.
//!
//! An [`Agent`] owns its config, route, runtime, hearing inbox and state
//! machine. Everything shared (ports, obstruction, bodies, panels) is lent
//! to it per call.

use crate::alarm::EscalationCounters;
use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::events::EventPublisher;
use crate::machine::StateMachine;
use crate::perception::{HearingInbox, PerceptionService, SoundEvent};
use crate::ports::AgentPorts;
use crate::route::PatrolRoute;
use crate::runtime::AgentRuntime;
use crate::states::{Alert, BehaviorState, BehaviorTag, Combat, Death, Spawn};
use crate::world::Surroundings;
use crossbeam_channel::Sender;
use glam::Vec3;
use sentinel_common::{EntityId, SentinelResult};
use tracing::{debug, info};

/// An NPC driven by the behavior engine.
#[derive(Debug)]
pub struct Agent {
    id: EntityId,
    config: AgentConfig,
    route: PatrolRoute,
    perception: PerceptionService,
    runtime: AgentRuntime,
    machine: StateMachine,
    hearing: HearingInbox,
    events: EventPublisher,
}

impl Agent {
    /// Creates an agent in the Spawn state.
    pub fn new(config: AgentConfig, route: PatrolRoute) -> SentinelResult<Self> {
        config.validate()?;
        route.validate()?;
        let id = EntityId::new();
        Ok(Self {
            id,
            perception: PerceptionService::from_config(&config),
            config,
            route,
            runtime: AgentRuntime::new(id, Vec3::ZERO),
            machine: StateMachine::default(),
            hearing: HearingInbox::new(),
            events: EventPublisher::disabled(),
        })
    }

    /// Uses a specific id; reseeds the agent's randomness from it.
    #[must_use]
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self.runtime.rng = fastrand::Rng::with_seed(id.raw());
        self
    }

    /// Sets the guard post.
    #[must_use]
    pub fn with_post(mut self, post: Vec3) -> Self {
        self.runtime.post = post;
        self
    }

    /// Starts patrolling from a given waypoint after spawn.
    #[must_use]
    pub fn with_start_waypoint(mut self, index: usize) -> Self {
        if !self.machine.is_started() {
            self.machine = StateMachine::new(BehaviorState::Spawn(Spawn::at_waypoint(index)));
        }
        self
    }

    /// Publishes behavior events through `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    // === Accessors ===

    /// Agent id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Archetype parameters.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Current behavior tag.
    #[must_use]
    pub const fn behavior(&self) -> BehaviorTag {
        self.runtime.behavior
    }

    /// Cast progress in 0..=1 while channeling a signal.
    #[must_use]
    pub const fn cast_progress(&self) -> Option<f32> {
        self.runtime.cast_progress
    }

    /// Escalation counters (read-only).
    #[must_use]
    pub const fn counters(&self) -> &EscalationCounters {
        &self.runtime.counters
    }

    /// Last known player position.
    #[must_use]
    pub const fn last_known_position(&self) -> Option<Vec3> {
        self.runtime.last_known_position
    }

    /// Read access to the runtime.
    #[must_use]
    pub const fn runtime(&self) -> &AgentRuntime {
        &self.runtime
    }

    /// Handle for pushing sounds to this agent.
    #[must_use]
    pub fn hearing(&self) -> Sender<SoundEvent> {
        self.hearing.sender()
    }

    /// Queues a sound for the next update.
    pub fn hear(&self, sound: SoundEvent) {
        self.hearing.push(sound);
    }

    /// Turns perception checks on or off.
    pub fn set_detector_enabled(&mut self, enabled: bool) {
        debug!(agent = %self.id, enabled, "detector toggled");
        self.runtime.detector_enabled = enabled;
    }

    // === Driving ===

    /// Advances the agent by one tick.
    pub fn update<'w>(
        &mut self,
        dt: f32,
        ports: &mut AgentPorts<'w>,
        world: &mut Surroundings<'w>,
    ) {
        let heard = self.hearing.drain_loudest(self.config.hearing_threshold);
        let mut ctx = AgentContext {
            id: self.id,
            config: &self.config,
            route: &self.route,
            perception: &self.perception,
            runtime: &mut self.runtime,
            ports,
            world,
            events: &self.events,
            dt,
        };
        self.machine.start(&mut ctx);

        if let Some(sound) = heard {
            if ctx.runtime.detector_enabled && self.machine.tag() == BehaviorTag::Patrol {
                debug!(agent = %self.id, origin = ?sound.origin, "heard a noise");
                ctx.runtime.last_known_position = Some(sound.origin);
                self.machine
                    .transition_to(BehaviorState::Alert(Alert::new(sound.origin)), &mut ctx);
            }
        }

        self.machine.update(&mut ctx);
    }

    /// Reacts to damage from `attacker`.
    ///
    /// Only Spawn, Patrol, Guard and Alert react; every other state is
    /// already engaged or escalating.
    pub fn on_damaged<'w>(
        &mut self,
        attacker: Vec3,
        ports: &mut AgentPorts<'w>,
        world: &mut Surroundings<'w>,
    ) {
        let reacts = matches!(
            self.machine.tag(),
            BehaviorTag::Spawn | BehaviorTag::Patrol | BehaviorTag::Guard | BehaviorTag::Alert
        );
        if !reacts {
            return;
        }
        let next = if self.config.damage_triggers_combat {
            BehaviorState::Combat(Combat::new())
        } else {
            BehaviorState::Alert(Alert::new(attacker))
        };
        let mut ctx = AgentContext {
            id: self.id,
            config: &self.config,
            route: &self.route,
            perception: &self.perception,
            runtime: &mut self.runtime,
            ports,
            world,
            events: &self.events,
            dt: 0.0,
        };
        debug!(agent = %self.id, ?attacker, "damaged");
        ctx.runtime.last_known_position = Some(attacker);
        self.machine.transition_to(next, &mut ctx);
    }

    /// Force-transitions to Death from any state.
    pub fn on_died<'w>(&mut self, ports: &mut AgentPorts<'w>, world: &mut Surroundings<'w>) {
        if self.machine.tag().is_terminal() {
            return;
        }
        ports.anim.play_death();
        let mut ctx = AgentContext {
            id: self.id,
            config: &self.config,
            route: &self.route,
            perception: &self.perception,
            runtime: &mut self.runtime,
            ports,
            world,
            events: &self.events,
            dt: 0.0,
        };
        info!(agent = %self.id, "agent died");
        self.machine.transition_to(BehaviorState::Death(Death), &mut ctx);
        self.hearing.clear();
    }
}
