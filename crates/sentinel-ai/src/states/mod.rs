//! Behavior states.
//!
//! A closed set of variants dispatched through one owning slot in the
//! [`StateMachine`](crate::machine::StateMachine). Every variant implements
//! the same Enter/Execute/Exit contract over a shared
//! [`AgentContext`]. Enter and Execute may request a transition by returning
//! the next state; Exit never can.

mod alarm;
mod alert;
mod attack;
mod combat;
mod guard;
mod patrol;
mod spawn;

pub use alarm::Alarm;
pub use alert::Alert;
pub use attack::Attack;
pub use combat::Combat;
pub use guard::Guard;
pub use patrol::Patrol;
pub use spawn::Spawn;

use crate::context::AgentContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested next state, if any.
pub type Transition = Option<BehaviorState>;

/// Tag of a behavior state, exposed to animation and audio gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorTag {
    /// Settling in after spawn
    Spawn,
    /// Walking a route
    Patrol,
    /// Holding a post
    Guard,
    /// Investigating a location
    Alert,
    /// Raising the alarm
    Alarm,
    /// Engaging the player
    Combat,
    /// Performing one attack
    Attack,
    /// Terminal
    Death,
}

impl BehaviorTag {
    /// Whether the state is absorbing.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Death)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Patrol => "patrol",
            Self::Guard => "guard",
            Self::Alert => "alert",
            Self::Alarm => "alarm",
            Self::Combat => "combat",
            Self::Attack => "attack",
            Self::Death => "death",
        }
    }
}

impl fmt::Display for BehaviorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The Enter/Execute/Exit contract.
pub trait Behavior {
    /// Tag of this state.
    fn tag(&self) -> BehaviorTag;

    /// Called once when the state becomes active.
    fn enter(&mut self, _ctx: &mut AgentContext<'_, '_>) -> Transition {
        None
    }

    /// Called once per tick while active.
    fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition;

    /// Called once when the state is replaced.
    ///
    /// Must cancel any background task the state owns before returning.
    fn exit(&mut self, _ctx: &mut AgentContext<'_, '_>) {}
}

/// Terminal state. Death handling lives with the health collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Death;

impl Behavior for Death {
    fn tag(&self) -> BehaviorTag {
        BehaviorTag::Death
    }

    fn execute(&mut self, _ctx: &mut AgentContext<'_, '_>) -> Transition {
        None
    }
}

/// One of the eight behavior states.
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorState {
    /// Spawn
    Spawn(Spawn),
    /// Patrol
    Patrol(Patrol),
    /// Guard
    Guard(Guard),
    /// Alert
    Alert(Alert),
    /// Alarm
    Alarm(Alarm),
    /// Combat
    Combat(Combat),
    /// Attack
    Attack(Attack),
    /// Death
    Death(Death),
}

impl BehaviorState {
    /// Tag of the wrapped state.
    #[must_use]
    pub fn tag(&self) -> BehaviorTag {
        self.as_behavior().tag()
    }

    fn as_behavior(&self) -> &dyn Behavior {
        match self {
            Self::Spawn(s) => s,
            Self::Patrol(s) => s,
            Self::Guard(s) => s,
            Self::Alert(s) => s,
            Self::Alarm(s) => s,
            Self::Combat(s) => s,
            Self::Attack(s) => s,
            Self::Death(s) => s,
        }
    }

    fn as_behavior_mut(&mut self) -> &mut dyn Behavior {
        match self {
            Self::Spawn(s) => s,
            Self::Patrol(s) => s,
            Self::Guard(s) => s,
            Self::Alert(s) => s,
            Self::Alarm(s) => s,
            Self::Combat(s) => s,
            Self::Attack(s) => s,
            Self::Death(s) => s,
        }
    }

    /// Runs Enter.
    pub fn enter(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        self.as_behavior_mut().enter(ctx)
    }

    /// Runs Execute.
    pub fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        self.as_behavior_mut().execute(ctx)
    }

    /// Runs Exit.
    pub fn exit(&mut self, ctx: &mut AgentContext<'_, '_>) {
        self.as_behavior_mut().exit(ctx);
    }
}

#[cfg(test)]
pub(crate) mod rig {
    //! Owns one of everything an [`AgentContext`] borrows.

    use crate::alarm::AlarmCoordinator;
    use crate::config::AgentConfig;
    use crate::context::AgentContext;
    use crate::events::{BehaviorEvent, EventBus, EventPublisher};
    use crate::mock::{MockAnimator, MockNavigator, MockWeapon, RecordingSignalSink};
    use crate::perception::PerceptionService;
    use crate::ports::AgentPorts;
    use crate::route::PatrolRoute;
    use crate::runtime::AgentRuntime;
    use crate::world::{BodyRegistry, Surroundings, WallSet};
    use glam::Vec3;
    use sentinel_common::EntityId;

    pub struct Rig {
        pub id: EntityId,
        pub config: AgentConfig,
        pub route: PatrolRoute,
        pub perception: PerceptionService,
        pub runtime: AgentRuntime,
        pub nav: MockNavigator,
        pub anim: MockAnimator,
        pub weapon: MockWeapon,
        pub signals: RecordingSignalSink,
        pub alarms: AlarmCoordinator,
        pub bodies: BodyRegistry,
        pub walls: WallSet,
        pub target: Option<Vec3>,
        pub alive: bool,
        pub bus: EventBus,
        pub events: EventPublisher,
    }

    impl Rig {
        pub fn new(config: AgentConfig) -> Self {
            let id = EntityId::new();
            let bus = EventBus::new(256);
            let events = bus.publisher();
            Self {
                id,
                perception: PerceptionService::from_config(&config),
                config,
                route: PatrolRoute::default(),
                runtime: AgentRuntime::new(id, Vec3::ZERO),
                nav: MockNavigator::new(Vec3::ZERO),
                anim: MockAnimator::new(),
                weapon: MockWeapon::new(),
                signals: RecordingSignalSink::new(),
                alarms: AlarmCoordinator::new(),
                bodies: BodyRegistry::new(),
                walls: WallSet::new(),
                target: None,
                alive: true,
                bus,
                events,
            }
        }

        pub fn run<R>(&mut self, dt: f32, f: impl FnOnce(&mut AgentContext<'_, '_>) -> R) -> R {
            let pose = self.nav.pose();
            let mut ports = AgentPorts::new(
                &mut self.nav,
                &mut self.anim,
                &mut self.weapon,
                &mut self.signals,
            );
            let mut world = Surroundings::new(pose, &self.walls, &self.bodies, &mut self.alarms)
                .with_target(self.target)
                .with_alive(self.alive);
            let mut ctx = AgentContext {
                id: self.id,
                config: &self.config,
                route: &self.route,
                perception: &self.perception,
                runtime: &mut self.runtime,
                ports: &mut ports,
                world: &mut world,
                events: &self.events,
                dt,
            };
            f(&mut ctx)
        }

        pub fn events(&self) -> Vec<BehaviorEvent> {
            self.bus.drain()
        }
    }
}
