//! The behavior state machine.
//!
//! Owns the single active state and implements the transition protocol:
//! Exit the old state (which cancels its background task), replace it, then
//! Enter the new one. Enter may itself request a transition; chains are
//! followed up to [`MAX_CHAIN`] hops per call.

use crate::context::AgentContext;
use crate::events::BehaviorEvent;
use crate::states::{BehaviorState, BehaviorTag, Spawn, Transition};
use tracing::{debug, error};

/// Maximum transitions followed in a single call.
pub const MAX_CHAIN: usize = 8;

/// Single-slot state machine.
#[derive(Debug)]
pub struct StateMachine {
    current: BehaviorState,
    started: bool,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(BehaviorState::Spawn(Spawn::new()))
    }
}

impl StateMachine {
    /// Creates a machine; `initial` is entered on the first update.
    #[must_use]
    pub const fn new(initial: BehaviorState) -> Self {
        Self {
            current: initial,
            started: false,
        }
    }

    /// The active state.
    #[must_use]
    pub const fn current(&self) -> &BehaviorState {
        &self.current
    }

    /// Tag of the active state.
    #[must_use]
    pub fn tag(&self) -> BehaviorTag {
        self.current.tag()
    }

    /// Whether the initial state has been entered.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Enters the initial state if that has not happened yet.
    pub fn start(&mut self, ctx: &mut AgentContext<'_, '_>) {
        if self.started {
            return;
        }
        self.started = true;
        ctx.runtime.behavior = self.current.tag();
        debug!(agent = %ctx.id, state = %self.current.tag(), "entering initial state");
        let next = self.current.enter(ctx);
        self.follow(next, ctx);
    }

    /// One tick: Execute the active state and honor its request.
    pub fn update(&mut self, ctx: &mut AgentContext<'_, '_>) {
        self.start(ctx);
        let next = self.current.execute(ctx);
        self.follow(next, ctx);
    }

    /// Requests a transition from outside the active state.
    ///
    /// Ignored once the machine is in Death.
    pub fn transition_to(&mut self, next: BehaviorState, ctx: &mut AgentContext<'_, '_>) {
        self.follow(Some(next), ctx);
    }

    fn follow(&mut self, mut next: Transition, ctx: &mut AgentContext<'_, '_>) {
        let mut hops = 0;
        while let Some(state) = next.take() {
            if self.current.tag().is_terminal() {
                debug!(agent = %ctx.id, requested = %state.tag(), "transition out of death ignored");
                return;
            }
            if hops == MAX_CHAIN {
                error!(
                    agent = %ctx.id,
                    current = %self.current.tag(),
                    requested = %state.tag(),
                    "transition chain too long; staying put"
                );
                return;
            }
            hops += 1;
            next = self.switch(state, ctx);
        }
    }

    fn switch(&mut self, state: BehaviorState, ctx: &mut AgentContext<'_, '_>) -> Transition {
        let from = self.current.tag();
        if self.started {
            self.current.exit(ctx);
        }
        ctx.runtime.tasks.reap_leftover();

        self.current = state;
        self.started = true;
        let to = self.current.tag();
        ctx.runtime.behavior = to;
        debug!(agent = %ctx.id, %from, %to, "behavior transition");
        ctx.publish(BehaviorEvent::StateChanged {
            agent: ctx.id,
            from,
            to,
        });
        self.current.enter(ctx)
    }
}
