use super::{Behavior, BehaviorTag, Transition};
use crate::context::AgentContext;
use crate::task::{BackgroundTask, PatrolLoop, TaskTicket};
use tracing::warn;

/// Walking the patrol route.
///
/// The waypoint loop resumes at the runtime's patrol index, so returning
/// from Alert continues where the agent left off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patrol {
    ticket: Option<TaskTicket>,
}

impl Patrol {
    /// Creates the state.
    #[must_use]
    pub const fn new() -> Self {
        Self { ticket: None }
    }
}

impl Behavior for Patrol {
    fn tag(&self) -> BehaviorTag {
        BehaviorTag::Patrol
    }

    fn enter(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        ctx.ports.set_speed(ctx.config.patrol_speed);
        ctx.ports
            .navigator
            .set_stopping_distance(ctx.config.stopping_distance);
        ctx.ports.navigator.resume();

        let walk = PatrolLoop::starting_at(ctx.runtime.patrol_index);
        match ctx.runtime.tasks.start(BackgroundTask::Patrol(walk)) {
            Ok(ticket) => self.ticket = Some(ticket),
            Err(err) => warn!(agent = %ctx.id, %err, "patrol loop not started"),
        }
        None
    }

    fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        if let Some(next) = ctx.sighting_transition() {
            return Some(next);
        }

        let ticket = self.ticket?;
        let runtime = &mut *ctx.runtime;
        if let Some(BackgroundTask::Patrol(walk)) = runtime.tasks.get_mut(ticket) {
            runtime.patrol_index = walk.step(
                ctx.dt,
                ctx.route,
                &mut *ctx.ports.navigator,
                &mut *ctx.ports.anim,
                &mut runtime.rng,
            );
        }
        None
    }

    fn exit(&mut self, ctx: &mut AgentContext<'_, '_>) {
        if self.ticket.take().is_some() {
            ctx.runtime.tasks.cancel();
        }
    }
}
