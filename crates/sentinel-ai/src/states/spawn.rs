use super::{Behavior, BehaviorTag, Transition};
use crate::context::AgentContext;
use crate::task::{BackgroundTask, Countdown, TaskStatus, TaskTicket};
use tracing::warn;

/// Settling in after spawn.
///
/// Skips one tick so the navigator can settle, waits the spawn delay, then
/// takes up duty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spawn {
    start_waypoint: Option<usize>,
    ticket: Option<TaskTicket>,
}

impl Spawn {
    /// Spawn that patrols from the first waypoint.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start_waypoint: None,
            ticket: None,
        }
    }

    /// Spawn that patrols from a given waypoint.
    #[must_use]
    pub const fn at_waypoint(index: usize) -> Self {
        Self {
            start_waypoint: Some(index),
            ticket: None,
        }
    }
}

impl Behavior for Spawn {
    fn tag(&self) -> BehaviorTag {
        BehaviorTag::Spawn
    }

    fn enter(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        if let Some(index) = self.start_waypoint {
            ctx.runtime.patrol_index = index;
        }
        let settle = Countdown::new(ctx.config.spawn_delay).deferred(1);
        match ctx.runtime.tasks.start(BackgroundTask::Countdown(settle)) {
            Ok(ticket) => self.ticket = Some(ticket),
            Err(err) => warn!(agent = %ctx.id, %err, "spawn delay not started"),
        }
        None
    }

    fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        let Some(ticket) = self.ticket else {
            return Some(ctx.duty_state());
        };
        let status = match ctx.runtime.tasks.get_mut(ticket) {
            Some(BackgroundTask::Countdown(timer)) => timer.step(ctx.dt),
            _ => TaskStatus::Finished,
        };
        match status {
            TaskStatus::Running => None,
            TaskStatus::Finished => {
                ctx.runtime.tasks.finish(ticket);
                self.ticket = None;
                Some(ctx.duty_state())
            },
        }
    }

    fn exit(&mut self, ctx: &mut AgentContext<'_, '_>) {
        if self.ticket.take().is_some() {
            ctx.runtime.tasks.cancel();
        }
    }
}
