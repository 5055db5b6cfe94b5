use super::{Alert, Attack, Behavior, BehaviorState, BehaviorTag, Patrol, Transition};
use crate::context::AgentContext;
use tracing::trace;

/// Engaging the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Combat;

impl Combat {
    /// Creates the state.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Behavior for Combat {
    fn tag(&self) -> BehaviorTag {
        BehaviorTag::Combat
    }

    fn enter(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        ctx.ports.navigator.resume();
        ctx.ports
            .navigator
            .set_stopping_distance(ctx.config.stopping_distance);
        ctx.ports.set_speed(ctx.config.chase_speed);
        None
    }

    fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        let Some(target) = ctx.world.target else {
            return Some(BehaviorState::Patrol(Patrol::new()));
        };
        let distance = target.distance(ctx.position());
        let sighted = ctx.can_see_target();

        if !sighted && distance > ctx.config.lock_on_range {
            trace!(agent = %ctx.id, distance, "lost the player");
            ctx.runtime.last_known_position = Some(target);
            return Some(BehaviorState::Alert(Alert::new(target)));
        }

        ctx.runtime.last_known_position = Some(target);
        let speed = if distance <= ctx.config.close_range {
            ctx.config.combat_walk_speed
        } else {
            ctx.config.chase_speed
        };
        ctx.ports.set_speed(speed);

        if distance <= ctx.config.attack_range {
            return Some(BehaviorState::Attack(Attack::new()));
        }
        ctx.ports.navigator.move_to(target);
        None
    }
}
