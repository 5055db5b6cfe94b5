use super::{Behavior, BehaviorTag, Transition};
use crate::context::AgentContext;

/// Holding a fixed post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard {
    posted: bool,
}

impl Guard {
    /// Creates the state.
    #[must_use]
    pub const fn new() -> Self {
        Self { posted: false }
    }
}

impl Behavior for Guard {
    fn tag(&self) -> BehaviorTag {
        BehaviorTag::Guard
    }

    fn enter(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        self.posted = false;
        ctx.ports.set_speed(ctx.config.patrol_speed);
        ctx.ports
            .navigator
            .set_stopping_distance(ctx.config.stopping_distance);
        ctx.ports.navigator.resume();
        ctx.ports.navigator.move_to(ctx.runtime.post);
        None
    }

    fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        if let Some(next) = ctx.sighting_transition() {
            return Some(next);
        }
        if !self.posted && ctx.ports.navigator.has_reached_destination() {
            ctx.ports.navigator.stop();
            ctx.ports.anim.set_speed(0.0);
            self.posted = true;
        }
        None
    }

    fn exit(&mut self, ctx: &mut AgentContext<'_, '_>) {
        ctx.ports.navigator.resume();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::states::rig::Rig;
    use glam::Vec3;

    #[test]
    fn test_walks_to_post_and_stops() {
        let mut rig = Rig::new(AgentConfig::default());
        rig.runtime.post = Vec3::new(3.0, 0.0, 0.0);
        let mut guard = Guard::new();
        rig.run(0.0, |ctx| guard.enter(ctx));
        assert_eq!(rig.nav.last_move(), Some(Vec3::new(3.0, 0.0, 0.0)));

        rig.run(0.1, |ctx| guard.execute(ctx));
        assert_eq!(rig.nav.stop_calls, 0);

        rig.nav.advance(10.0);
        rig.run(0.1, |ctx| guard.execute(ctx));
        assert_eq!(rig.nav.stop_calls, 1);
        rig.run(0.1, |ctx| guard.execute(ctx));
        assert_eq!(rig.nav.stop_calls, 1);
    }

    #[test]
    fn test_sighting_branches_like_patrol() {
        let mut rig = Rig::new(AgentConfig::default());
        let mut guard = Guard::new();
        rig.run(0.0, |ctx| guard.enter(ctx));

        rig.target = Some(Vec3::new(0.0, 0.0, 12.0));
        let next = rig.run(0.1, |ctx| guard.execute(ctx));
        assert_eq!(next.map(|s| s.tag()), Some(BehaviorTag::Alert));

        rig.target = Some(Vec3::new(0.0, 0.0, 2.0));
        let next = rig.run(0.1, |ctx| guard.execute(ctx));
        assert_eq!(next.map(|s| s.tag()), Some(BehaviorTag::Combat));
    }

    #[test]
    fn test_exit_resumes_movement() {
        let mut rig = Rig::new(AgentConfig::default());
        let mut guard = Guard::new();
        rig.run(0.0, |ctx| guard.enter(ctx));
        rig.run(0.1, |ctx| guard.execute(ctx));
        assert!(rig.nav.stopped);
        rig.run(0.0, |ctx| guard.exit(ctx));
        assert!(!rig.nav.stopped);
    }
}
