use super::{Behavior, BehaviorState, BehaviorTag, Combat, Transition};
use crate::context::AgentContext;
use tracing::debug;

/// One attack followed by a cooldown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Attack {
    elapsed: f32,
}

impl Attack {
    /// Creates the state.
    #[must_use]
    pub const fn new() -> Self {
        Self { elapsed: 0.0 }
    }

    /// Time since the attack.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Behavior for Attack {
    fn tag(&self) -> BehaviorTag {
        BehaviorTag::Attack
    }

    fn enter(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        ctx.ports.navigator.stop();
        if let Some(target) = ctx.world.target {
            ctx.ports.navigator.face(target);
            ctx.ports.weapon.perform_attack(target);
            debug!(agent = %ctx.id, ?target, "attack");
        }
        ctx.ports.anim.play_attack();
        self.elapsed = 0.0;
        None
    }

    fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        self.elapsed += ctx.dt;
        // Strictly greater: exactly one cooldown is not enough.
        if self.elapsed > ctx.config.attack_cooldown {
            Some(BehaviorState::Combat(Combat::new()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::states::rig::Rig;
    use glam::Vec3;

    #[test]
    fn test_enter_attacks_once() {
        let mut rig = Rig::new(AgentConfig::default());
        let target = Vec3::new(0.0, 0.0, 1.0);
        rig.target = Some(target);
        let mut attack = Attack::new();
        rig.run(0.0, |ctx| attack.enter(ctx));
        assert_eq!(rig.nav.stop_calls, 1);
        assert_eq!(rig.nav.faced, Some(target));
        assert_eq!(rig.weapon.attacks, vec![target]);
        assert_eq!(rig.anim.attacks, 1);
    }

    #[test]
    fn test_scenario_c_cooldown_is_strict() {
        let mut rig = Rig::new(AgentConfig::default().with_attack(2.0, 1.5));
        let mut attack = Attack::new();
        rig.run(0.0, |ctx| attack.enter(ctx));

        assert!(rig.run(1.0, |ctx| attack.execute(ctx)).is_none());
        assert!(rig.run(0.49, |ctx| attack.execute(ctx)).is_none());
        let next = rig.run(0.02, |ctx| attack.execute(ctx));
        assert_eq!(next.map(|s| s.tag()), Some(BehaviorTag::Combat));
    }

    #[test]
    fn test_exactly_cooldown_does_not_transition() {
        let mut rig = Rig::new(AgentConfig::default().with_attack(2.0, 1.5));
        let mut attack = Attack::new();
        rig.run(0.0, |ctx| attack.enter(ctx));
        assert!(rig.run(1.5, |ctx| attack.execute(ctx)).is_none());
    }
}
