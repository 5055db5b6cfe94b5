use super::{Behavior, BehaviorState, BehaviorTag, Combat, Transition};
use crate::context::AgentContext;
use crate::task::{BackgroundTask, Investigation, TaskStatus, TaskTicket};
use glam::Vec3;
use tracing::{debug, info, warn};

/// Investigating a location.
///
/// Walks to a navigable point near the location (or stays put if there is
/// none), looks around for the investigate duration, then either escalates
/// or returns to duty. Sight of the player or a dead body interrupts at any
/// point while the detector is on. A body is acted on once while it stays
/// in scan range, and not at all once the escalation caps are spent.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    location: Vec3,
    in_place: bool,
    ticket: Option<TaskTicket>,
}

impl Alert {
    /// Creates the state for a location.
    #[must_use]
    pub const fn new(location: Vec3) -> Self {
        Self {
            location,
            in_place: false,
            ticket: None,
        }
    }

    /// Location being investigated.
    #[must_use]
    pub const fn location(&self) -> Vec3 {
        self.location
    }

    fn advance_investigation(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        let ticket = self.ticket?;
        let status = match ctx.runtime.tasks.get_mut(ticket) {
            Some(BackgroundTask::Investigation(look)) => look.step(ctx.dt, &mut *ctx.ports.anim),
            _ => return None,
        };
        if status == TaskStatus::Running {
            return None;
        }
        ctx.runtime.tasks.finish(ticket);
        self.ticket = None;

        let position = ctx.position();
        if ctx
            .world
            .alarms
            .should_escalate(ctx.config, &ctx.runtime.counters, position)
        {
            info!(agent = %ctx.id, location = ?self.location, "investigation escalates");
            ctx.runtime.last_known_position = Some(self.location);
            Some(ctx.escalation_state())
        } else {
            debug!(agent = %ctx.id, "investigation found nothing");
            Some(ctx.duty_state())
        }
    }
}

impl Behavior for Alert {
    fn tag(&self) -> BehaviorTag {
        BehaviorTag::Alert
    }

    fn enter(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        ctx.ports.set_speed(ctx.config.alert_speed);
        ctx.ports.navigator.resume();

        let reachable = ctx
            .ports
            .navigator
            .sample_navigable(self.location, ctx.config.navigable_sample_radius)
            .filter(|point| ctx.ports.navigator.calculate_path(*point).is_usable());

        match reachable {
            Some(point) => {
                ctx.ports
                    .navigator
                    .set_stopping_distance(ctx.config.alert_stopping_distance);
                ctx.ports.navigator.move_to(point);
                self.in_place = false;
            },
            None => {
                warn!(agent = %ctx.id, location = ?self.location, "no path to alert location; investigating in place");
                ctx.ports.navigator.stop();
                self.in_place = true;
            },
        }
        None
    }

    fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        if !ctx.runtime.detector_enabled {
            return self.advance_investigation(ctx);
        }
        let seen = ctx.perceive();
        if seen.target_visible {
            return Some(BehaviorState::Combat(Combat::new()));
        }
        if !seen.body_found {
            ctx.runtime.body_reported = false;
        } else if !ctx.runtime.body_reported && ctx.escalation_budget_left() {
            debug!(agent = %ctx.id, "dead body found");
            ctx.runtime.body_reported = true;
            return Some(ctx.escalation_state());
        }

        if self.ticket.is_none() {
            let settled = self.in_place || ctx.ports.navigator.has_reached_destination();
            if !settled {
                return None;
            }
            let look = Investigation::new(ctx.config.investigate_duration);
            match ctx.runtime.tasks.start(BackgroundTask::Investigation(look)) {
                Ok(ticket) => self.ticket = Some(ticket),
                Err(err) => {
                    warn!(agent = %ctx.id, %err, "investigation not started");
                    return None;
                },
            }
        }
        self.advance_investigation(ctx)
    }

    fn exit(&mut self, ctx: &mut AgentContext<'_, '_>) {
        if self.ticket.take().is_some() {
            ctx.runtime.tasks.cancel();
        }
        ctx.ports
            .navigator
            .set_stopping_distance(ctx.config.stopping_distance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentConfig, AlarmType};
    use crate::states::rig::Rig;
    use sentinel_common::EntityId;

    fn quick_config() -> AgentConfig {
        let mut config = AgentConfig::default();
        config.investigate_duration = 1.0;
        config
    }

    fn run_until_transition(rig: &mut Rig, alert: &mut Alert, dt: f32) -> Option<BehaviorTag> {
        for _ in 0..100 {
            rig.nav.advance(dt);
            if let Some(next) = rig.run(dt, |ctx| alert.execute(ctx)) {
                return Some(next.tag());
            }
        }
        None
    }

    #[test]
    fn test_walks_then_investigates_then_returns_to_duty() {
        let mut rig = Rig::new(quick_config().with_alarm_type(AlarmType::None));
        let mut alert = Alert::new(Vec3::new(4.0, 0.0, 0.0));
        rig.run(0.0, |ctx| alert.enter(ctx));
        assert_eq!(rig.nav.last_move(), Some(Vec3::new(4.0, 0.0, 0.0)));

        let next = run_until_transition(&mut rig, &mut alert, 0.25);
        assert_eq!(next, Some(BehaviorTag::Patrol));
        assert_eq!(rig.anim.look_arounds, 1);
    }

    #[test]
    fn test_unreachable_location_investigates_in_place() {
        let mut rig = Rig::new(quick_config().with_alarm_type(AlarmType::None));
        rig.nav = rig.nav.clone().with_unreachable(true);
        let mut alert = Alert::new(Vec3::new(50.0, 0.0, 0.0));
        rig.run(0.0, |ctx| alert.enter(ctx));
        assert!(rig.nav.move_requests.is_empty());

        rig.run(0.1, |ctx| alert.execute(ctx));
        assert_eq!(rig.anim.look_arounds, 1);
    }

    #[test]
    fn test_escalates_when_panel_in_range() {
        let mut rig = Rig::new(quick_config());
        rig.alarms.register_panel(Vec3::new(10.0, 0.0, 0.0));
        let location = Vec3::new(2.0, 0.0, 0.0);
        let mut alert = Alert::new(location);
        rig.run(0.0, |ctx| alert.enter(ctx));

        let next = run_until_transition(&mut rig, &mut alert, 0.25);
        assert_eq!(next, Some(BehaviorTag::Alarm));
        assert_eq!(rig.runtime.last_known_position, Some(location));
    }

    #[test]
    fn test_sighting_goes_to_combat() {
        let mut rig = Rig::new(quick_config());
        let mut alert = Alert::new(Vec3::new(0.0, 0.0, 4.0));
        rig.run(0.0, |ctx| alert.enter(ctx));
        rig.target = Some(Vec3::new(0.0, 0.0, 12.0));
        let next = rig.run(0.1, |ctx| alert.execute(ctx));
        assert_eq!(next.map(|s| s.tag()), Some(BehaviorTag::Combat));
    }

    #[test]
    fn test_dead_body_goes_to_alarm() {
        let mut rig = Rig::new(quick_config());
        rig.bodies.mark_dead(EntityId::new(), Vec3::new(3.0, 0.0, 0.0));
        let mut alert = Alert::new(Vec3::new(0.0, 0.0, 4.0));
        rig.run(0.0, |ctx| alert.enter(ctx));
        let next = rig.run(0.1, |ctx| alert.execute(ctx));
        assert_eq!(next.map(|s| s.tag()), Some(BehaviorTag::Alarm));
    }

    #[test]
    fn test_body_ignored_when_caps_spent() {
        let mut rig = Rig::new(quick_config().with_caps(0, 1, 1));
        rig.alarms.register_panel(Vec3::new(5.0, 0.0, 0.0));
        rig.bodies.mark_dead(EntityId::new(), Vec3::new(3.0, 0.0, 0.0));
        let mut alert = Alert::new(Vec3::ZERO);
        rig.run(0.0, |ctx| alert.enter(ctx));

        let next = run_until_transition(&mut rig, &mut alert, 0.25);
        assert_eq!(next, Some(BehaviorTag::Patrol));
        assert_eq!(rig.anim.look_arounds, 1);
    }

    #[test]
    fn test_body_acted_on_once_while_in_range() {
        let mut rig = Rig::new(quick_config().with_alarm_type(AlarmType::None));
        rig.bodies.mark_dead(EntityId::new(), Vec3::new(3.0, 0.0, 0.0));
        let mut first = Alert::new(Vec3::ZERO);
        rig.run(0.0, |ctx| first.enter(ctx));
        let next = rig.run(0.1, |ctx| first.execute(ctx));
        assert_eq!(next.map(|s| s.tag()), Some(BehaviorTag::Alarm));
        rig.run(0.0, |ctx| first.exit(ctx));

        let mut second = Alert::new(Vec3::ZERO);
        rig.run(0.0, |ctx| second.enter(ctx));
        assert!(rig.run(0.1, |ctx| second.execute(ctx)).is_none());
        assert!(rig.runtime.body_reported);
    }

    #[test]
    fn test_body_leaving_range_rearms_report() {
        let mut rig = Rig::new(quick_config());
        rig.runtime.body_reported = true;
        let mut alert = Alert::new(Vec3::ZERO);
        rig.run(0.0, |ctx| alert.enter(ctx));
        rig.run(0.1, |ctx| alert.execute(ctx));
        assert!(!rig.runtime.body_reported);
    }

    #[test]
    fn test_detector_disabled_skips_perception() {
        let mut rig = Rig::new(quick_config());
        rig.runtime.detector_enabled = false;
        rig.target = Some(Vec3::new(0.0, 0.0, 3.0));
        let mut alert = Alert::new(Vec3::ZERO);
        rig.run(0.0, |ctx| alert.enter(ctx));
        assert!(rig.run(0.1, |ctx| alert.execute(ctx)).is_none());
        assert!(rig.runtime.tasks.is_idle());
    }

    #[test]
    fn test_exit_cancels_and_resets_stopping_distance() {
        let mut rig = Rig::new(quick_config());
        let mut alert = Alert::new(Vec3::ZERO);
        rig.run(0.0, |ctx| alert.enter(ctx));
        rig.run(0.1, |ctx| alert.execute(ctx));
        assert!(!rig.runtime.tasks.is_idle());
        assert_eq!(rig.nav.stopping_distance, 1.5);

        rig.run(0.0, |ctx| alert.exit(ctx));
        assert!(rig.runtime.tasks.is_idle());
        assert_eq!(rig.nav.stopping_distance, 0.5);
    }
}
