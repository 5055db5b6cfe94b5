use super::{Behavior, BehaviorState, BehaviorTag, Combat, Transition};
use crate::alarm::SignalKind;
use crate::config::AlarmType;
use crate::context::AgentContext;
use crate::events::{BehaviorEvent, DegradeReason};
use crate::task::{BackgroundTask, CastStep, SignalCast, TaskTicket};
use sentinel_common::{EscalationError, PanelId};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    RunningToPanel(PanelId),
    Casting(TaskTicket),
    Interrupted,
}

/// Raising the alarm.
///
/// `GoToPanel` agents run to the nearest panel in range and trigger it;
/// `SignalFromPosition` agents stand still and channel their signal. Every
/// failure degrades to Combat instead of stalling.
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    signal: Option<SignalKind>,
    phase: Phase,
}

impl Default for Alarm {
    fn default() -> Self {
        Self::new()
    }
}

impl Alarm {
    /// Panel-run alarm.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signal: None,
            phase: Phase::Idle,
        }
    }

    /// Signal alarm; `None` degrades to Combat on enter.
    #[must_use]
    pub const fn with_signal(signal: Option<SignalKind>) -> Self {
        Self {
            signal,
            phase: Phase::Idle,
        }
    }

    /// Signal this alarm channels, if any.
    #[must_use]
    pub const fn signal(&self) -> Option<SignalKind> {
        self.signal
    }

    /// Whether a cast was interrupted.
    #[must_use]
    pub const fn was_interrupted(&self) -> bool {
        matches!(self.phase, Phase::Interrupted)
    }

    fn head_for_panel(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        if !ctx.runtime.counters.panel_available(ctx.config) {
            let err = EscalationError::CapReached {
                counter: "panel",
                cap: ctx.config.max_panel_alarms,
            };
            return degrade(ctx, DegradeReason::CapReached, &err);
        }

        let origin = ctx.position();
        let nearest = ctx
            .world
            .alarms
            .find_nearest_panel(origin, ctx.config.alarm_search_radius)
            .and_then(|id| ctx.world.alarms.panel(id))
            .map(|panel| (panel.id, panel.position));
        let Some((panel, position)) = nearest else {
            warn!(agent = %ctx.id, radius = ctx.config.alarm_search_radius, "no alarm panel in range; engaging");
            return fall_back(ctx, DegradeReason::NoPanelInRange);
        };
        if !ctx.ports.navigator.calculate_path(position).is_usable() {
            warn!(agent = %ctx.id, %panel, "alarm panel unreachable; engaging");
            return fall_back(ctx, DegradeReason::PanelUnreachable);
        }

        ctx.ports.navigator.resume();
        ctx.ports.set_speed(ctx.config.chase_speed);
        ctx.ports
            .navigator
            .set_stopping_distance(ctx.config.stopping_distance);
        ctx.ports.navigator.move_to(position);
        debug!(agent = %ctx.id, %panel, "running to alarm panel");
        self.phase = Phase::RunningToPanel(panel);
        None
    }

    fn begin_cast(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        let Some(signal) = self.signal else {
            error!(agent = %ctx.id, err = %EscalationError::NoSignalAssigned, "signal alarm cannot start; engaging");
            return fall_back(ctx, DegradeReason::NoSignalAssigned);
        };
        if !ctx.runtime.counters.signal_available(signal, ctx.config) {
            let err = EscalationError::CapReached {
                counter: signal.counter_name(),
                cap: ctx.config.signal_cap(signal),
            };
            return degrade(ctx, DegradeReason::CapReached, &err);
        }

        ctx.ports.navigator.stop();
        ctx.ports.anim.set_speed(0.0);
        let cast = SignalCast::new(signal, ctx.config.signal_cast_duration);
        match ctx.runtime.tasks.start(BackgroundTask::Cast(cast)) {
            Ok(ticket) => {
                debug!(agent = %ctx.id, ?signal, "channeling signal");
                ctx.runtime.cast_progress = Some(0.0);
                self.phase = Phase::Casting(ticket);
                None
            },
            Err(err) => {
                warn!(agent = %ctx.id, %err, "signal cast not started; engaging");
                Some(BehaviorState::Combat(Combat::new()))
            },
        }
    }

    fn raise_panel(&mut self, ctx: &mut AgentContext<'_, '_>, panel: PanelId) -> Transition {
        self.phase = Phase::Idle;
        if let Err(err) = ctx.world.alarms.trigger(panel) {
            warn!(agent = %ctx.id, %err, "alarm panel trigger failed; engaging");
            return Some(BehaviorState::Combat(Combat::new()));
        }
        match ctx
            .world
            .alarms
            .record_panel_alarm(&mut ctx.runtime.counters, ctx.config)
        {
            Ok(count) => {
                info!(agent = %ctx.id, %panel, count, "panel alarm raised");
                ctx.publish(BehaviorEvent::PanelTriggered {
                    agent: ctx.id,
                    panel,
                    count,
                });
            },
            Err(err) => warn!(agent = %ctx.id, %err, "panel alarm not counted"),
        }
        Some(BehaviorState::Combat(Combat::new()))
    }

    fn channel(&mut self, ctx: &mut AgentContext<'_, '_>, ticket: TaskTicket) -> Transition {
        let alive = ctx.is_alive();
        let (signal, step) = match ctx.runtime.tasks.get_mut(ticket) {
            Some(BackgroundTask::Cast(cast)) => (cast.signal(), cast.step(ctx.dt, alive)),
            _ => return None,
        };

        match step {
            CastStep::Channeling(progress) => {
                ctx.runtime.cast_progress = Some(progress);
                ctx.publish(BehaviorEvent::CastProgress {
                    agent: ctx.id,
                    signal,
                    progress,
                });
                None
            },
            CastStep::Aborted => {
                ctx.runtime.tasks.cancel();
                ctx.runtime.cast_progress = None;
                self.phase = Phase::Interrupted;
                warn!(agent = %ctx.id, ?signal, "cast aborted: caster died");
                ctx.publish(BehaviorEvent::CastAborted {
                    agent: ctx.id,
                    signal,
                });
                None
            },
            CastStep::Completed => {
                ctx.runtime.tasks.finish(ticket);
                ctx.runtime.cast_progress = Some(1.0);
                self.phase = Phase::Idle;

                let origin = ctx.position();
                ctx.ports.signals.raise(signal, origin);
                match ctx
                    .world
                    .alarms
                    .record_signal(&mut ctx.runtime.counters, signal, ctx.config)
                {
                    Ok(count) => {
                        info!(agent = %ctx.id, ?signal, count, "signal raised");
                        ctx.publish(BehaviorEvent::SignalRaised {
                            agent: ctx.id,
                            signal,
                            origin,
                            count,
                        });
                    },
                    Err(err) => warn!(agent = %ctx.id, %err, "signal not counted"),
                }
                Some(BehaviorState::Combat(Combat::new()))
            },
        }
    }
}

fn fall_back(ctx: &AgentContext<'_, '_>, reason: DegradeReason) -> Transition {
    ctx.publish(BehaviorEvent::EscalationDegraded {
        agent: ctx.id,
        reason,
    });
    Some(BehaviorState::Combat(Combat::new()))
}

fn degrade(
    ctx: &AgentContext<'_, '_>,
    reason: DegradeReason,
    err: &EscalationError,
) -> Transition {
    warn!(agent = %ctx.id, %err, "escalation unavailable; engaging");
    fall_back(ctx, reason)
}

impl Behavior for Alarm {
    fn tag(&self) -> BehaviorTag {
        BehaviorTag::Alarm
    }

    fn enter(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        self.phase = Phase::Idle;
        match ctx.config.alarm_type {
            AlarmType::None => Some(BehaviorState::Combat(Combat::new())),
            AlarmType::GoToPanel => self.head_for_panel(ctx),
            AlarmType::SignalFromPosition => self.begin_cast(ctx),
        }
    }

    fn execute(&mut self, ctx: &mut AgentContext<'_, '_>) -> Transition {
        match self.phase {
            Phase::Idle | Phase::Interrupted => None,
            Phase::RunningToPanel(panel) => {
                if ctx.ports.navigator.has_reached_destination() {
                    self.raise_panel(ctx, panel)
                } else {
                    None
                }
            },
            Phase::Casting(ticket) => self.channel(ctx, ticket),
        }
    }

    fn exit(&mut self, ctx: &mut AgentContext<'_, '_>) {
        if let Phase::Casting(_) = self.phase {
            ctx.runtime.tasks.cancel();
        }
        ctx.runtime.cast_progress = None;
        self.phase = Phase::Idle;
    }
}
