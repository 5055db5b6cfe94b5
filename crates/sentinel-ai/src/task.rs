//! Cancellable background sub-behaviors.
//!
//! Long-running work (spawn delay, the patrol loop, investigating, channeling
//! a signal) is modeled as explicit step functions advanced once per tick.
//! An agent owns a single [`TaskSlot`]; starting a task hands back a
//! [`TaskTicket`], and every step goes through that ticket. Cancelling bumps
//! the slot generation, so a stale ticket can never reach a task again.

use crate::alarm::SignalKind;
use crate::ports::{AnimPort, Navigator};
use crate::route::{PatrolRoute, WaypointAction};
use sentinel_common::TaskError;
use tracing::{debug, trace, warn};

/// Kind of background task, for logs and introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Plain timer
    Countdown,
    /// Endless waypoint loop
    PatrolLoop,
    /// Look around, then wait
    Investigation,
    /// Timed, abortable signal channel
    SignalCast,
}

impl TaskKind {
    /// Name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Countdown => "countdown",
            Self::PatrolLoop => "patrol loop",
            Self::Investigation => "investigation",
            Self::SignalCast => "signal cast",
        }
    }
}

/// Outcome of a single step of a finite task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Needs more ticks
    Running,
    /// Done
    Finished,
}

/// A timer that optionally skips a number of ticks before counting.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    ticks_to_skip: u32,
    elapsed: f32,
    duration: f32,
}

impl Countdown {
    /// Creates a countdown.
    #[must_use]
    pub const fn new(duration: f32) -> Self {
        Self {
            ticks_to_skip: 0,
            elapsed: 0.0,
            duration,
        }
    }

    /// Skips `ticks` whole ticks before time starts to count.
    #[must_use]
    pub const fn deferred(mut self, ticks: u32) -> Self {
        self.ticks_to_skip = ticks;
        self
    }

    /// Advances the timer.
    pub fn step(&mut self, dt: f32) -> TaskStatus {
        if self.ticks_to_skip > 0 {
            self.ticks_to_skip -= 1;
            return TaskStatus::Running;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            TaskStatus::Finished
        } else {
            TaskStatus::Running
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PatrolPhase {
    Depart,
    Travelling,
    Holding { elapsed: f32, duration: f32 },
}

/// Endless walk over a patrol route.
///
/// Move to the waypoint, poll for arrival, perform the waypoint action, then
/// advance with wraparound. The loop never finishes on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolLoop {
    index: usize,
    phase: PatrolPhase,
}

impl PatrolLoop {
    /// Creates a loop that starts by heading to `index`.
    #[must_use]
    pub const fn starting_at(index: usize) -> Self {
        Self {
            index,
            phase: PatrolPhase::Depart,
        }
    }

    /// Waypoint currently targeted.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Whether the agent is standing at a waypoint performing its action.
    #[must_use]
    pub const fn is_holding(&self) -> bool {
        matches!(self.phase, PatrolPhase::Holding { .. })
    }

    /// Advances the loop by one tick and returns the targeted index.
    pub fn step(
        &mut self,
        dt: f32,
        route: &PatrolRoute,
        navigator: &mut dyn Navigator,
        anim: &mut dyn AnimPort,
        rng: &mut fastrand::Rng,
    ) -> usize {
        if route.is_empty() {
            return 0;
        }
        if self.index >= route.len() {
            self.index = 0;
        }

        match self.phase {
            PatrolPhase::Depart => {
                self.head_to_current(route, navigator);
            },
            PatrolPhase::Travelling => {
                if navigator.has_reached_destination() {
                    self.arrive(route, navigator, anim, rng);
                }
            },
            PatrolPhase::Holding { elapsed, duration } => {
                let elapsed = elapsed + dt;
                if elapsed >= duration {
                    self.advance(route, navigator);
                } else {
                    self.phase = PatrolPhase::Holding { elapsed, duration };
                }
            },
        }
        self.index
    }

    fn head_to_current(&mut self, route: &PatrolRoute, navigator: &mut dyn Navigator) {
        if let Some(waypoint) = route.get(self.index) {
            trace!(index = self.index, "heading to waypoint");
            navigator.move_to(waypoint.position);
            self.phase = PatrolPhase::Travelling;
        }
    }

    fn arrive(
        &mut self,
        route: &PatrolRoute,
        navigator: &mut dyn Navigator,
        anim: &mut dyn AnimPort,
        rng: &mut fastrand::Rng,
    ) {
        let Some(waypoint) = route.get(self.index) else {
            return;
        };
        match waypoint.resolve_action(rng) {
            WaypointAction::Continue => self.advance(route, navigator),
            WaypointAction::Wait => {
                self.phase = PatrolPhase::Holding {
                    elapsed: 0.0,
                    duration: waypoint.wait_time,
                };
            },
            WaypointAction::WaitAndLook => {
                anim.play_look_around();
                self.phase = PatrolPhase::Holding {
                    elapsed: 0.0,
                    duration: waypoint.wait_time,
                };
            },
        }
    }

    fn advance(&mut self, route: &PatrolRoute, navigator: &mut dyn Navigator) {
        self.index = route.next_index(self.index);
        self.head_to_current(route, navigator);
    }
}

/// Look-around cue followed by a fixed wait.
#[derive(Debug, Clone, PartialEq)]
pub struct Investigation {
    elapsed: f32,
    duration: f32,
    cue_played: bool,
}

impl Investigation {
    /// Creates an investigation lasting `duration` seconds after the cue.
    #[must_use]
    pub const fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            cue_played: false,
        }
    }

    /// Advances the investigation.
    pub fn step(&mut self, dt: f32, anim: &mut dyn AnimPort) -> TaskStatus {
        if !self.cue_played {
            anim.play_look_around();
            self.cue_played = true;
            return TaskStatus::Running;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            TaskStatus::Finished
        } else {
            TaskStatus::Running
        }
    }
}

/// Outcome of a single cast step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastStep {
    /// Still channeling, with progress in 0..1
    Channeling(f32),
    /// Cast time elapsed; raise the signal
    Completed,
    /// The caster died; nothing is raised
    Aborted,
}

/// Timed, abortable channel of a signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalCast {
    signal: SignalKind,
    elapsed: f32,
    duration: f32,
}

impl SignalCast {
    /// Creates a cast.
    #[must_use]
    pub const fn new(signal: SignalKind, duration: f32) -> Self {
        Self {
            signal,
            elapsed: 0.0,
            duration,
        }
    }

    /// Signal being channeled.
    #[must_use]
    pub const fn signal(&self) -> SignalKind {
        self.signal
    }

    /// Fraction of the cast completed.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Advances the cast; `alive` is the caster's liveness this tick.
    pub fn step(&mut self, dt: f32, alive: bool) -> CastStep {
        if !alive {
            return CastStep::Aborted;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            CastStep::Completed
        } else {
            CastStep::Channeling(self.progress())
        }
    }
}

/// Any background task.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundTask {
    /// Plain timer
    Countdown(Countdown),
    /// Waypoint loop
    Patrol(PatrolLoop),
    /// Investigation wait
    Investigation(Investigation),
    /// Signal channel
    Cast(SignalCast),
}

impl BackgroundTask {
    /// Kind of this task.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::Countdown(_) => TaskKind::Countdown,
            Self::Patrol(_) => TaskKind::PatrolLoop,
            Self::Investigation(_) => TaskKind::Investigation,
            Self::Cast(_) => TaskKind::SignalCast,
        }
    }
}

/// Proof of ownership of the task currently in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskTicket(u64);

/// The single background-task slot of an agent.
#[derive(Debug, Default)]
pub struct TaskSlot {
    current: Option<(TaskTicket, BackgroundTask)>,
    generation: u64,
    cancellations: u64,
}

impl TaskSlot {
    /// Creates an idle slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a task; fails if one is already running.
    pub fn start(&mut self, task: BackgroundTask) -> Result<TaskTicket, TaskError> {
        if let Some((_, running)) = &self.current {
            return Err(TaskError::SlotOccupied(running.kind().name()));
        }
        self.generation += 1;
        let ticket = TaskTicket(self.generation);
        debug!(task = task.kind().name(), "background task started");
        self.current = Some((ticket, task));
        Ok(ticket)
    }

    /// Mutable access to the task owned by `ticket`.
    ///
    /// Returns `None` once the task was cancelled or finished.
    pub fn get_mut(&mut self, ticket: TaskTicket) -> Option<&mut BackgroundTask> {
        match &mut self.current {
            Some((owner, task)) if *owner == ticket => Some(task),
            _ => None,
        }
    }

    /// Releases a task that completed normally.
    pub fn finish(&mut self, ticket: TaskTicket) {
        if matches!(&self.current, Some((owner, _)) if *owner == ticket) {
            if let Some((_, task)) = self.current.take() {
                debug!(task = task.kind().name(), "background task finished");
            }
        }
    }

    /// Cancels whatever is running, synchronously.
    ///
    /// After this returns no step of the cancelled task can run again.
    pub fn cancel(&mut self) -> Option<TaskKind> {
        let (_, task) = self.current.take()?;
        self.generation += 1;
        self.cancellations += 1;
        debug!(task = task.kind().name(), "background task cancelled");
        Some(task.kind())
    }

    /// Whether no task is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Kind of the running task.
    #[must_use]
    pub fn kind(&self) -> Option<TaskKind> {
        self.current.as_ref().map(|(_, task)| task.kind())
    }

    /// Total number of cancellations.
    #[must_use]
    pub const fn cancellations(&self) -> u64 {
        self.cancellations
    }

    /// Cancels a leftover task that its owner failed to release.
    pub(crate) fn reap_leftover(&mut self) {
        if let Some(kind) = self.cancel() {
            warn!(task = kind.name(), "task survived its owner's exit; cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAnimator, MockNavigator};
    use crate::route::Waypoint;
    use glam::Vec3;

    #[test]
    fn test_countdown_deferred() {
        let mut timer = Countdown::new(1.0).deferred(1);
        assert_eq!(timer.step(5.0), TaskStatus::Running);
        assert_eq!(timer.step(0.5), TaskStatus::Running);
        assert_eq!(timer.step(0.5), TaskStatus::Finished);
    }

    #[test]
    fn test_slot_single_task() {
        let mut slot = TaskSlot::new();
        let ticket = slot
            .start(BackgroundTask::Countdown(Countdown::new(1.0)))
            .unwrap();
        let err = slot
            .start(BackgroundTask::Investigation(Investigation::new(1.0)))
            .unwrap_err();
        assert_eq!(err, TaskError::SlotOccupied("countdown"));
        assert!(slot.get_mut(ticket).is_some());
    }

    #[test]
    fn test_cancel_invalidates_ticket() {
        let mut slot = TaskSlot::new();
        let ticket = slot
            .start(BackgroundTask::Countdown(Countdown::new(1.0)))
            .unwrap();
        assert_eq!(slot.cancel(), Some(TaskKind::Countdown));
        assert!(slot.is_idle());
        assert!(slot.get_mut(ticket).is_none());

        let fresh = slot
            .start(BackgroundTask::Countdown(Countdown::new(1.0)))
            .unwrap();
        assert_ne!(ticket, fresh);
        assert!(slot.get_mut(ticket).is_none());
        assert_eq!(slot.cancellations(), 1);
    }

    #[test]
    fn test_finish_with_stale_ticket_is_ignored() {
        let mut slot = TaskSlot::new();
        let old = slot
            .start(BackgroundTask::Countdown(Countdown::new(1.0)))
            .unwrap();
        slot.cancel();
        let _new = slot
            .start(BackgroundTask::Countdown(Countdown::new(1.0)))
            .unwrap();
        slot.finish(old);
        assert!(!slot.is_idle());
    }

    #[test]
    fn test_investigation_plays_cue_first() {
        let mut anim = MockAnimator::new();
        let mut task = Investigation::new(1.0);
        assert_eq!(task.step(0.6, &mut anim), TaskStatus::Running);
        assert_eq!(anim.look_arounds, 1);
        assert_eq!(task.step(0.6, &mut anim), TaskStatus::Running);
        assert_eq!(task.step(0.6, &mut anim), TaskStatus::Finished);
        assert_eq!(anim.look_arounds, 1);
    }

    #[test]
    fn test_cast_aborts_on_death() {
        let mut cast = SignalCast::new(SignalKind::Summon, 2.0);
        assert_eq!(cast.step(1.0, true), CastStep::Channeling(0.5));
        assert_eq!(cast.step(1.0, false), CastStep::Aborted);
    }

    #[test]
    fn test_cast_completes() {
        let mut cast = SignalCast::new(SignalKind::Instakill, 1.0);
        assert_eq!(cast.step(0.5, true), CastStep::Channeling(0.5));
        assert_eq!(cast.step(0.5, true), CastStep::Completed);
        assert_eq!(cast.progress(), 1.0);
    }

    #[test]
    fn test_patrol_loop_wraps_without_skipping() {
        let route = PatrolRoute::from_points([
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(8.0, 0.0, 0.0),
        ]);
        let mut nav = MockNavigator::new(Vec3::ZERO).arriving_instantly();
        let mut anim = MockAnimator::new();
        let mut rng = fastrand::Rng::with_seed(3);
        let mut patrol = PatrolLoop::starting_at(0);

        let mut visited = Vec::new();
        for _ in 0..7 {
            patrol.step(0.1, &route, &mut nav, &mut anim, &mut rng);
        }
        visited.extend(nav.move_requests.iter().map(|p| p.x as i32));
        assert_eq!(visited, vec![0, 4, 8, 0, 4, 8, 0]);
    }

    #[test]
    fn test_patrol_loop_waits_at_waypoint() {
        let route = PatrolRoute::new(vec![
            Waypoint::new(Vec3::ZERO).with_action(WaypointAction::WaitAndLook, 1.0),
            Waypoint::new(Vec3::X),
        ]);
        let mut nav = MockNavigator::new(Vec3::ZERO).arriving_instantly();
        let mut anim = MockAnimator::new();
        let mut rng = fastrand::Rng::with_seed(3);
        let mut patrol = PatrolLoop::starting_at(0);

        patrol.step(0.5, &route, &mut nav, &mut anim, &mut rng); // depart
        patrol.step(0.5, &route, &mut nav, &mut anim, &mut rng); // arrive, hold
        assert!(patrol.is_holding());
        assert_eq!(anim.look_arounds, 1);
        patrol.step(0.5, &route, &mut nav, &mut anim, &mut rng);
        assert_eq!(patrol.index(), 0);
        patrol.step(0.5, &route, &mut nav, &mut anim, &mut rng);
        assert_eq!(patrol.index(), 1);
        assert_eq!(nav.move_requests.len(), 2);
    }
}
