//! Alarm coordination: panel registry, nearest-panel search and the
//! capped escalation counters.
//!
//! Counters are owned by each agent's runtime; the coordinator only holds
//! the shared panel registry and the cap-enforcing mutators. Mutators are
//! called strictly after a successful panel trigger or signal raise.

use crate::config::{AgentConfig, AlarmType};
use glam::Vec3;
use sentinel_common::{EscalationError, PanelId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Kind of signal an agent can channel.
///
/// The kind selects which escalation counter a raised signal increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Calls reinforcements
    Summon,
    /// Lethal area effect
    Instakill,
}

impl SignalKind {
    /// Counter name used in logs and errors.
    #[must_use]
    pub const fn counter_name(self) -> &'static str {
        match self {
            Self::Summon => "summon",
            Self::Instakill => "instakill",
        }
    }
}

/// An alarm panel in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmPoint {
    /// Registry id
    pub id: PanelId,
    /// World position
    pub position: Vec3,
    /// Whether the panel has been triggered
    pub triggered: bool,
}

/// Per-agent escalation counters.
///
/// All three counters are monotonically non-decreasing and never exceed the
/// caps of the owning agent's config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationCounters {
    panel_alarms: u32,
    summons: u32,
    instakills: u32,
}

impl EscalationCounters {
    /// Panel alarms raised.
    #[must_use]
    pub const fn panel_alarms(&self) -> u32 {
        self.panel_alarms
    }

    /// Summon signals raised.
    #[must_use]
    pub const fn summons(&self) -> u32 {
        self.summons
    }

    /// Instakill signals raised.
    #[must_use]
    pub const fn instakills(&self) -> u32 {
        self.instakills
    }

    /// Count for a signal kind.
    #[must_use]
    pub const fn signals(&self, kind: SignalKind) -> u32 {
        match kind {
            SignalKind::Summon => self.summons,
            SignalKind::Instakill => self.instakills,
        }
    }

    /// Whether another panel alarm fits under the config cap.
    #[must_use]
    pub const fn panel_available(&self, config: &AgentConfig) -> bool {
        self.panel_alarms < config.max_panel_alarms
    }

    /// Whether another signal of `kind` fits under the config cap.
    #[must_use]
    pub const fn signal_available(&self, kind: SignalKind, config: &AgentConfig) -> bool {
        self.signals(kind) < config.signal_cap(kind)
    }
}

/// Registry of alarm panels plus escalation bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct AlarmCoordinator {
    panels: Vec<AlarmPoint>,
}

impl AlarmCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a panel and returns its id.
    pub fn register_panel(&mut self, position: Vec3) -> PanelId {
        let id = PanelId::new(self.panels.len() as u32);
        self.panels.push(AlarmPoint {
            id,
            position,
            triggered: false,
        });
        debug!(%id, ?position, "registered alarm panel");
        id
    }

    /// All registered panels.
    #[must_use]
    pub fn panels(&self) -> &[AlarmPoint] {
        &self.panels
    }

    /// Looks up a panel.
    #[must_use]
    pub fn panel(&self, id: PanelId) -> Option<&AlarmPoint> {
        self.panels.get(id.index())
    }

    /// Nearest panel within `radius` of `position`.
    ///
    /// Linear scan in registration order; a candidate replaces the current
    /// best only when strictly closer, so the first-registered panel wins an
    /// exact tie. Panels farther than `radius` are never considered.
    #[must_use]
    pub fn find_nearest_panel(&self, position: Vec3, radius: f32) -> Option<PanelId> {
        let mut best: Option<(PanelId, f32)> = None;
        for panel in &self.panels {
            let distance = panel.position.distance(position);
            if distance > radius {
                continue;
            }
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((panel.id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Triggers a panel.
    pub fn trigger(&mut self, id: PanelId) -> Result<Vec3, EscalationError> {
        let panel = self
            .panels
            .get_mut(id.index())
            .ok_or(EscalationError::UnknownPanel(id))?;
        panel.triggered = true;
        info!(%id, "alarm panel triggered");
        Ok(panel.position)
    }

    /// Records a successful panel alarm.
    pub fn record_panel_alarm(
        &self,
        counters: &mut EscalationCounters,
        config: &AgentConfig,
    ) -> Result<u32, EscalationError> {
        if !counters.panel_available(config) {
            return Err(EscalationError::CapReached {
                counter: "panel",
                cap: config.max_panel_alarms,
            });
        }
        counters.panel_alarms += 1;
        Ok(counters.panel_alarms)
    }

    /// Records a successfully raised signal on the counter matching its kind.
    pub fn record_signal(
        &self,
        counters: &mut EscalationCounters,
        kind: SignalKind,
        config: &AgentConfig,
    ) -> Result<u32, EscalationError> {
        if !counters.signal_available(kind, config) {
            return Err(EscalationError::CapReached {
                counter: kind.counter_name(),
                cap: config.signal_cap(kind),
            });
        }
        let counter = match kind {
            SignalKind::Summon => &mut counters.summons,
            SignalKind::Instakill => &mut counters.instakills,
        };
        *counter += 1;
        Ok(*counter)
    }

    /// Whether an agent at `position` should escalate after investigating.
    ///
    /// `GoToPanel` needs panel budget and a panel within search radius;
    /// `SignalFromPosition` needs an assigned signal with budget left; `None`
    /// never escalates.
    #[must_use]
    pub fn should_escalate(
        &self,
        config: &AgentConfig,
        counters: &EscalationCounters,
        position: Vec3,
    ) -> bool {
        match config.alarm_type {
            AlarmType::None => false,
            AlarmType::GoToPanel => {
                counters.panel_available(config)
                    && self
                        .find_nearest_panel(position, config.alarm_search_radius)
                        .is_some()
            },
            AlarmType::SignalFromPosition => config
                .signal
                .map_or(false, |kind| counters.signal_available(kind, config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_registry_has_no_nearest() {
        let alarms = AlarmCoordinator::new();
        assert!(alarms.find_nearest_panel(Vec3::ZERO, 100.0).is_none());
    }

    #[test]
    fn test_scenario_d_nearest_in_radius() {
        let mut alarms = AlarmCoordinator::new();
        let _far = alarms.register_panel(Vec3::new(12.0, 0.0, 0.0));
        let near = alarms.register_panel(Vec3::new(0.0, 0.0, 8.0));
        let _outside = alarms.register_panel(Vec3::new(-15.0, 0.0, 0.0));
        assert_eq!(alarms.find_nearest_panel(Vec3::ZERO, 10.0), Some(near));
    }

    #[test]
    fn test_panel_outside_radius_never_considered() {
        let mut alarms = AlarmCoordinator::new();
        alarms.register_panel(Vec3::new(15.0, 0.0, 0.0));
        assert!(alarms.find_nearest_panel(Vec3::ZERO, 10.0).is_none());
    }

    #[test]
    fn test_exact_tie_keeps_first() {
        let mut alarms = AlarmCoordinator::new();
        let first = alarms.register_panel(Vec3::new(5.0, 0.0, 0.0));
        let _second = alarms.register_panel(Vec3::new(-5.0, 0.0, 0.0));
        assert_eq!(alarms.find_nearest_panel(Vec3::ZERO, 10.0), Some(first));
    }

    #[test]
    fn test_trigger_sets_flag() {
        let mut alarms = AlarmCoordinator::new();
        let id = alarms.register_panel(Vec3::ONE);
        assert_eq!(alarms.trigger(id), Ok(Vec3::ONE));
        assert!(alarms.panel(id).map_or(false, |p| p.triggered));
    }

    #[test]
    fn test_trigger_unknown_panel() {
        let mut alarms = AlarmCoordinator::new();
        let err = alarms.trigger(PanelId::new(9)).unwrap_err();
        assert_eq!(err, EscalationError::UnknownPanel(PanelId::new(9)));
    }

    #[test]
    fn test_panel_counter_cap() {
        let alarms = AlarmCoordinator::new();
        let config = AgentConfig::default().with_caps(2, 0, 0);
        let mut counters = EscalationCounters::default();
        assert_eq!(alarms.record_panel_alarm(&mut counters, &config), Ok(1));
        assert_eq!(alarms.record_panel_alarm(&mut counters, &config), Ok(2));
        assert!(alarms.record_panel_alarm(&mut counters, &config).is_err());
        assert_eq!(counters.panel_alarms(), 2);
    }

    #[test]
    fn test_signal_counter_matches_kind() {
        let alarms = AlarmCoordinator::new();
        let config = AgentConfig::default().with_caps(0, 1, 1);
        let mut counters = EscalationCounters::default();
        alarms
            .record_signal(&mut counters, SignalKind::Instakill, &config)
            .unwrap();
        assert_eq!(counters.instakills(), 1);
        assert_eq!(counters.summons(), 0);
    }

    #[test]
    fn test_should_escalate_per_alarm_type() {
        let mut alarms = AlarmCoordinator::new();
        let counters = EscalationCounters::default();

        let none = AgentConfig::default().with_alarm_type(AlarmType::None);
        assert!(!alarms.should_escalate(&none, &counters, Vec3::ZERO));

        let panel = AgentConfig::default()
            .with_alarm_type(AlarmType::GoToPanel)
            .with_alarm_search_radius(10.0);
        assert!(!alarms.should_escalate(&panel, &counters, Vec3::ZERO));
        alarms.register_panel(Vec3::new(5.0, 0.0, 0.0));
        assert!(alarms.should_escalate(&panel, &counters, Vec3::ZERO));

        let unassigned = AgentConfig::default().with_alarm_type(AlarmType::SignalFromPosition);
        assert!(!alarms.should_escalate(&unassigned, &counters, Vec3::ZERO));
        let signal = unassigned.with_signal(SignalKind::Summon);
        assert!(alarms.should_escalate(&signal, &counters, Vec3::ZERO));
    }

    #[test]
    fn test_should_escalate_at_cap() {
        let mut alarms = AlarmCoordinator::new();
        alarms.register_panel(Vec3::ZERO);
        let config = AgentConfig::default().with_caps(1, 1, 1);
        let mut counters = EscalationCounters::default();
        alarms.record_panel_alarm(&mut counters, &config).unwrap();
        assert!(!alarms.should_escalate(&config, &counters, Vec3::ZERO));
    }

    proptest! {
        #[test]
        fn prop_counters_never_exceed_caps(
            cap_panel in 0u32..5,
            cap_summon in 0u32..5,
            cap_instakill in 0u32..5,
            ops in proptest::collection::vec(0u8..3, 0..40),
        ) {
            let alarms = AlarmCoordinator::new();
            let config = AgentConfig::default().with_caps(cap_panel, cap_summon, cap_instakill);
            let mut counters = EscalationCounters::default();
            for op in ops {
                let before = counters;
                let result = match op {
                    0 => alarms.record_panel_alarm(&mut counters, &config),
                    1 => alarms.record_signal(&mut counters, SignalKind::Summon, &config),
                    _ => alarms.record_signal(&mut counters, SignalKind::Instakill, &config),
                };
                if result.is_err() {
                    prop_assert_eq!(before, counters);
                }
                prop_assert!(counters.panel_alarms() <= cap_panel);
                prop_assert!(counters.summons() <= cap_summon);
                prop_assert!(counters.instakills() <= cap_instakill);
            }
        }
    }
}
