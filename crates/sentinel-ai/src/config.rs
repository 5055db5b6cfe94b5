//! Per-archetype agent configuration.
//!
//! An [`AgentConfig`] is immutable once an agent is spawned. Durations are in
//! seconds, distances in world units and angles in degrees.

use crate::alarm::SignalKind;
use sentinel_common::ConfigError;
use serde::{Deserialize, Serialize};

/// How an agent escalates after an unresolved investigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlarmType {
    /// Never escalates
    None,
    /// Runs to the nearest alarm panel and triggers it
    #[default]
    GoToPanel,
    /// Channels a signal from the current position
    SignalFromPosition,
}

/// The duty an agent returns to when nothing is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InitialBehavior {
    /// Holds a fixed post
    Guard,
    /// Walks a patrol route
    #[default]
    Patrol,
}

/// Immutable per-archetype parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    // === Movement ===
    /// Speed while patrolling or walking to a post
    pub patrol_speed: f32,
    /// Speed while moving to investigate
    pub alert_speed: f32,
    /// Speed in combat when the target is close
    pub combat_walk_speed: f32,
    /// Speed in combat when the target is far, and when running to a panel
    pub chase_speed: f32,
    /// Default navigator stopping distance
    pub stopping_distance: f32,
    /// Stopping distance used while moving to an alert location
    pub alert_stopping_distance: f32,
    /// Radius used when snapping an alert location onto the navmesh
    pub navigable_sample_radius: f32,

    // === Perception ===
    /// Maximum sight distance
    pub detection_range: f32,
    /// Full vision cone angle in degrees
    pub cone_angle: f32,
    /// Minimum sound intensity the agent reacts to
    pub hearing_threshold: f32,
    /// Radius scanned for dead bodies while alert
    pub body_scan_radius: f32,

    // === Combat ===
    /// Distance at which the agent attacks
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Sighting distance at which Patrol/Guard go straight to Combat
    pub combat_entry_range: f32,
    /// Distance under which Combat walks instead of chasing
    pub close_range: f32,
    /// Distance at which Combat persists without a sighting
    pub lock_on_range: f32,
    /// Damage sends the agent to Combat instead of Alert
    pub damage_triggers_combat: bool,

    // === Escalation ===
    /// Escalation mode
    pub alarm_type: AlarmType,
    /// Radius searched for alarm panels
    pub alarm_search_radius: f32,
    /// Maximum panel alarms this agent may raise
    pub max_panel_alarms: u32,
    /// Maximum summon signals this agent may raise
    pub max_summon_count: u32,
    /// Maximum instakill signals this agent may raise
    pub max_instakill_count: u32,
    /// Signal raised by `SignalFromPosition` agents
    pub signal: Option<SignalKind>,
    /// Channel time for a signal
    pub signal_cast_duration: f32,

    // === Timing ===
    /// Time spent looking around at an alert location
    pub investigate_duration: f32,
    /// Delay between spawning and taking up duty
    pub spawn_delay: f32,

    // === Duty ===
    /// Guard or Patrol
    pub initial_behavior: InitialBehavior,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            // Movement
            patrol_speed: 2.0,
            alert_speed: 3.0,
            combat_walk_speed: 2.5,
            chase_speed: 5.0,
            stopping_distance: 0.5,
            alert_stopping_distance: 1.5,
            navigable_sample_radius: 2.0,

            // Perception
            detection_range: 15.0,
            cone_angle: 90.0,
            hearing_threshold: 0.5,
            body_scan_radius: 10.0,

            // Combat
            attack_range: 2.0,
            attack_cooldown: 1.5,
            combat_entry_range: 5.0,
            close_range: 4.0,
            lock_on_range: 8.0,
            damage_triggers_combat: true,

            // Escalation
            alarm_type: AlarmType::GoToPanel,
            alarm_search_radius: 30.0,
            max_panel_alarms: 1,
            max_summon_count: 1,
            max_instakill_count: 1,
            signal: None,
            signal_cast_duration: 3.0,

            // Timing
            investigate_duration: 5.0,
            spawn_delay: 1.0,

            // Duty
            initial_behavior: InitialBehavior::Patrol,
        }
    }
}

impl AgentConfig {
    /// Parses a config from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every numeric parameter against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("patrol_speed", self.patrol_speed),
            ("alert_speed", self.alert_speed),
            ("combat_walk_speed", self.combat_walk_speed),
            ("chase_speed", self.chase_speed),
            ("stopping_distance", self.stopping_distance),
            ("alert_stopping_distance", self.alert_stopping_distance),
            ("navigable_sample_radius", self.navigable_sample_radius),
            ("detection_range", self.detection_range),
            ("hearing_threshold", self.hearing_threshold),
            ("body_scan_radius", self.body_scan_radius),
            ("attack_range", self.attack_range),
            ("combat_entry_range", self.combat_entry_range),
            ("close_range", self.close_range),
            ("lock_on_range", self.lock_on_range),
            ("alarm_search_radius", self.alarm_search_radius),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    value,
                    reason: "must be a finite non-negative number",
                });
            }
        }

        if !(self.cone_angle > 0.0 && self.cone_angle <= 360.0) {
            return Err(ConfigError::InvalidValue {
                field: "cone_angle",
                value: self.cone_angle,
                reason: "must be in (0, 360]",
            });
        }

        let durations = [
            ("attack_cooldown", self.attack_cooldown),
            ("investigate_duration", self.investigate_duration),
            ("spawn_delay", self.spawn_delay),
            ("signal_cast_duration", self.signal_cast_duration),
        ];
        for (field, value) in durations {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    value,
                    reason: "must be positive",
                });
            }
        }

        Ok(())
    }

    /// Half of the vision cone, in degrees.
    #[must_use]
    pub fn half_cone_angle(&self) -> f32 {
        self.cone_angle / 2.0
    }

    /// Cap for the counter matching a signal kind.
    #[must_use]
    pub const fn signal_cap(&self, kind: SignalKind) -> u32 {
        match kind {
            SignalKind::Summon => self.max_summon_count,
            SignalKind::Instakill => self.max_instakill_count,
        }
    }

    /// Sets the alarm type.
    #[must_use]
    pub fn with_alarm_type(mut self, alarm_type: AlarmType) -> Self {
        self.alarm_type = alarm_type;
        self
    }

    /// Sets the signal raised by `SignalFromPosition`.
    #[must_use]
    pub fn with_signal(mut self, signal: SignalKind) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Sets the initial duty.
    #[must_use]
    pub fn with_initial_behavior(mut self, behavior: InitialBehavior) -> Self {
        self.initial_behavior = behavior;
        self
    }

    /// Sets detection range and cone angle.
    #[must_use]
    pub fn with_vision(mut self, detection_range: f32, cone_angle: f32) -> Self {
        self.detection_range = detection_range;
        self.cone_angle = cone_angle;
        self
    }

    /// Sets attack range and cooldown.
    #[must_use]
    pub fn with_attack(mut self, range: f32, cooldown: f32) -> Self {
        self.attack_range = range;
        self.attack_cooldown = cooldown;
        self
    }

    /// Sets the combat entry range.
    #[must_use]
    pub fn with_combat_entry_range(mut self, range: f32) -> Self {
        self.combat_entry_range = range;
        self
    }

    /// Sets the panel search radius.
    #[must_use]
    pub fn with_alarm_search_radius(mut self, radius: f32) -> Self {
        self.alarm_search_radius = radius;
        self
    }

    /// Sets escalation caps (panel, summon, instakill).
    #[must_use]
    pub fn with_caps(mut self, panels: u32, summons: u32, instakills: u32) -> Self {
        self.max_panel_alarms = panels;
        self.max_summon_count = summons;
        self.max_instakill_count = instakills;
        self
    }
}
