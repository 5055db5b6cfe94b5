//! Scenario configuration.
//!
//! A scenario names a set of agent archetypes, places agents in the world,
//! and scripts the player's movement, noises and hits. It is loaded from a
//! TOML file and falls back to a built-in demo when the file is missing or
//! unreadable.

use anyhow::{bail, Context, Result};
use glam::{Vec2, Vec3};
use sentinel_ai::{AgentConfig, AlarmType, InitialBehavior, SignalKind, Wall, Waypoint, WaypointAction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Scenario file name.
pub const CONFIG_FILE: &str = "sentinel.toml";

/// A whole scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run Settings ===
    /// Updates per simulated second
    pub tick_rate: u32,
    /// Simulated duration in seconds
    pub duration_secs: f32,
    /// Log every behavior event as JSON
    pub log_events: bool,
    /// Print the final summary as JSON instead of a table
    pub json_summary: bool,

    // === World ===
    /// Alarm panel positions
    pub panels: Vec<Vec3>,
    /// Sight-blocking walls
    pub walls: Vec<Wall>,

    // === Agents ===
    /// Named parameter sets
    pub archetypes: BTreeMap<String, AgentConfig>,
    /// Placed agents
    pub agents: Vec<AgentSpec>,

    // === Script ===
    /// Player keyframes; the player is absent before the first one
    pub player: Vec<PlayerKey>,
    /// Scripted noises
    pub noises: Vec<NoiseSpec>,
    /// Scripted hits on agents
    pub hits: Vec<HitSpec>,
}

/// One placed agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSpec {
    /// Display name, unique per scenario
    pub name: String,
    /// Key into [`SimConfig::archetypes`]
    pub archetype: String,
    /// Spawn position
    pub position: Vec3,
    /// Initial facing
    pub facing: Vec3,
    /// Patrol route; empty means "stand at the spawn position"
    pub route: Vec<Waypoint>,
    /// Guard post; defaults to the spawn position
    pub post: Option<Vec3>,
    /// First waypoint visited after spawn
    pub start_waypoint: usize,
    /// Perception enabled at start
    pub detector: bool,
    /// Time at which the agent is killed
    pub killed_at: Option<f32>,
}

impl Default for AgentSpec {
    fn default() -> Self {
        Self {
            name: String::from("agent"),
            archetype: String::from("grunt"),
            position: Vec3::ZERO,
            facing: Vec3::Z,
            route: Vec::new(),
            post: None,
            start_waypoint: 0,
            detector: true,
            killed_at: None,
        }
    }
}

/// Player position at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerKey {
    /// Seconds since start
    pub at: f32,
    /// Player position
    pub position: Vec3,
}

/// A noise heard by every agent within `radius` of its origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseSpec {
    /// Seconds since start
    pub at: f32,
    /// Where the noise happened
    pub origin: Vec3,
    /// Loudness compared against each agent's hearing threshold
    pub intensity: f32,
    /// Audible radius
    pub radius: f32,
}

/// The player hitting a named agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitSpec {
    /// Seconds since start
    pub at: f32,
    /// Name of the agent hit
    pub agent: String,
    /// Position the hit came from
    pub from: Vec3,
}

impl Default for SimConfig {
    fn default() -> Self {
        let grunt = AgentConfig::default().with_alarm_type(AlarmType::GoToPanel);
        let caster = AgentConfig::default()
            .with_alarm_type(AlarmType::SignalFromPosition)
            .with_signal(SignalKind::Summon);
        let sentry = AgentConfig::default()
            .with_initial_behavior(InitialBehavior::Guard)
            .with_alarm_type(AlarmType::None);

        let mut archetypes = BTreeMap::new();
        archetypes.insert(String::from("grunt"), grunt);
        archetypes.insert(String::from("caster"), caster);
        archetypes.insert(String::from("sentry"), sentry);

        let agents = vec![
            AgentSpec {
                name: String::from("north-patrol"),
                archetype: String::from("grunt"),
                position: Vec3::new(0.0, 0.0, 20.0),
                facing: Vec3::X,
                route: vec![
                    Waypoint::new(Vec3::new(0.0, 0.0, 20.0)),
                    Waypoint::new(Vec3::new(12.0, 0.0, 20.0))
                        .with_action(WaypointAction::WaitAndLook, 2.0),
                    Waypoint::new(Vec3::new(12.0, 0.0, 30.0)).randomized(),
                ],
                ..AgentSpec::default()
            },
            AgentSpec {
                name: String::from("yard-caster"),
                archetype: String::from("caster"),
                position: Vec3::new(-10.0, 0.0, 0.0),
                route: vec![
                    Waypoint::new(Vec3::new(-10.0, 0.0, 0.0)),
                    Waypoint::new(Vec3::new(-10.0, 0.0, 10.0))
                        .with_action(WaypointAction::Wait, 1.5),
                ],
                ..AgentSpec::default()
            },
            AgentSpec {
                name: String::from("gate-sentry"),
                archetype: String::from("sentry"),
                position: Vec3::new(5.0, 0.0, -5.0),
                facing: Vec3::NEG_Z,
                ..AgentSpec::default()
            },
        ];

        Self {
            tick_rate: 30,
            duration_secs: 40.0,
            log_events: true,
            json_summary: false,
            panels: vec![Vec3::new(6.0, 0.0, 24.0), Vec3::new(-14.0, 0.0, 4.0)],
            walls: vec![Wall {
                start: Vec2::new(-4.0, 12.0),
                end: Vec2::new(4.0, 12.0),
            }],
            archetypes,
            agents,
            player: vec![
                PlayerKey {
                    at: 3.0,
                    position: Vec3::new(5.0, 0.0, -30.0),
                },
                PlayerKey {
                    at: 15.0,
                    position: Vec3::new(5.0, 0.0, -8.0),
                },
                PlayerKey {
                    at: 30.0,
                    position: Vec3::new(-8.0, 0.0, 8.0),
                },
            ],
            noises: vec![NoiseSpec {
                at: 8.0,
                origin: Vec3::new(-6.0, 0.0, 6.0),
                intensity: 0.8,
                radius: 15.0,
            }],
            hits: Vec::new(),
        }
    }
}

impl SimConfig {
    /// Load a scenario from a specific path.
    /// Returns the built-in demo if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Scenario file not found, using the built-in demo");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read scenario file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded scenario from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse scenario file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open scenario file: {e}");
                Self::default()
            },
        }
    }

    /// Save the scenario to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        // `--write-default` may point into a directory that does not exist yet
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved scenario to {}", path.display());
        Ok(())
    }

    /// Fixed timestep in seconds.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Number of ticks the run lasts.
    #[must_use]
    pub fn tick_count(&self) -> usize {
        (self.duration_secs * self.tick_rate as f32).ceil().max(0.0) as usize
    }

    /// Looks up an agent's archetype.
    pub fn archetype(&self, spec: &AgentSpec) -> Result<&AgentConfig> {
        self.archetypes.get(&spec.archetype).with_context(|| {
            format!(
                "agent `{}` uses unknown archetype `{}`",
                spec.name, spec.archetype
            )
        })
    }

    /// Rejects scenarios the runner cannot play.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            bail!("tick_rate must be at least 1");
        }
        if !(self.duration_secs > 0.0) {
            bail!("duration_secs must be positive, got {}", self.duration_secs);
        }
        for (name, archetype) in &self.archetypes {
            archetype
                .validate()
                .with_context(|| format!("archetype `{name}` is invalid"))?;
        }

        let mut names = std::collections::BTreeSet::new();
        for spec in &self.agents {
            if !names.insert(spec.name.as_str()) {
                bail!("agent name `{}` is used twice", spec.name);
            }
            self.archetype(spec)?;
        }
        for hit in &self.hits {
            if !names.contains(hit.agent.as_str()) {
                bail!("hit at {}s targets unknown agent `{}`", hit.at, hit.agent);
            }
        }
        if self.player.windows(2).any(|pair| pair[1].at < pair[0].at) {
            bail!("player keyframes must be in time order");
        }
        Ok(())
    }

    /// Player position at time `t`.
    ///
    /// Linear between keyframes, held after the last one.
    #[must_use]
    pub fn player_at(&self, t: f32) -> Option<Vec3> {
        let first = self.player.first()?;
        if t < first.at {
            return None;
        }
        let next = self.player.iter().position(|key| key.at > t);
        match next {
            None => self.player.last().map(|key| key.position),
            Some(i) => {
                let (a, b) = (self.player[i - 1], self.player[i]);
                let span = b.at - a.at;
                let s = if span > 0.0 { (t - a.at) / span } else { 1.0 };
                Some(a.position.lerp(b.position, s))
            },
        }
    }
}
