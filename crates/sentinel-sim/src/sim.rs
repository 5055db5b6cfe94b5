//! Fixed-timestep scenario runner.
//!
//! Every agent gets its own kinematic navigator and recording ports; the
//! panels, bodies and walls are shared. Each tick advances movement, plays
//! the script, updates the agents in order and drains the event bus.

use crate::config::{HitSpec, NoiseSpec, SimConfig};
use anyhow::Result;
use glam::Vec3;
use sentinel_ai::{
    Agent, AgentPorts, AlarmCoordinator, BehaviorEvent, BehaviorTag, BodyRegistry, EventBus,
    MockAnimator, MockNavigator, MockWeapon, PatrolRoute, RecordingSignalSink, SoundEvent,
    Surroundings, WallSet,
};
use sentinel_common::EntityId;
use serde::Serialize;
use tracing::{debug, info, warn};

struct SimAgent {
    name: String,
    agent: Agent,
    nav: MockNavigator,
    anim: MockAnimator,
    weapon: MockWeapon,
    signals: RecordingSignalSink,
    killed_at: Option<f32>,
    dead: bool,
}

/// A running scenario.
pub struct Simulation {
    config: SimConfig,
    agents: Vec<SimAgent>,
    alarms: AlarmCoordinator,
    bodies: BodyRegistry,
    walls: WallSet,
    bus: EventBus,
    noises: Vec<NoiseSpec>,
    hits: Vec<HitSpec>,
    time: f32,
    ticks: usize,
    events_seen: usize,
    transitions: usize,
}

/// End-of-run report for one agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    /// Agent name
    pub name: String,
    /// Final behavior
    pub behavior: BehaviorTag,
    /// Final position
    pub position: Vec3,
    /// Panels this agent triggered
    pub panel_alarms: u32,
    /// Summon signals raised
    pub summons: u32,
    /// Instakill signals raised
    pub instakills: u32,
    /// Attacks performed
    pub attacks: usize,
}

/// End-of-run report.
#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    /// Simulated seconds
    pub elapsed: f32,
    /// Ticks run
    pub ticks: usize,
    /// Behavior events observed
    pub events: usize,
    /// State changes among them
    pub transitions: usize,
    /// Panels triggered at least once
    pub panels_triggered: usize,
    /// Bodies on the ground
    pub bodies: usize,
    /// Per-agent reports
    pub agents: Vec<AgentSummary>,
}

impl Simulation {
    /// Builds the world described by `config`.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let bus = EventBus::default();
        let mut alarms = AlarmCoordinator::new();
        for &panel in &config.panels {
            alarms.register_panel(panel);
        }
        let mut walls = WallSet::new();
        for wall in &config.walls {
            walls.add(wall.start, wall.end);
        }

        let mut agents = Vec::with_capacity(config.agents.len());
        for (i, spec) in config.agents.iter().enumerate() {
            let archetype = config.archetype(spec)?.clone();
            let route = if spec.route.is_empty() {
                PatrolRoute::from_points([spec.position])
            } else {
                PatrolRoute::new(spec.route.clone())
            };
            let mut agent = Agent::new(archetype, route)?
                .with_id(EntityId::from_raw(i as u64 + 1))
                .with_post(spec.post.unwrap_or(spec.position))
                .with_start_waypoint(spec.start_waypoint)
                .with_events(bus.publisher());
            agent.set_detector_enabled(spec.detector);
            debug!(agent = %agent.id(), name = %spec.name, "agent placed");

            agents.push(SimAgent {
                name: spec.name.clone(),
                agent,
                nav: MockNavigator::new(spec.position).facing(spec.facing),
                anim: MockAnimator::new(),
                weapon: MockWeapon::new(),
                signals: RecordingSignalSink::new(),
                killed_at: spec.killed_at,
                dead: false,
            });
        }

        let mut noises = config.noises.clone();
        noises.sort_by(|a, b| a.at.total_cmp(&b.at));
        let mut hits = config.hits.clone();
        hits.sort_by(|a, b| a.at.total_cmp(&b.at));

        info!(
            agents = agents.len(),
            panels = config.panels.len(),
            walls = walls.len(),
            "scenario ready"
        );

        Ok(Self {
            config,
            agents,
            alarms,
            bodies: BodyRegistry::new(),
            walls,
            bus,
            noises,
            hits,
            time: 0.0,
            ticks: 0,
            events_seen: 0,
            transitions: 0,
        })
    }

    /// Agent by name.
    #[cfg(test)]
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name).map(|a| &a.agent)
    }

    /// Runs the whole scenario.
    pub fn run(&mut self) -> SimSummary {
        for _ in 0..self.config.tick_count() {
            self.tick();
        }
        self.summary()
    }

    /// Advances every agent by one fixed step.
    pub fn tick(&mut self) {
        let dt = self.config.dt();
        self.time += dt;
        self.ticks += 1;
        let now = self.time;
        let player = self.config.player_at(now);

        self.play_noises(now);
        let hits = take_due(&mut self.hits, now, |hit| hit.at);

        for sim in &mut self.agents {
            if sim.dead {
                continue;
            }
            let dies = sim.killed_at.is_some_and(|at| now >= at);
            sim.nav.advance(dt);
            let pose = sim.nav.pose();
            {
                let mut ports = AgentPorts::new(
                    &mut sim.nav,
                    &mut sim.anim,
                    &mut sim.weapon,
                    &mut sim.signals,
                );
                let mut world =
                    Surroundings::new(pose, &self.walls, &self.bodies, &mut self.alarms)
                        .with_target(player)
                        .with_alive(!dies);

                for hit in hits.iter().filter(|hit| hit.agent == sim.name) {
                    sim.agent.on_damaged(hit.from, &mut ports, &mut world);
                }
                if dies {
                    sim.agent.on_died(&mut ports, &mut world);
                } else {
                    sim.agent.update(dt, &mut ports, &mut world);
                }
            }
            if dies {
                self.bodies.mark_dead(sim.agent.id(), sim.nav.position);
                sim.dead = true;
            }
        }

        self.drain_events();
    }

    fn play_noises(&mut self, now: f32) {
        for noise in take_due(&mut self.noises, now, |noise| noise.at) {
            debug!(origin = ?noise.origin, intensity = noise.intensity, "noise");
            for sim in self.agents.iter().filter(|sim| !sim.dead) {
                if sim.nav.position.distance(noise.origin) <= noise.radius {
                    sim.agent
                        .hear(SoundEvent::new(noise.origin, noise.intensity));
                }
            }
        }
    }

    fn drain_events(&mut self) {
        for event in self.bus.drain() {
            self.events_seen += 1;
            if matches!(event, BehaviorEvent::StateChanged { .. }) {
                self.transitions += 1;
            }
            if !self.config.log_events {
                continue;
            }
            match serde_json::to_string(&event) {
                Ok(json) => info!(t = self.time, "{json}"),
                Err(e) => warn!("Failed to encode event: {e}"),
            }
        }
    }

    /// Snapshot of the run so far.
    #[must_use]
    pub fn summary(&self) -> SimSummary {
        let agents = self
            .agents
            .iter()
            .map(|sim| {
                let counters = sim.agent.counters();
                AgentSummary {
                    name: sim.name.clone(),
                    behavior: sim.agent.behavior(),
                    position: sim.nav.position,
                    panel_alarms: counters.panel_alarms(),
                    summons: counters.summons(),
                    instakills: counters.instakills(),
                    attacks: sim.weapon.attacks.len(),
                }
            })
            .collect();

        SimSummary {
            elapsed: self.time,
            ticks: self.ticks,
            events: self.events_seen,
            transitions: self.transitions,
            panels_triggered: self.alarms.panels().iter().filter(|p| p.triggered).count(),
            bodies: self.bodies.len(),
            agents,
        }
    }
}

/// Removes and returns the entries of a time-sorted script that are due.
fn take_due<T>(script: &mut Vec<T>, now: f32, at: impl Fn(&T) -> f32) -> Vec<T> {
    let due = script.iter().take_while(|item| at(item) <= now).count();
    script.drain(..due).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentSpec, PlayerKey};
    use sentinel_ai::{AgentConfig, AlarmType, InitialBehavior};
    use std::collections::BTreeMap;

    fn scenario(archetype: AgentConfig, agents: Vec<AgentSpec>) -> SimConfig {
        let mut archetypes = BTreeMap::new();
        archetypes.insert(String::from("grunt"), archetype);
        SimConfig {
            tick_rate: 10,
            duration_secs: 5.0,
            log_events: false,
            archetypes,
            agents,
            panels: Vec::new(),
            walls: Vec::new(),
            player: Vec::new(),
            noises: Vec::new(),
            hits: Vec::new(),
            ..SimConfig::default()
        }
    }

    fn guard() -> AgentConfig {
        AgentConfig::default()
            .with_initial_behavior(InitialBehavior::Guard)
            .with_alarm_type(AlarmType::None)
    }

    fn post(name: &str) -> AgentSpec {
        AgentSpec {
            name: name.to_owned(),
            ..AgentSpec::default()
        }
    }

    #[test]
    fn test_default_scenario_runs() {
        let mut sim = Simulation::new(SimConfig {
            log_events: false,
            ..SimConfig::default()
        })
        .expect("default scenario builds");
        let summary = sim.run();
        assert_eq!(summary.ticks, 1200);
        assert_eq!(summary.agents.len(), 3);
        assert!(summary.transitions >= 3);
    }

    #[test]
    fn test_idle_guard_reaches_post() {
        let mut sim = Simulation::new(scenario(guard(), vec![post("gate")])).expect("builds");
        let summary = sim.run();
        assert_eq!(summary.agents[0].behavior, BehaviorTag::Guard);
        assert_eq!(summary.agents[0].attacks, 0);
    }

    #[test]
    fn test_guard_engages_visible_player() {
        let mut config = scenario(guard(), vec![post("gate")]);
        config.player = vec![PlayerKey {
            at: 0.0,
            position: Vec3::new(0.0, 0.0, 3.0),
        }];
        let mut sim = Simulation::new(config).expect("builds");
        let summary = sim.run();

        let gate = &summary.agents[0];
        assert!(matches!(gate.behavior, BehaviorTag::Combat | BehaviorTag::Attack));
        assert!(gate.attacks >= 1);
    }

    #[test]
    fn test_killed_agent_leaves_a_body() {
        let mut spec = post("doomed");
        spec.killed_at = Some(2.0);
        let mut sim = Simulation::new(scenario(guard(), vec![spec])).expect("builds");
        let summary = sim.run();
        assert_eq!(summary.agents[0].behavior, BehaviorTag::Death);
        assert_eq!(summary.bodies, 1);
    }

    #[test]
    fn test_hit_sends_agent_into_combat() {
        let mut config = scenario(guard(), vec![post("gate")]);
        config.duration_secs = 2.0;
        config.hits.push(HitSpec {
            at: 1.5,
            agent: String::from("gate"),
            from: Vec3::new(0.0, 0.0, -4.0),
        });
        let mut sim = Simulation::new(config).expect("builds");
        sim.run();
        let gate = sim.agent("gate").expect("placed");
        assert_eq!(gate.last_known_position(), Some(Vec3::new(0.0, 0.0, -4.0)));
        assert_ne!(gate.behavior(), BehaviorTag::Guard);
    }

    #[test]
    fn test_noise_out_of_radius_is_not_heard() {
        let patrol = AgentConfig::default().with_alarm_type(AlarmType::None);
        let mut config = scenario(patrol, vec![post("walker")]);
        config.noises.push(NoiseSpec {
            at: 2.0,
            origin: Vec3::new(50.0, 0.0, 0.0),
            intensity: 1.0,
            radius: 10.0,
        });
        let mut sim = Simulation::new(config).expect("builds");
        let summary = sim.run();
        assert_eq!(summary.agents[0].behavior, BehaviorTag::Patrol);
    }

    #[test]
    fn test_take_due_is_ordered() {
        let mut script = vec![1.0_f32, 2.0, 3.0];
        assert_eq!(take_due(&mut script, 2.0, |t| *t), vec![1.0, 2.0]);
        assert_eq!(script, vec![3.0]);
    }
}
