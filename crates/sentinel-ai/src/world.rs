//! The world as seen by an agent during one call.
//!
//! Everything here is owned by the composition root and lent to an agent
//! per update: its pose, the player's position, obstruction geometry, the
//! dead-body registry and the shared alarm coordinator.

use crate::alarm::AlarmCoordinator;
use ahash::AHashMap;
use glam::{Vec2, Vec3};
use sentinel_common::{ground, segments_intersect, EntityId};
use serde::{Deserialize, Serialize};

/// Position and facing of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    /// World position (eye point)
    pub position: Vec3,
    /// Forward vector, not necessarily normalized
    pub forward: Vec3,
}

impl AgentPose {
    /// Creates a pose.
    #[must_use]
    pub const fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }
}

impl Default for AgentPose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}

/// Obstruction-layer query used for line of sight.
pub trait ObstructionQuery {
    /// Whether anything blocks the segment `from`-`to`.
    fn is_obstructed(&self, from: Vec3, to: Vec3) -> bool;
}

/// Open terrain: nothing ever blocks sight.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGround;

impl ObstructionQuery for OpenGround {
    fn is_obstructed(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }
}

/// A wall segment on the ground plane, infinitely tall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// First endpoint (x, z)
    pub start: Vec2,
    /// Second endpoint (x, z)
    pub end: Vec2,
}

/// Set of walls tested on the XZ plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WallSet {
    walls: Vec<Wall>,
}

impl WallSet {
    /// Creates an empty wall set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a wall between two ground-plane points.
    pub fn add(&mut self, start: Vec2, end: Vec2) {
        self.walls.push(Wall { start, end });
    }

    /// Adds a wall and returns self.
    #[must_use]
    pub fn with_wall(mut self, start: Vec2, end: Vec2) -> Self {
        self.add(start, end);
        self
    }

    /// Number of walls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.walls.len()
    }

    /// Whether there are no walls.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }
}

impl ObstructionQuery for WallSet {
    fn is_obstructed(&self, from: Vec3, to: Vec3) -> bool {
        let (a, b) = (ground(from), ground(to));
        self.walls
            .iter()
            .any(|wall| segments_intersect(a, b, wall.start, wall.end))
    }
}

/// Positions of entities tagged dead.
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    bodies: AHashMap<EntityId, Vec3>,
}

impl BodyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags an entity as dead at a position.
    pub fn mark_dead(&mut self, entity: EntityId, position: Vec3) {
        self.bodies.insert(entity, position);
    }

    /// Removes a body after cleanup.
    pub fn remove(&mut self, entity: EntityId) -> Option<Vec3> {
        self.bodies.remove(&entity)
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether there are no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Whether any body lies within `radius` of `position`.
    #[must_use]
    pub fn any_within(&self, position: Vec3, radius: f32) -> bool {
        self.bodies
            .values()
            .any(|body| body.distance(position) <= radius)
    }
}

/// World view lent to an agent for one call.
pub struct Surroundings<'w> {
    /// The agent's own pose
    pub pose: AgentPose,
    /// Player position, if the player exists
    pub target: Option<Vec3>,
    /// Liveness reported by the health collaborator
    pub alive: bool,
    /// Obstruction layer for line of sight
    pub obstruction: &'w dyn ObstructionQuery,
    /// Dead bodies
    pub bodies: &'w BodyRegistry,
    /// Alarm panels and escalation bookkeeping
    pub alarms: &'w mut AlarmCoordinator,
}

impl<'w> Surroundings<'w> {
    /// Creates a view with a live agent and no player.
    pub fn new(
        pose: AgentPose,
        obstruction: &'w dyn ObstructionQuery,
        bodies: &'w BodyRegistry,
        alarms: &'w mut AlarmCoordinator,
    ) -> Self {
        Self {
            pose,
            target: None,
            alive: true,
            obstruction,
            bodies,
            alarms,
        }
    }

    /// Sets the player position.
    #[must_use]
    pub fn with_target(mut self, target: Option<Vec3>) -> Self {
        self.target = target;
        self
    }

    /// Sets the liveness flag.
    #[must_use]
    pub fn with_alive(mut self, alive: bool) -> Self {
        self.alive = alive;
        self
    }
}
