//! # Sentinel AI
//!
//! NPC behavior engine for Project Sentinel.
//!
//! This crate decides what a non-player agent does each simulation tick:
//! - Hierarchical state machine (Spawn, Patrol, Guard, Alert, Alarm, Combat, Attack, Death)
//! - Perception (vision cone, line of sight, dead-body scan, hearing)
//! - Alarm coordination with capped escalation counters
//! - Cancellable background tasks (patrol loop, investigation, signal cast)
//! - Capability ports for movement, animation, weapons and signals
//! - Event bus for animation/audio/UI collaborators
//! - Test doubles for every port

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod alarm;
pub mod config;
pub mod context;
pub mod events;
pub mod machine;
pub mod mock;
pub mod perception;
pub mod ports;
pub mod route;
pub mod runtime;
pub mod states;
pub mod task;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::alarm::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::events::*;
    pub use crate::machine::*;
    pub use crate::mock::*;
    pub use crate::perception::*;
    pub use crate::ports::*;
    pub use crate::route::*;
    pub use crate::runtime::*;
    pub use crate::states::*;
    pub use crate::task::*;
    pub use crate::world::*;
}

pub use prelude::*;
