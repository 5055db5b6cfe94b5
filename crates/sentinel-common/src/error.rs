//! Error types for Project Sentinel.

use crate::ids::PanelId;
use thiserror::Error;

/// Top-level error type for Sentinel operations.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Escalation errors
    #[error("Escalation error: {0}")]
    Escalation(#[from] EscalationError),

    /// Background task errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric parameter is outside its allowed range
    #[error("Invalid value for `{field}`: {value} ({reason})")]
    InvalidValue {
        /// Offending field name
        field: &'static str,
        /// Value found
        value: f32,
        /// Why the value was rejected
        reason: &'static str,
    },

    /// Config text could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Patrol route is unusable
    #[error("Invalid patrol route: {0}")]
    InvalidRoute(String),
}

/// Escalation (alarm/signal) errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EscalationError {
    /// Counter is already at its configured cap
    #[error("{counter} counter at cap {cap}")]
    CapReached {
        /// Counter name
        counter: &'static str,
        /// Configured cap
        cap: u32,
    },

    /// Signal alarm requested without a signal assigned
    #[error("No signal assigned to this agent")]
    NoSignalAssigned,

    /// Panel id not present in the registry
    #[error("Unknown alarm panel: {0}")]
    UnknownPanel(PanelId),
}

/// Background task errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// A background task is already running for this agent
    #[error("Background task slot already occupied by {0}")]
    SlotOccupied(&'static str),
}

/// Result type alias for Sentinel operations.
pub type SentinelResult<T> = Result<T, SentinelError>;
