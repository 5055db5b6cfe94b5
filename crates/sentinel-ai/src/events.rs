//! Behavior events broadcast to external collaborators.
//!
//! Animation, audio and UI layers subscribe through an [`EventBus`]. Agents
//! only ever hold an [`EventPublisher`], which never blocks: when the bus is
//! full the event is dropped.

use crate::alarm::SignalKind;
use crate::states::BehaviorTag;
use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec3;
use sentinel_common::{EntityId, PanelId};
use serde::{Deserialize, Serialize};

/// Why an escalation fell back to Combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegradeReason {
    /// Signal alarm with no signal assigned
    NoSignalAssigned,
    /// No alarm panel inside the search radius
    NoPanelInRange,
    /// Path to the chosen panel failed
    PanelUnreachable,
    /// The matching counter is at its cap
    CapReached,
}

/// Behavior events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BehaviorEvent {
    /// Active state changed
    StateChanged {
        /// Agent
        agent: EntityId,
        /// Previous state
        from: BehaviorTag,
        /// New state
        to: BehaviorTag,
    },
    /// An alarm panel was triggered
    PanelTriggered {
        /// Agent
        agent: EntityId,
        /// Panel
        panel: PanelId,
        /// Panel alarm count after the increment
        count: u32,
    },
    /// A signal cast completed
    SignalRaised {
        /// Agent
        agent: EntityId,
        /// Signal kind
        signal: SignalKind,
        /// Cast position
        origin: Vec3,
        /// Counter value after the increment
        count: u32,
    },
    /// Cast progress, reported every tick while channeling
    CastProgress {
        /// Agent
        agent: EntityId,
        /// Signal kind
        signal: SignalKind,
        /// Fraction in 0..=1
        progress: f32,
    },
    /// A cast was interrupted by death
    CastAborted {
        /// Agent
        agent: EntityId,
        /// Signal kind
        signal: SignalKind,
    },
    /// An escalation degraded to Combat
    EscalationDegraded {
        /// Agent
        agent: EntityId,
        /// Reason
        reason: DegradeReason,
    },
}

impl BehaviorEvent {
    /// Agent that produced the event.
    #[must_use]
    pub const fn agent(&self) -> EntityId {
        match self {
            Self::StateChanged { agent, .. }
            | Self::PanelTriggered { agent, .. }
            | Self::SignalRaised { agent, .. }
            | Self::CastProgress { agent, .. }
            | Self::CastAborted { agent, .. }
            | Self::EscalationDegraded { agent, .. } => *agent,
        }
    }
}

/// Event bus for behavior events.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<BehaviorEvent>,
    receiver: Receiver<BehaviorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a publisher handle for an agent.
    #[must_use]
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            sender: Some(self.sender.clone()),
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<BehaviorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

/// Non-blocking publishing handle.
#[derive(Debug, Clone, Default)]
pub struct EventPublisher {
    sender: Option<Sender<BehaviorEvent>>,
}

impl EventPublisher {
    /// A publisher that discards everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { sender: None }
    }

    /// Whether events go anywhere.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Publishes an event; dropped if the bus is full.
    pub fn publish(&self, event: BehaviorEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(event);
        }
    }
}
