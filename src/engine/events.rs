//! Typed events exchanged with the transport layer.
//!
//! Framing, reconnection, and backpressure belong to the transport
//! collaborator. The engine only guarantees the orchestration-level ordering
//! contract: a given persona's `PersonaTypingStart` is emitted before its
//! `PersonaResponse`; distinct personas may interleave.

use serde::{Deserialize, Serialize};

use super::persona::Persona;
use super::types::{AiResponse, OrchestrationResult};

/// The inbound message frame a transport hands to the engine's host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub conversation_id: String,
    pub text: String,
}

/// Events emitted while a turn runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TurnEvent {
    /// A persona's generation call is about to be issued.
    PersonaTypingStart { persona: Persona },
    /// A persona's generation call succeeded.
    PersonaResponse(AiResponse),
    /// A call was blocked by the health tracker before being attempted.
    ServiceUnavailable {
        service: String,
        retry_after_secs: u64,
    },
    /// The turn finished; carries the outward-facing result.
    TurnComplete(OrchestrationResult),
}

/// Sink the orchestrator emits turn events into.
///
/// Implementations must tolerate being called from concurrent persona tasks.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: TurnEvent);
}

/// Sink that drops every event. Used when no transport is attached.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: TurnEvent) {}
}

/// Sink that records events in memory. Test double for ordering assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<TurnEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TurnEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: TurnEvent) {
        self.events.lock().unwrap().push(event);
    }
}
