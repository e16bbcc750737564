//! Result types produced by one orchestration turn.

use serde::{Deserialize, Serialize};

use super::context::ConversationContext;
use super::persona::Persona;

/// One successful generation call's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub persona: Persona,
    pub content: String,
    pub tokens: u32,
    pub processing_time_ms: u64,
}

/// The outward-facing result of one user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Responses in stable persona order. Empty when every call failed.
    pub responses: Vec<AiResponse>,
    /// True only at/after task planning when the batch carries an explicit
    /// completion signal.
    pub is_complete: bool,
    /// Short next-step prompts keyed by phase and response content.
    pub suggested_actions: Vec<String>,
}

impl OrchestrationResult {
    /// The well-formed empty result returned when a turn produces nothing.
    pub fn empty() -> Self {
        Self {
            responses: Vec::new(),
            is_complete: false,
            suggested_actions: Vec::new(),
        }
    }
}

/// A turn's result together with the revised conversation context.
///
/// The orchestrator never mutates the caller's context; the revised copy
/// travels here so the storage collaborator can persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub result: OrchestrationResult,
    pub context: ConversationContext,
}
