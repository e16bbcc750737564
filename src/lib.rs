pub mod engine;
pub mod error;
pub mod logging;

pub use engine::conflict::ConflictDetector;
pub use engine::context::{ChatMessage, Complexity, ConversationContext, MessageRole};
pub use engine::events::{EventSink, NullSink, TurnEvent, UserMessage};
pub use engine::health::{GuardError, HealthConfig, ServiceHealthTracker, ServiceStatus};
pub use engine::orchestrator::Orchestrator;
pub use engine::persona::Persona;
pub use engine::phase::{phase_progress, ConversationPhase, PhaseProgress};
pub use engine::provider::{GenerationProvider, ProviderError};
pub use engine::triggers::{select_personas, KeywordTriggers, TriggerHeuristic, TriggerRule};
pub use engine::types::{AiResponse, OrchestrationResult, TurnOutcome};
pub use error::EngineError;
