//! Abstraction over the upstream text-generation provider.
//!
//! The engine consumes exactly one capability: generate a persona's reply for
//! the current conversation. Auth, quota, network, and timeout faults all
//! surface as a single opaque error; the core only distinguishes
//! success from failure. Timeouts are owned by the provider implementation.

use async_trait::async_trait;

use super::context::ConversationContext;
use super::persona::Persona;
use super::types::AiResponse;

/// Opaque provider-side fault. The engine never branches on the message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("generation failed: {0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// The consumed generation capability.
///
/// Each provider knows how to:
/// - Identify itself for health tracking (`service_name`)
/// - Produce one persona's reply given the conversation context
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Upstream service name the health tracker keys failures by
    /// (e.g. "openai").
    fn service_name(&self) -> &str;

    /// Generate one persona's reply to the user message.
    async fn generate(
        &self,
        persona: Persona,
        context: &ConversationContext,
        message: &str,
    ) -> Result<AiResponse, ProviderError>;
}
