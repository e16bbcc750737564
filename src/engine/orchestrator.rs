//! Top-level per-turn coordinator.
//!
//! One invocation per inbound user message. Persona generation calls are
//! issued concurrently, each guarded by the service health tracker; failures
//! are absorbed at the call site and never surface to the caller —
//! `orchestrate` always returns a well-formed outcome, even an empty one.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

use super::conflict::{build_resolution_prompt, ConflictDetector};
use super::context::{ChatMessage, ConversationContext};
use super::events::{EventSink, NullSink, TurnEvent};
use super::health::{GuardError, ServiceHealthTracker};
use super::persona::Persona;
use super::phase::ConversationPhase;
use super::provider::GenerationProvider;
use super::suggestions::{completion_signaled, suggested_actions};
use super::triggers::{select_personas, KeywordTriggers, TriggerHeuristic};
use super::types::{AiResponse, OrchestrationResult, TurnOutcome};

/// Coordinates one conversation turn across personas, health tracking,
/// conflict resolution, and event emission.
///
/// Every dependency is constructed and injected; there is no ambient state.
/// The health tracker is shared process-wide across orchestrator instances
/// and conversations. Concurrent orchestration of the *same* conversation is
/// the caller's responsibility to prevent.
pub struct Orchestrator {
    provider: Arc<dyn GenerationProvider>,
    health: Arc<ServiceHealthTracker>,
    triggers: Box<dyn TriggerHeuristic>,
    conflicts: ConflictDetector,
    sink: Arc<dyn EventSink>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn GenerationProvider>, health: Arc<ServiceHealthTracker>) -> Self {
        Self {
            provider,
            health,
            triggers: Box::new(KeywordTriggers::default()),
            conflicts: ConflictDetector::default(),
            sink: Arc::new(NullSink),
        }
    }

    /// Replace the default keyword trigger heuristic.
    pub fn with_triggers(mut self, triggers: Box<dyn TriggerHeuristic>) -> Self {
        self.triggers = triggers;
        self
    }

    /// Replace the default conflict detector.
    pub fn with_conflict_detector(mut self, detector: ConflictDetector) -> Self {
        self.conflicts = detector;
        self
    }

    /// Attach a transport event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Run one turn for `user_message`.
    ///
    /// The caller's context is never mutated; the revised copy (user message
    /// and surviving responses appended, selected personas engaged) is
    /// returned in the outcome. When `cancel` fires before the persona calls
    /// resolve, in-flight results are discarded and the original context
    /// comes back unchanged with an empty result.
    pub async fn orchestrate(
        &self,
        context: &ConversationContext,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let personas = select_personas(context, user_message, self.triggers.as_ref());
        tracing::info!(
            conversation_id = %context.conversation_id,
            phase = %context.current_phase,
            personas = personas.len(),
            "Orchestrating turn",
        );

        let collected = self
            .run_persona_calls(context, user_message, &personas, cancel)
            .await;

        if cancel.is_cancelled() {
            tracing::info!(
                conversation_id = %context.conversation_id,
                "Turn cancelled, discarding in-flight results",
            );
            return TurnOutcome {
                result: OrchestrationResult::empty(),
                context: context.clone(),
            };
        }

        let mut working = context.with_message(ChatMessage::user(user_message));
        for persona in &personas {
            working.active_personas.insert(*persona);
        }

        if collected.is_empty() {
            tracing::warn!(
                conversation_id = %context.conversation_id,
                "Every persona call failed this turn",
            );
            let result = OrchestrationResult::empty();
            self.sink.emit(TurnEvent::TurnComplete(result.clone()));
            return TurnOutcome {
                result,
                context: working,
            };
        }

        // Conflicting originals stay in history; only the outward batch is
        // replaced by the arbiter's resolution.
        for response in &collected {
            working.previous_messages.push(ChatMessage::persona(
                response.persona,
                response.content.clone(),
            ));
        }

        let responses = if collected.len() >= 2
            && self.conflicts.detect(context.current_phase, &collected)
        {
            match self.resolve_with_arbiter(&working, &collected).await {
                Ok(resolution) => {
                    working.previous_messages.push(ChatMessage::persona(
                        resolution.persona,
                        resolution.content.clone(),
                    ));
                    vec![resolution]
                }
                Err(err) => {
                    tracing::warn!(
                        conversation_id = %context.conversation_id,
                        error = %err,
                        "Arbiter call failed, returning unresolved responses",
                    );
                    collected
                }
            }
        } else {
            collected
        };

        let is_complete = context
            .current_phase
            .is_at_or_after(ConversationPhase::TaskPlanning)
            && completion_signaled(&responses);

        let result = OrchestrationResult {
            suggested_actions: suggested_actions(context.current_phase, &responses),
            responses,
            is_complete,
        };
        self.sink.emit(TurnEvent::TurnComplete(result.clone()));

        TurnOutcome {
            result,
            context: working,
        }
    }

    /// Standalone conflict resolution entry point. Routes through the arbiter
    /// (Scrum Master) regardless of which personas were in conflict.
    pub async fn handle_persona_conflict(
        &self,
        context: &ConversationContext,
        conflicting: &[AiResponse],
    ) -> Result<AiResponse, EngineError> {
        self.resolve_with_arbiter(context, conflicting).await
    }

    /// Issue one guarded generation call per persona, concurrently.
    ///
    /// Per-persona event ordering holds: a persona's TypingStart is emitted
    /// before its PersonaResponse. Failed or blocked calls contribute
    /// nothing; the batch keeps the stable persona order of `personas`.
    async fn run_persona_calls(
        &self,
        context: &ConversationContext,
        user_message: &str,
        personas: &[Persona],
        cancel: &CancellationToken,
    ) -> Vec<AiResponse> {
        let calls = personas.iter().map(|&persona| {
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    response = self.guarded_generate(persona, context, user_message) => response,
                }
            }
        });

        join_all(calls)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// One persona's call through the health tracker. Absorbs every failure.
    async fn guarded_generate(
        &self,
        persona: Persona,
        context: &ConversationContext,
        message: &str,
    ) -> Option<AiResponse> {
        let service = self.provider.service_name().to_string();
        self.sink.emit(TurnEvent::PersonaTypingStart { persona });

        let outcome = self
            .health
            .wrap(&service, || self.provider.generate(persona, context, message))
            .await;

        match outcome {
            Ok(response) => {
                tracing::debug!(
                    persona = %persona,
                    tokens = response.tokens,
                    elapsed_ms = response.processing_time_ms,
                    "Persona responded",
                );
                self.sink.emit(TurnEvent::PersonaResponse(response.clone()));
                Some(response)
            }
            Err(GuardError::Open {
                service,
                retry_after_secs,
            }) => {
                tracing::warn!(
                    persona = %persona,
                    service = %service,
                    retry_after_secs,
                    "Skipping persona call, circuit open",
                );
                self.sink.emit(TurnEvent::ServiceUnavailable {
                    service,
                    retry_after_secs,
                });
                None
            }
            Err(GuardError::Failed {
                service,
                status,
                source,
            }) => {
                tracing::warn!(
                    persona = %persona,
                    service = %service,
                    failures = status.consecutive_failures,
                    error = %source,
                    "Persona call failed",
                );
                None
            }
        }
    }

    /// One guarded arbiter call over the conflicting batch.
    async fn resolve_with_arbiter(
        &self,
        context: &ConversationContext,
        conflicting: &[AiResponse],
    ) -> Result<AiResponse, EngineError> {
        let prompt = build_resolution_prompt(conflicting);
        let service = self.provider.service_name().to_string();
        self.sink.emit(TurnEvent::PersonaTypingStart {
            persona: Persona::ARBITER,
        });

        let resolution = self
            .health
            .wrap(&service, || {
                self.provider.generate(Persona::ARBITER, context, &prompt)
            })
            .await?;

        self.sink
            .emit(TurnEvent::PersonaResponse(resolution.clone()));
        Ok(resolution)
    }
}
