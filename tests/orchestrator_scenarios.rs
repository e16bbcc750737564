//! End-to-end turn scenarios driven through a scripted provider double.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use roundtable_engine::{
    AiResponse, ConversationContext, ConversationPhase, GenerationProvider, Orchestrator, Persona,
    ProviderError, ServiceHealthTracker, TurnEvent,
};
use roundtable_engine::engine::events::RecordingSink;

// =============================================================================
// Scripted provider
// =============================================================================

/// Provider double that answers each persona from a fixed script.
/// Personas without a script entry fail; `Err` entries fail with that message.
struct ScriptedProvider {
    replies: HashMap<Persona, Result<String, String>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    fn new(replies: Vec<(Persona, Result<&str, &str>)>) -> Self {
        Self {
            replies: replies
                .into_iter()
                .map(|(p, r)| (p, r.map(String::from).map_err(String::from)))
                .collect(),
            calls: AtomicU32::new(0),
        }
    }

    fn failing() -> Self {
        Self::new(Vec::new())
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn service_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        persona: Persona,
        _context: &ConversationContext,
        _message: &str,
    ) -> Result<AiResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(&persona) {
            Some(Ok(content)) => Ok(AiResponse {
                persona,
                content: content.clone(),
                tokens: content.len() as u32,
                processing_time_ms: 5,
            }),
            Some(Err(msg)) => Err(ProviderError::new(msg.clone())),
            None => Err(ProviderError::new("no script for persona")),
        }
    }
}

fn context_in(phase: ConversationPhase) -> ConversationContext {
    let mut ctx = ConversationContext::new("conv-1", "recipe sharing app");
    ctx.current_phase = phase;
    ctx
}

fn orchestrator(provider: ScriptedProvider) -> (Orchestrator, Arc<ServiceHealthTracker>) {
    let health = Arc::new(ServiceHealthTracker::default());
    (
        Orchestrator::new(Arc::new(provider), health.clone()),
        health,
    )
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn single_discovery_turn_returns_one_pm_response() {
    let provider = ScriptedProvider::new(vec![(
        Persona::ProductManager,
        Ok("Tell me more about your target users."),
    )]);
    let (orch, _) = orchestrator(provider);
    let ctx = context_in(ConversationPhase::InitialDiscovery);

    let outcome = orch
        .orchestrate(&ctx, "I want an app to share recipes", &CancellationToken::new())
        .await;

    assert_eq!(outcome.result.responses.len(), 1);
    assert_eq!(outcome.result.responses[0].persona, Persona::ProductManager);
    assert!(!outcome.result.is_complete);
    assert!(!outcome.result.suggested_actions.is_empty());
}

#[tokio::test]
async fn conflicting_architecture_turn_collapses_to_arbiter() {
    let provider = ScriptedProvider::new(vec![
        (
            Persona::TechLead,
            Ok("I recommend PostgreSQL for the relational model."),
        ),
        (
            Persona::ProductManager,
            Ok("I disagree — I suggest a document store instead, it ships faster."),
        ),
        (
            Persona::ScrumMaster,
            Ok("Both views have merit; start relational, revisit if the schema churns."),
        ),
    ]);
    let (orch, _) = orchestrator(provider);
    let ctx = context_in(ConversationPhase::TechnicalArchitecture);

    let outcome = orch
        .orchestrate(&ctx, "what database should we use?", &CancellationToken::new())
        .await;

    assert_eq!(outcome.result.responses.len(), 1);
    assert_eq!(outcome.result.responses[0].persona, Persona::ScrumMaster);
    // Originals survive in history even though the outward batch was replaced.
    let persona_messages: Vec<_> = outcome
        .context
        .previous_messages
        .iter()
        .filter_map(|m| m.persona)
        .collect();
    assert!(persona_messages.contains(&Persona::TechLead));
    assert!(persona_messages.contains(&Persona::ProductManager));
    assert!(persona_messages.contains(&Persona::ScrumMaster));
}

#[tokio::test]
async fn arbiter_failure_degrades_to_unresolved_batch() {
    let provider = ScriptedProvider::new(vec![
        (Persona::TechLead, Ok("I recommend GraphQL.")),
        (
            Persona::ProductManager,
            Ok("I disagree, I suggest plain REST instead."),
        ),
        (Persona::ScrumMaster, Err("provider outage")),
    ]);
    let (orch, _) = orchestrator(provider);
    let ctx = context_in(ConversationPhase::TechnicalArchitecture);

    let outcome = orch
        .orchestrate(&ctx, "API style?", &CancellationToken::new())
        .await;

    assert_eq!(outcome.result.responses.len(), 2);
    let personas: Vec<_> = outcome.result.responses.iter().map(|r| r.persona).collect();
    assert_eq!(personas, vec![Persona::ProductManager, Persona::TechLead]);
}

#[tokio::test]
async fn total_failure_returns_empty_result_without_raising() {
    let (orch, health) = orchestrator(ScriptedProvider::failing());
    let ctx = context_in(ConversationPhase::InitialDiscovery);

    let outcome = orch
        .orchestrate(&ctx, "hello?", &CancellationToken::new())
        .await;

    assert!(outcome.result.responses.is_empty());
    assert!(!outcome.result.is_complete);
    assert!(outcome.result.suggested_actions.is_empty());
    assert_eq!(health.status("scripted").consecutive_failures, 1);
}

#[tokio::test]
async fn repeated_failures_open_circuit_and_skip_calls() {
    let provider = ScriptedProvider::failing();
    let health = Arc::new(ServiceHealthTracker::default());
    let provider = Arc::new(provider);
    let sink = Arc::new(RecordingSink::new());
    let orch = Orchestrator::new(provider.clone(), health.clone()).with_sink(sink.clone());
    let ctx = context_in(ConversationPhase::InitialDiscovery);
    let cancel = CancellationToken::new();

    // Three failing turns (one PM call each) open the circuit.
    for _ in 0..3 {
        orch.orchestrate(&ctx, "anyone there?", &cancel).await;
    }
    assert!(!health.is_available("scripted"));
    let calls_before = provider.call_count();

    // Next turn must not spend a provider call.
    orch.orchestrate(&ctx, "still there?", &cancel).await;
    assert_eq!(provider.call_count(), calls_before);
    assert!(sink.events().iter().any(|e| matches!(
        e,
        TurnEvent::ServiceUnavailable { service, retry_after_secs }
            if service == "scripted" && *retry_after_secs > 0
    )));
}

#[tokio::test]
async fn completion_phrase_in_task_planning_completes_turn() {
    let provider = ScriptedProvider::new(vec![
        (
            Persona::ScrumMaster,
            Ok("The backlog is groomed — we have everything we need. Ready to generate the specification."),
        ),
        (Persona::ProductManager, Ok("Agreed, milestones look good.")),
    ]);
    let (orch, _) = orchestrator(provider);
    let ctx = context_in(ConversationPhase::TaskPlanning);

    let outcome = orch
        .orchestrate(&ctx, "are we done planning?", &CancellationToken::new())
        .await;

    assert!(outcome.result.is_complete);
}

#[tokio::test]
async fn completion_phrase_before_task_planning_is_ignored() {
    let provider = ScriptedProvider::new(vec![(
        Persona::ProductManager,
        Ok("We have everything we need. Ready to generate the specification."),
    )]);
    let (orch, _) = orchestrator(provider);
    let ctx = context_in(ConversationPhase::InitialDiscovery);

    let outcome = orch
        .orchestrate(&ctx, "done?", &CancellationToken::new())
        .await;

    assert!(!outcome.result.is_complete);
}

#[tokio::test]
async fn per_persona_event_ordering_holds() {
    let provider = ScriptedProvider::new(vec![
        (Persona::TechLead, Ok("Here is the stack I would pick.")),
        (Persona::ProductManager, Ok("Here are the requirements.")),
    ]);
    let health = Arc::new(ServiceHealthTracker::default());
    let sink = Arc::new(RecordingSink::new());
    let orch = Orchestrator::new(Arc::new(provider), health).with_sink(sink.clone());
    let ctx = context_in(ConversationPhase::TechnicalArchitecture);

    orch.orchestrate(&ctx, "proposed stack?", &CancellationToken::new())
        .await;

    let events = sink.events();
    for persona in [Persona::ProductManager, Persona::TechLead] {
        let start = events
            .iter()
            .position(|e| matches!(e, TurnEvent::PersonaTypingStart { persona: p } if *p == persona));
        let response = events
            .iter()
            .position(|e| matches!(e, TurnEvent::PersonaResponse(r) if r.persona == persona));
        assert!(start.unwrap() < response.unwrap(), "{persona} out of order");
    }
    assert!(matches!(events.last(), Some(TurnEvent::TurnComplete(_))));
}

#[tokio::test]
async fn cancelled_turn_discards_results_and_context() {
    let provider = ScriptedProvider::new(vec![(
        Persona::ProductManager,
        Ok("You should never see this."),
    )]);
    let (orch, _) = orchestrator(provider);
    let ctx = context_in(ConversationPhase::InitialDiscovery);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = orch.orchestrate(&ctx, "hello", &cancel).await;

    assert!(outcome.result.responses.is_empty());
    assert_eq!(outcome.context, ctx);
}

#[tokio::test]
async fn revised_context_carries_turn_history() {
    let provider = ScriptedProvider::new(vec![(
        Persona::ProductManager,
        Ok("Who are the target users?"),
    )]);
    let (orch, _) = orchestrator(provider);
    let ctx = context_in(ConversationPhase::InitialDiscovery);

    let outcome = orch
        .orchestrate(&ctx, "a recipe app", &CancellationToken::new())
        .await;

    // Caller's context untouched; revised copy has user + persona messages.
    assert!(ctx.previous_messages.is_empty());
    assert_eq!(outcome.context.previous_messages.len(), 2);
    assert_eq!(outcome.context.previous_messages[0].content, "a recipe app");
    assert!(outcome
        .context
        .active_personas
        .contains(&Persona::ProductManager));
}

#[tokio::test]
async fn standalone_conflict_entry_point_routes_through_arbiter() {
    let provider = ScriptedProvider::new(vec![(
        Persona::ScrumMaster,
        Ok("Reconciled: phase the rollout."),
    )]);
    let (orch, _) = orchestrator(provider);
    let ctx = context_in(ConversationPhase::Infrastructure);

    let conflicting = vec![
        AiResponse {
            persona: Persona::Devops,
            content: "Ship on Kubernetes day one.".into(),
            tokens: 10,
            processing_time_ms: 5,
        },
        AiResponse {
            persona: Persona::TechLead,
            content: "A single VM is plenty for now.".into(),
            tokens: 10,
            processing_time_ms: 5,
        },
    ];

    let resolution = orch
        .handle_persona_conflict(&ctx, &conflicting)
        .await
        .expect("arbiter call should succeed");
    assert_eq!(resolution.persona, Persona::ScrumMaster);
}
