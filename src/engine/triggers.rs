//! Persona selection: phase defaults plus contextual keyword triggers.
//!
//! The keyword heuristic is deliberately pluggable — a model-based classifier
//! can replace [`KeywordTriggers`] without touching the orchestrator's
//! control flow. The vocabularies are tunable data, not a contract.

use super::context::ConversationContext;
use super::persona::Persona;
use super::phase::ConversationPhase;

/// How many recent user messages the contextual scan looks back over, in
/// addition to the new message.
const TRIGGER_HISTORY_WINDOW: usize = 2;

// =============================================================================
// Trigger heuristic seam
// =============================================================================

/// Maps free text to the personas whose expertise it touches.
pub trait TriggerHeuristic: Send + Sync {
    fn personas_for(&self, text: &str) -> Vec<Persona>;
}

/// Default keyword-based heuristic.
pub struct KeywordTriggers {
    rules: Vec<TriggerRule>,
}

/// One persona's trigger vocabulary. Matching is lowercase substring search,
/// so stems like "deploy" also catch "deployment".
pub struct TriggerRule {
    pub persona: Persona,
    pub keywords: Vec<&'static str>,
}

impl Default for KeywordTriggers {
    fn default() -> Self {
        Self {
            rules: vec![
                TriggerRule {
                    persona: Persona::UxDesigner,
                    keywords: vec![
                        "interface", "ui", "ux", "design", "accessib", "usability",
                        "wireframe", "user flow", "layout", "mockup",
                    ],
                },
                TriggerRule {
                    persona: Persona::Devops,
                    keywords: vec![
                        "deploy", "infrastructure", "docker", "kubernetes", "ci/cd",
                        "pipeline", "hosting", "scaling", "monitoring", "cloud",
                    ],
                },
                TriggerRule {
                    persona: Persona::TechLead,
                    keywords: vec![
                        "architecture", "database", "api", "tech stack", "framework",
                        "performance", "security", "integration",
                    ],
                },
                TriggerRule {
                    persona: Persona::ProductManager,
                    keywords: vec![
                        "requirement", "feature", "scope", "priorit", "stakeholder",
                        "roadmap", "mvp",
                    ],
                },
                TriggerRule {
                    persona: Persona::ScrumMaster,
                    keywords: vec![
                        "sprint", "estimate", "timeline", "milestone", "backlog",
                        "deadline",
                    ],
                },
            ],
        }
    }
}

impl KeywordTriggers {
    pub fn new(rules: Vec<TriggerRule>) -> Self {
        Self { rules }
    }
}

impl TriggerHeuristic for KeywordTriggers {
    fn personas_for(&self, text: &str) -> Vec<Persona> {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.keywords.iter().any(|kw| lower.contains(kw)))
            .map(|rule| rule.persona)
            .collect()
    }
}

// =============================================================================
// Selection
// =============================================================================

/// The personas every phase engages by default. Cross-functional phases map
/// to more than one.
fn phase_defaults(phase: ConversationPhase) -> &'static [Persona] {
    match phase {
        ConversationPhase::InitialDiscovery => &[Persona::ProductManager],
        ConversationPhase::BusinessRequirements => &[Persona::ProductManager],
        ConversationPhase::TechnicalArchitecture => {
            &[Persona::TechLead, Persona::ProductManager]
        }
        ConversationPhase::UserExperience => &[Persona::UxDesigner],
        ConversationPhase::Infrastructure => &[Persona::Devops, Persona::TechLead],
        ConversationPhase::TaskPlanning => &[Persona::ScrumMaster, Persona::ProductManager],
        ConversationPhase::SpecificationGeneration => &[Persona::ScrumMaster],
    }
}

/// Decide which personas must respond to `user_message`.
///
/// Phase defaults are unioned with contextual triggers over the new message
/// and a short window of recent user messages. The result is never empty
/// (ProductManager convenes as fallback) and is sorted by persona
/// declaration order so multi-persona batches come back stably ordered.
pub fn select_personas(
    context: &ConversationContext,
    user_message: &str,
    heuristic: &dyn TriggerHeuristic,
) -> Vec<Persona> {
    let mut selected: Vec<Persona> = phase_defaults(context.current_phase).to_vec();

    selected.extend(heuristic.personas_for(user_message));
    for msg in context.recent_user_messages(TRIGGER_HISTORY_WINDOW) {
        selected.extend(heuristic.personas_for(&msg.content));
    }

    selected.sort();
    selected.dedup();

    if selected.is_empty() {
        selected.push(Persona::ProductManager);
    }

    tracing::debug!(
        phase = %context.current_phase,
        personas = ?selected,
        "Selected personas for turn",
    );
    selected
}
