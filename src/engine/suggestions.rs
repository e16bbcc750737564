//! Suggested next actions and completion detection.
//!
//! Pure functions over the turn's phase and response batch. Templates are
//! keyed by phase and lightly modulated by keyword presence in the latest
//! responses.

use super::phase::ConversationPhase;
use super::types::AiResponse;

/// Phrases a persona uses to signal the conversation is ready to produce the
/// specification. Tunable marker list, not a contract.
const COMPLETION_MARKERS: &[&str] = &[
    "ready to generate the specification",
    "ready to generate specifications",
    "specification is complete",
    "we have everything we need",
    "ready to write the spec",
];

/// Fixed next-step templates per phase.
fn phase_templates(phase: ConversationPhase) -> &'static [&'static str] {
    match phase {
        ConversationPhase::InitialDiscovery => &[
            "Describe your target users in more detail",
            "Clarify the core problem the app solves",
        ],
        ConversationPhase::BusinessRequirements => &[
            "Clarify requirements with stakeholders",
            "Prioritize the feature list for an MVP",
        ],
        ConversationPhase::TechnicalArchitecture => &[
            "Review the proposed tech stack",
            "Discuss data storage and API design",
        ],
        ConversationPhase::UserExperience => &[
            "Validate assumptions with users",
            "Walk through the main user flows",
        ],
        ConversationPhase::Infrastructure => &[
            "Decide on hosting and deployment strategy",
            "Plan monitoring and rollback procedures",
        ],
        ConversationPhase::TaskPlanning => &[
            "Break the work into milestones",
            "Estimate the first sprint",
        ],
        ConversationPhase::SpecificationGeneration => &[
            "Review the draft specification",
            "Confirm open questions are resolved",
        ],
    }
}

/// Keyword-conditioned follow-ups appended when the latest responses touch
/// the topic.
const CONTENT_FOLLOW_UPS: &[(&str, &str)] = &[
    ("risk", "Capture the identified risks and mitigations"),
    ("security", "Schedule a security review of the proposal"),
    ("cost", "Estimate the running costs of this approach"),
    ("trade-off", "Document the trade-offs that were weighed"),
];

/// Derive the turn's suggested next actions.
pub fn suggested_actions(
    phase: ConversationPhase,
    responses: &[AiResponse],
) -> Vec<String> {
    let mut actions: Vec<String> = phase_templates(phase)
        .iter()
        .map(|s| s.to_string())
        .collect();

    let combined = responses
        .iter()
        .map(|r| r.content.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");
    for (keyword, follow_up) in CONTENT_FOLLOW_UPS {
        if combined.contains(keyword) {
            actions.push(follow_up.to_string());
        }
    }
    actions
}

/// True when any response carries an explicit completion signal.
pub fn completion_signaled(responses: &[AiResponse]) -> bool {
    responses.iter().any(|r| {
        let lower = r.content.to_lowercase();
        COMPLETION_MARKERS.iter().any(|m| lower.contains(m))
    })
}
