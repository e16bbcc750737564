//! Detects disagreement between personas within one turn and builds the
//! arbiter's synthesis prompt.
//!
//! Detection is a keyword stance heuristic over response content. Like the
//! trigger vocabularies it is tunable data; swap the marker lists (or the
//! whole detector) for a classifier without touching the orchestrator.

use super::phase::ConversationPhase;
use super::types::AiResponse;

/// Keyword stance detector over a turn's response batch.
pub struct ConflictDetector {
    /// Phrases that mark a response as making a substantive recommendation.
    pub recommendation_markers: Vec<&'static str>,
    /// Phrases that mark a response as pushing back on another viewpoint.
    pub opposition_markers: Vec<&'static str>,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self {
            recommendation_markers: vec![
                "recommend",
                "suggest",
                "should use",
                "should go with",
                "propose",
                "better to",
                "i'd pick",
            ],
            opposition_markers: vec![
                "disagree",
                "instead",
                "rather than",
                "however",
                "on the contrary",
                "advise against",
                "not a good fit",
                "i would avoid",
                "don't think",
            ],
        }
    }
}

impl ConflictDetector {
    /// True when the batch contains incompatible recommendations.
    ///
    /// Requires ≥2 responses from distinct personas, a phase capable of
    /// multi-persona output (technical architecture or later), at least two
    /// responses carrying recommendation language, and at least one carrying
    /// opposition language.
    pub fn detect(&self, phase: ConversationPhase, responses: &[AiResponse]) -> bool {
        if !phase.is_at_or_after(ConversationPhase::TechnicalArchitecture) {
            return false;
        }
        let mut personas: Vec<_> = responses.iter().map(|r| r.persona).collect();
        personas.sort();
        personas.dedup();
        if personas.len() < 2 {
            return false;
        }

        let recommending = responses
            .iter()
            .filter(|r| self.contains_any(&r.content, &self.recommendation_markers))
            .count();
        let opposing = responses
            .iter()
            .any(|r| self.contains_any(&r.content, &self.opposition_markers));

        let conflict = recommending >= 2 && opposing;
        if conflict {
            tracing::info!(
                phase = %phase,
                personas = ?personas,
                "Conflicting recommendations detected",
            );
        }
        conflict
    }

    fn contains_any(&self, content: &str, markers: &[&str]) -> bool {
        let lower = content.to_lowercase();
        markers.iter().any(|m| lower.contains(m))
    }
}

/// Build the synthesis prompt the arbiter answers. Embeds every conflicting
/// content and asks for one reconciling recommendation.
pub fn build_resolution_prompt(responses: &[AiResponse]) -> String {
    let mut prompt = String::from(
        "The team has produced conflicting recommendations on the current topic. \
         Review each viewpoint below and provide a single recommendation that \
         reconciles them, stating the trade-offs you weighed.\n",
    );
    for response in responses {
        prompt.push_str(&format!(
            "\n{} said:\n{}\n",
            response.persona.display_name(),
            response.content
        ));
    }
    prompt
}
