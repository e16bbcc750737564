//! Conversation lifecycle phases and the pure progress model.

use serde::{Deserialize, Serialize};

// =============================================================================
// ConversationPhase
// =============================================================================

/// The ordered stages of the specification-gathering conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    InitialDiscovery,
    BusinessRequirements,
    TechnicalArchitecture,
    UserExperience,
    Infrastructure,
    TaskPlanning,
    SpecificationGeneration,
}

impl ConversationPhase {
    /// All phases in lifecycle order.
    pub const ALL: &'static [ConversationPhase] = &[
        ConversationPhase::InitialDiscovery,
        ConversationPhase::BusinessRequirements,
        ConversationPhase::TechnicalArchitecture,
        ConversationPhase::UserExperience,
        ConversationPhase::Infrastructure,
        ConversationPhase::TaskPlanning,
        ConversationPhase::SpecificationGeneration,
    ];

    /// Position in the fixed order (0-based).
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    /// The phase immediately after this one, or None for the last.
    pub fn next(&self) -> Option<ConversationPhase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// True when this phase is `other` or comes after it.
    pub fn is_at_or_after(&self, other: ConversationPhase) -> bool {
        self.index() >= other.index()
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InitialDiscovery => "Initial Discovery",
            Self::BusinessRequirements => "Business Requirements",
            Self::TechnicalArchitecture => "Technical Architecture",
            Self::UserExperience => "User Experience",
            Self::Infrastructure => "Infrastructure",
            Self::TaskPlanning => "Task Planning",
            Self::SpecificationGeneration => "Specification Generation",
        }
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Phase progress
// =============================================================================

/// Snapshot of where the conversation sits in the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseProgress {
    pub current_phase: ConversationPhase,
    pub completed_phases: Vec<ConversationPhase>,
    pub next_phase: Option<ConversationPhase>,
    /// 0.0 at the first phase, 100.0 at the last. Position only; message
    /// content never affects it.
    pub overall_progress: f64,
}

/// Compute progress for a phase. Pure function of phase position.
pub fn phase_progress(phase: ConversationPhase) -> PhaseProgress {
    let idx = phase.index();
    let last = ConversationPhase::ALL.len() - 1;
    PhaseProgress {
        current_phase: phase,
        completed_phases: ConversationPhase::ALL[..idx].to_vec(),
        next_phase: phase.next(),
        overall_progress: (idx as f64 / last as f64) * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_phase_zero_progress() {
        let p = phase_progress(ConversationPhase::InitialDiscovery);
        assert_eq!(p.overall_progress, 0.0);
        assert!(p.completed_phases.is_empty());
        assert_eq!(p.next_phase, Some(ConversationPhase::BusinessRequirements));
    }

    #[test]
    fn test_last_phase_full_progress() {
        let p = phase_progress(ConversationPhase::SpecificationGeneration);
        assert_eq!(p.overall_progress, 100.0);
        assert_eq!(p.completed_phases.len(), ConversationPhase::ALL.len() - 1);
        assert_eq!(p.next_phase, None);
    }

    #[test]
    fn test_progress_monotonic() {
        for pair in ConversationPhase::ALL.windows(2) {
            let before = phase_progress(pair[0]).overall_progress;
            let after = phase_progress(pair[1]).overall_progress;
            assert!(before < after, "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_completed_phases_strictly_before() {
        let p = phase_progress(ConversationPhase::Infrastructure);
        assert_eq!(
            p.completed_phases,
            vec![
                ConversationPhase::InitialDiscovery,
                ConversationPhase::BusinessRequirements,
                ConversationPhase::TechnicalArchitecture,
                ConversationPhase::UserExperience,
            ]
        );
    }

    #[test]
    fn test_is_at_or_after() {
        assert!(ConversationPhase::TaskPlanning
            .is_at_or_after(ConversationPhase::TechnicalArchitecture));
        assert!(ConversationPhase::TaskPlanning.is_at_or_after(ConversationPhase::TaskPlanning));
        assert!(!ConversationPhase::InitialDiscovery
            .is_at_or_after(ConversationPhase::BusinessRequirements));
    }
}
