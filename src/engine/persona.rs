//! The fixed catalogue of expert personas that can author a turn's response.

use serde::{Deserialize, Serialize};

/// One of the five expert roles participating in the conversation.
///
/// Declaration order is significant: response batches are sorted by it, so
/// multi-persona turns come back in a stable order regardless of which
/// generation call finished first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    ProductManager,
    TechLead,
    UxDesigner,
    Devops,
    ScrumMaster,
}

impl Persona {
    /// All personas in declaration (= response ordering) order.
    pub const ALL: &'static [Persona] = &[
        Persona::ProductManager,
        Persona::TechLead,
        Persona::UxDesigner,
        Persona::Devops,
        Persona::ScrumMaster,
    ];

    /// The persona that arbitrates every detected conflict.
    pub const ARBITER: Persona = Persona::ScrumMaster;

    /// Stable identifier used for storage and event payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::ProductManager => "product_manager",
            Persona::TechLead => "tech_lead",
            Persona::UxDesigner => "ux_designer",
            Persona::Devops => "devops",
            Persona::ScrumMaster => "scrum_master",
        }
    }

    /// Parse from the stored identifier. Unrecognized strings map to None.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "product_manager" => Some(Persona::ProductManager),
            "tech_lead" => Some(Persona::TechLead),
            "ux_designer" => Some(Persona::UxDesigner),
            "devops" => Some(Persona::Devops),
            "scrum_master" => Some(Persona::ScrumMaster),
            _ => None,
        }
    }

    /// Human-readable name for presentation.
    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::ProductManager => "Product Manager",
            Persona::TechLead => "Tech Lead",
            Persona::UxDesigner => "UX Designer",
            Persona::Devops => "DevOps Engineer",
            Persona::ScrumMaster => "Scrum Master",
        }
    }

    /// Expertise tags. Presentation-only; orchestration logic never reads these.
    pub fn expertise(&self) -> &'static [&'static str] {
        match self {
            Persona::ProductManager => &["requirements", "scope", "stakeholders", "prioritization"],
            Persona::TechLead => &["architecture", "tech stack", "APIs", "data modeling"],
            Persona::UxDesigner => &["user flows", "interfaces", "accessibility", "usability"],
            Persona::Devops => &["deployment", "infrastructure", "CI/CD", "monitoring"],
            Persona::ScrumMaster => &["planning", "estimation", "milestones", "facilitation"],
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
