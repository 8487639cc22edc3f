//! Architecture tier classification.
//!
//! A pure keyword scan over the concatenated component descriptions decides
//! between the two architecture strategies. The keyword lists are fixed
//! policy: matching is plain substring containment, production cues checked
//! first.

use netforge_spec::{ComponentRole, TopologySpec};

/// Cues that select the production (multi-AZ, NAT, load-balanced) tier.
pub const PRODUCTION_KEYWORDS: &[&str] = &[
    "production",
    "prod",
    "high availability",
    "highly available",
    "ha",
    "multi-az",
    "multi az",
    "fault tolerant",
    "redundant",
    "enterprise",
    "mission critical",
    "99.9",
    "uptime",
    "load balancer",
    "load balanced",
    "alb",
    "scaling",
];

/// Cues that select the minimal (single-AZ, IGW-only) tier.
pub const SIMPLICITY_KEYWORDS: &[&str] = &[
    "simple",
    "cheap",
    "budget",
    "small",
    "test",
    "testing",
    "mvp",
    "prototype",
    "hobby",
    "learning",
    "student",
    "practice",
    "minimal",
    "basic",
    "single",
    "one instance",
    "just one",
];

/// One of the two predefined architecture complexity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Minimal,
    Production,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Minimal => "minimal",
            Tier::Production => "production",
        }
    }

    /// Numeric level recorded in graph metadata.
    pub fn level(&self) -> u8 {
        match self {
            Tier::Minimal => 1,
            Tier::Production => 2,
        }
    }

    /// The operating mode recorded in graph metadata.
    pub fn mode(&self) -> &'static str {
        match self {
            Tier::Minimal => "hobby",
            Tier::Production => "production",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a spec into a tier.
///
/// Production cues win over simplicity cues; with neither present, an
/// explicit web-tier quantity of two or more selects production, and
/// everything else defaults to minimal (cheapest by default).
pub fn classify(spec: &TopologySpec) -> Tier {
    let all_text = spec
        .components
        .iter()
        .map(|c| c.description.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    if PRODUCTION_KEYWORDS.iter().any(|kw| all_text.contains(kw)) {
        return Tier::Production;
    }
    if SIMPLICITY_KEYWORDS.iter().any(|kw| all_text.contains(kw)) {
        return Tier::Minimal;
    }

    let scaled_out_web = spec
        .components
        .iter()
        .any(|c| c.role == ComponentRole::WebTier && c.quantity.is_some_and(|q| q >= 2));
    if scaled_out_web {
        Tier::Production
    } else {
        Tier::Minimal
    }
}
