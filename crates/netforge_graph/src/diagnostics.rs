//! Severity-tagged findings produced by analysis passes.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One finding from a validation pass. Advisory: diagnostics never block or
/// mutate generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(rename = "nodeIds", alias = "node_ids", default)]
    pub node_ids: Vec<String>,
}

impl Diagnostic {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        node_ids: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            node_ids,
        }
    }
}
