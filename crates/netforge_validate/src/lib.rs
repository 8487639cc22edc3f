//! # netforge_validate
//!
//! Static-analysis passes over topology graphs.
//!
//! Each pass is a pure function of the graph returning zero or more
//! severity-tagged diagnostics. The engine runs a fixed, ordered set of
//! passes and concatenates their results in pass order: no deduplication,
//! no short-circuiting. Diagnostics are advisory and never block or mutate
//! generation.
//!
//! If diagnostics must reflect constraint-repaired resources, validate the
//! repaired graph the generator produced; running the passes against a
//! different snapshot than the one emitted is a correctness bug.

pub mod cidr;
pub mod ha;
pub mod orphans;
pub mod reachability;

use tracing::debug;
use uuid::Uuid;

use netforge_graph::{Diagnostic, Graph};

pub use cidr::CidrOverlap;
pub use ha::HaSpof;
pub use orphans::OrphanedNodes;
pub use reachability::Reachability;

/// A single static-analysis pass: a pure function of the graph.
pub trait ValidationPass {
    fn name(&self) -> &'static str;
    fn run(&self, graph: &Graph) -> Vec<Diagnostic>;
}

/// Short unique diagnostic id with a stable, greppable prefix.
pub(crate) fn diag_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &hex[..8])
}

/// Runs the fixed pass list over a graph.
pub struct ValidationEngine {
    passes: Vec<Box<dyn ValidationPass>>,
}

impl ValidationEngine {
    /// The standard engine: CIDR overlap, orphan detection, reachability,
    /// HA/SPOF, in that order.
    pub fn new() -> Self {
        Self {
            passes: vec![
                Box::new(CidrOverlap),
                Box::new(OrphanedNodes),
                Box::new(Reachability),
                Box::new(HaSpof),
            ],
        }
    }

    /// An engine with a custom pass list, mainly for tests.
    pub fn with_passes(passes: Vec<Box<dyn ValidationPass>>) -> Self {
        Self { passes }
    }

    /// Run every pass, concatenating results in pass order.
    pub fn run(&self, graph: &Graph) -> Vec<Diagnostic> {
        let mut results = Vec::new();
        for pass in &self.passes {
            let found = pass.run(graph);
            debug!(pass = pass.name(), findings = found.len(), "validation pass done");
            results.extend(found);
        }
        results
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run all standard validation passes on a topology graph.
pub fn run_all_validations(graph: &Graph) -> Vec<Diagnostic> {
    ValidationEngine::new().run(graph)
}
