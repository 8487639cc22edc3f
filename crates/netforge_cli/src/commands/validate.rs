//! Validate command - report diagnostics for a spec without writing output.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use netforge_builder::build_topology;
use netforge_graph::Severity;
use netforge_spec::TopologySpec;
use netforge_terraform::repair_platform_constraints;
use netforge_validate::run_all_validations;

use super::{count, print_diagnostics};

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the topology spec JSON file
    #[arg(short, long)]
    pub spec: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating topology from {:?}", args.spec);

    let raw = fs::read_to_string(&args.spec)
        .with_context(|| format!("spec file not found: {}", args.spec.display()))?;
    let spec = TopologySpec::from_json(&raw).context("failed to parse topology spec")?;

    let graph = build_topology(&spec);
    // Validate what would actually be emitted.
    let repaired = repair_platform_constraints(&graph);
    let diagnostics = run_all_validations(&repaired);

    println!("📋 Validating topology '{}'...", repaired.id);
    print_diagnostics(&diagnostics);

    let errors = count(&diagnostics, Severity::Error);
    if errors > 0 {
        anyhow::bail!("validation failed with {errors} error(s)");
    }
    Ok(())
}
