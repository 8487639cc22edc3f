//! CLI command definitions.

use clap::{Parser, Subcommand};

use netforge_graph::{Diagnostic, Severity};

pub mod build;
pub mod validate;

#[derive(Parser)]
#[command(
    name = "netforge",
    version,
    about = "Compile structured infrastructure requests into Terraform configurations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a topology and write its Terraform configuration
    Build(build::BuildArgs),
    /// Build a topology and report diagnostics only
    Validate(validate::ValidateArgs),
}

/// Print diagnostics with a severity icon per line and a summary count.
pub(crate) fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        println!("✅ No findings");
        return;
    }

    for diag in diagnostics {
        let icon = match diag.severity {
            Severity::Error => "❌",
            Severity::Warning => "⚠️ ",
            Severity::Info => "ℹ️ ",
        };
        println!("   {} [{}] {}", icon, diag.severity, diag.message);
    }

    let errors = count(diagnostics, Severity::Error);
    let warnings = count(diagnostics, Severity::Warning);
    let infos = count(diagnostics, Severity::Info);
    println!("{errors} error(s), {warnings} warning(s), {infos} info");
}

pub(crate) fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}
