//! Build command - compile a spec into a Terraform configuration.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use netforge_builder::build_topology;
use netforge_spec::TopologySpec;
use netforge_terraform::generate_with_repair;
use netforge_validate::run_all_validations;

use super::print_diagnostics;

#[derive(Args)]
pub struct BuildArgs {
    /// Path to the topology spec JSON file
    #[arg(short, long)]
    pub spec: PathBuf,

    /// Directory to write main.tf.json into
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Also write the repaired topology graph as JSON
    #[arg(long)]
    pub emit_graph: Option<PathBuf>,
}

pub fn execute(args: BuildArgs) -> Result<()> {
    info!("Building topology from {:?}", args.spec);

    let raw = fs::read_to_string(&args.spec)
        .with_context(|| format!("spec file not found: {}", args.spec.display()))?;
    let spec = TopologySpec::from_json(&raw).context("failed to parse topology spec")?;

    let graph = build_topology(&spec);
    let (repaired, document) = generate_with_repair(&graph);
    let diagnostics = run_all_validations(&repaired);

    fs::create_dir_all(&args.out)
        .with_context(|| format!("cannot create output directory: {}", args.out.display()))?;
    let tf_path = args.out.join("main.tf.json");
    fs::write(&tf_path, document.to_json_pretty()?)
        .with_context(|| format!("cannot write {}", tf_path.display()))?;
    println!(
        "✅ Wrote {} ({} nodes, {} edges)",
        tf_path.display(),
        repaired.nodes.len(),
        repaired.edges.len()
    );

    if let Some(graph_path) = &args.emit_graph {
        fs::write(graph_path, serde_json::to_string_pretty(&repaired)?)
            .with_context(|| format!("cannot write {}", graph_path.display()))?;
        println!("✅ Wrote {}", graph_path.display());
    }

    println!("📋 Diagnostics:");
    print_diagnostics(&diagnostics);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SPEC: &str = r#"{
        "provider": "aws",
        "region": "us-east-1",
        "components": [
            {"role": "web_tier", "description": "simple site"},
            {"role": "db_tier", "description": "small database"}
        ]
    }"#;

    #[test]
    fn test_build_writes_config_and_graph() {
        let temp = tempdir().unwrap();
        let spec_path = temp.path().join("spec.json");
        fs::write(&spec_path, SPEC).unwrap();
        let out = temp.path().join("out");
        let graph_path = temp.path().join("graph.json");

        execute(BuildArgs {
            spec: spec_path,
            out: out.clone(),
            emit_graph: Some(graph_path.clone()),
        })
        .unwrap();

        let rendered = fs::read_to_string(out.join("main.tf.json")).unwrap();
        assert!(rendered.contains("aws_vpc"));
        assert!(rendered.contains("${aws_vpc.vpc_main.id}"));

        // The emitted graph is the repaired one.
        let graph = fs::read_to_string(&graph_path).unwrap();
        assert!(graph.contains("subnet-public-az2"));
    }

    #[test]
    fn test_missing_spec_file_fails() {
        let temp = tempdir().unwrap();
        let err = execute(BuildArgs {
            spec: temp.path().join("nope.json"),
            out: temp.path().to_path_buf(),
            emit_graph: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
