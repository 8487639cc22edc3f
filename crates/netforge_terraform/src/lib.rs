//! # netforge_terraform
//!
//! Lowers a [`netforge_graph::Graph`] into a Terraform-JSON configuration
//! document.
//!
//! The lowering has two phases:
//!
//! 1. **Constraint repair** ([`repair_platform_constraints`]): a single
//!    pre-pass that synthesizes the second database subnet the platform
//!    requires when the graph supplies only one, returning a new graph
//!    value. Validation is expected to run against this repaired graph so
//!    diagnostics and configuration describe the same topology.
//! 2. **Emission** ([`TerraformGenerator`]): one pass over the nodes
//!    dispatching to per-kind emitters, then one pass over the edges for
//!    join resources (route-table associations).
//!
//! Cross-resource attributes stay structured [`TfRef`] values until the
//! document is serialized, where they render as `${type.name.attribute}`.
//! Generation never fails for a structurally valid graph.

pub mod document;
pub mod error;
pub mod generator;
pub mod repair;
pub mod value;

pub use document::{AttrMap, ProviderRequirement, TerraformBlock, TerraformDocument};
pub use error::{GeneratorError, GeneratorResult};
pub use generator::{generate, generate_with_repair, TerraformGenerator};
pub use repair::repair_platform_constraints;
pub use value::{sanitize_name, TfRef, TfValue};
