//! # netforge_graph
//!
//! Topology graph intermediate representation for NetForge.
//!
//! The IR is a flat, ordered list of typed resource nodes plus typed edges
//! between them. It is provider-agnostic: the builder lowers a spec into it
//! and the Terraform generator lowers it out again, while validation passes
//! analyze it in place.
//!
//! ## Invariants
//!
//! - Node ids are unique within a graph.
//! - Every edge endpoint references an existing node id.
//! - A subnet belongs to exactly one network.
//! - `routes_to` edges originate only from route tables.
//! - `protected_by` edges run compute/database -> security group;
//!   `allowed_traffic` edges run security group -> security group.
//!
//! Graphs are immutable once produced; the only sanctioned post-build writer
//! is the generator's constraint-repair pre-pass, which appends a
//! synthesized subnet (and its attachment edge) before emission.

pub mod diagnostics;
pub mod error;
mod integrity;
pub mod types;

pub use diagnostics::{Diagnostic, Severity};
pub use error::{GraphError, GraphResult};
pub use types::{
    ComputeProps, DatabaseProps, Edge, EdgeKind, EdgeProps, GatewayKind, GatewayProps, Graph,
    LoadBalancerProps, NetworkProps, Node, NodeKind, NodeProps, Provider, Route, RouteTableProps,
    RuleSource, SecurityGroupProps, SgRule, SubnetProps, TrafficGeneratorProps,
};
