//! # netforge_builder
//!
//! Lowers a [`netforge_spec::TopologySpec`] into a
//! [`netforge_graph::Graph`] using a keyword-driven tier policy.
//!
//! Two architecture strategies exist:
//!
//! - **Minimal**: one availability zone, a single public subnet, an
//!   internet gateway and nothing else; compute lands in the public subnet
//!   and a requested database shares it, isolated by security-group rules
//!   rather than placement.
//! - **Production**: two availability zones, public subnets fronting a load
//!   balancer, private subnets for compute and database, and a NAT gateway
//!   for private egress.
//!
//! Building never fails for a syntactically valid spec; every gap is filled
//! with a fixed default.

pub mod builder;
pub mod tier;

pub use builder::{build_topology, TopologyBuilder};
pub use tier::{classify, Tier, PRODUCTION_KEYWORDS, SIMPLICITY_KEYWORDS};
