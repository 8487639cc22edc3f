//! # netforge_spec
//!
//! The input contract for NetForge: a structured topology request with a
//! provider, a region, and an ordered list of component requests.
//!
//! Specs arrive as structured data from an external collaborator (the
//! NL/chat layer); this crate never parses raw natural language. Unknown
//! component roles degrade to the generic `other` role and missing
//! constraints are filled with fixed defaults downstream, so a
//! syntactically valid spec always builds.

pub mod error;
pub mod models;

pub use error::{SpecError, SpecResult};
pub use models::{ComponentRole, ComponentSpec, Constraints, TopologySpec};
