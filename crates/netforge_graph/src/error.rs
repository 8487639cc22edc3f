//! Error types for the graph IR.

use thiserror::Error;

use crate::types::NodeKind;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Structural violations of the IR invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("edge {edge} references unknown node id: {node}")]
    UnknownEndpoint { edge: String, node: String },

    #[error("subnet {0} is attached to more than one network")]
    MultipleNetworkAttachments(String),

    #[error("edge {edge}: routes_to must originate from a route table, found {kind}")]
    InvalidRouteOrigin { edge: String, kind: NodeKind },

    #[error("edge {edge}: protected_by must run from a compute or database node to a security group")]
    InvalidProtectionEndpoints { edge: String },

    #[error("edge {edge}: allowed_traffic must run security group to security group")]
    InvalidTrafficEndpoints { edge: String },
}
