//! Invariant checking and checked construction for topology graphs.

use std::collections::{HashMap, HashSet};

use crate::error::{GraphError, GraphResult};
use crate::types::{Edge, EdgeKind, Graph, Node, NodeKind};

impl Graph {
    /// Append a node, rejecting duplicate ids.
    pub fn insert_node(&mut self, node: Node) -> GraphResult<()> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNodeId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Append an edge, rejecting endpoints that do not resolve to a node.
    pub fn insert_edge(&mut self, edge: Edge) -> GraphResult<()> {
        for endpoint in [&edge.from_node, &edge.to_node] {
            if self.node(endpoint).is_none() {
                return Err(GraphError::UnknownEndpoint {
                    edge: edge.id,
                    node: endpoint.clone(),
                });
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Check every IR invariant over the whole graph:
    ///
    /// - node ids are unique;
    /// - every edge endpoint resolves to a node;
    /// - a subnet is attached to at most one network;
    /// - `routes_to` edges originate only from route tables;
    /// - `protected_by` runs compute/database -> security group;
    /// - `allowed_traffic` runs security group -> security group.
    pub fn validate_integrity(&self) -> GraphResult<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNodeId(node.id.clone()));
            }
        }

        let kinds: HashMap<&str, NodeKind> =
            self.nodes.iter().map(|n| (n.id.as_str(), n.kind())).collect();

        let mut network_attachments: HashMap<&str, usize> = HashMap::new();
        for edge in &self.edges {
            for endpoint in [&edge.from_node, &edge.to_node] {
                if !kinds.contains_key(endpoint.as_str()) {
                    return Err(GraphError::UnknownEndpoint {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
            let from_kind = kinds[edge.from_node.as_str()];
            let to_kind = kinds[edge.to_node.as_str()];

            match edge.kind {
                EdgeKind::AttachedTo => {
                    if from_kind == NodeKind::Subnet && to_kind == NodeKind::Network {
                        let count = network_attachments
                            .entry(edge.from_node.as_str())
                            .or_insert(0);
                        *count += 1;
                        if *count > 1 {
                            return Err(GraphError::MultipleNetworkAttachments(
                                edge.from_node.clone(),
                            ));
                        }
                    }
                }
                EdgeKind::RoutesTo => {
                    if from_kind != NodeKind::RouteTable {
                        return Err(GraphError::InvalidRouteOrigin {
                            edge: edge.id.clone(),
                            kind: from_kind,
                        });
                    }
                }
                EdgeKind::ProtectedBy => {
                    let protectable = matches!(
                        from_kind,
                        NodeKind::ComputeInstance | NodeKind::Database
                    );
                    if !protectable || to_kind != NodeKind::SecurityGroup {
                        return Err(GraphError::InvalidProtectionEndpoints {
                            edge: edge.id.clone(),
                        });
                    }
                }
                EdgeKind::AllowedTraffic => {
                    if from_kind != NodeKind::SecurityGroup || to_kind != NodeKind::SecurityGroup {
                        return Err(GraphError::InvalidTrafficEndpoints {
                            edge: edge.id.clone(),
                        });
                    }
                }
                EdgeKind::DependsOn | EdgeKind::Contains => {}
            }
        }

        Ok(())
    }
}
