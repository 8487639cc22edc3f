//! Orphaned resource detection.

use std::collections::{HashMap, HashSet};

use netforge_graph::{Diagnostic, EdgeKind, GatewayKind, Graph, NodeKind, NodeProps, Severity};

use crate::{diag_id, ValidationPass};

/// Flags resources that do not reach their expected parent: subnets and
/// security groups need a network, compute and databases need a subnet,
/// internet gateways a network, NAT gateways a subnet.
pub struct OrphanedNodes;

impl ValidationPass for OrphanedNodes {
    fn name(&self) -> &'static str {
        "orphaned_nodes"
    }

    fn run(&self, graph: &Graph) -> Vec<Diagnostic> {
        let mut results = Vec::new();

        let vpc_ids: HashSet<&str> = graph
            .nodes_of_kind(NodeKind::Network)
            .map(|n| n.id.as_str())
            .collect();
        let subnet_ids: HashSet<&str> = graph
            .nodes_of_kind(NodeKind::Subnet)
            .map(|n| n.id.as_str())
            .collect();

        let mut attached_to: HashMap<&str, HashSet<&str>> = HashMap::new();
        for edge in &graph.edges {
            if edge.kind == EdgeKind::AttachedTo {
                attached_to
                    .entry(edge.from_node.as_str())
                    .or_default()
                    .insert(edge.to_node.as_str());
            }
        }
        let empty = HashSet::new();

        for node in &graph.nodes {
            let name = node.display_name();
            let attachments = attached_to.get(node.id.as_str()).unwrap_or(&empty);
            let has_vpc = attachments.iter().any(|id| vpc_ids.contains(id));
            let has_subnet = attachments.iter().any(|id| subnet_ids.contains(id));

            match &node.props {
                NodeProps::Subnet(_) => {
                    if !has_vpc {
                        results.push(Diagnostic::new(
                            diag_id("orphan-subnet"),
                            Severity::Warning,
                            format!("Subnet '{name}' is not attached to any VPC"),
                            vec![node.id.clone()],
                        ));
                    }
                }
                NodeProps::ComputeInstance(_) => {
                    if !has_subnet {
                        results.push(Diagnostic::new(
                            diag_id("orphan-compute"),
                            Severity::Warning,
                            format!("Instance '{name}' is not attached to any subnet"),
                            vec![node.id.clone()],
                        ));
                    }
                }
                NodeProps::Database(props) => {
                    // A subnet-id list on the node counts as placement.
                    let has_subnet_prop = !props.subnet_ids.is_empty()
                        || props.extra.contains_key("db_subnet_group");
                    if !has_subnet && !has_subnet_prop {
                        results.push(Diagnostic::new(
                            diag_id("orphan-database"),
                            Severity::Warning,
                            format!("Database '{name}' is not attached to any subnet"),
                            vec![node.id.clone()],
                        ));
                    }
                }
                NodeProps::SecurityGroup(_) => {
                    if !has_vpc {
                        results.push(Diagnostic::new(
                            diag_id("orphan-sg"),
                            Severity::Warning,
                            format!("Security group '{name}' is not attached to any VPC"),
                            vec![node.id.clone()],
                        ));
                    }
                }
                NodeProps::Gateway(props) => match props.gateway_type {
                    GatewayKind::Internet => {
                        if !has_vpc {
                            results.push(Diagnostic::new(
                                diag_id("orphan-igw"),
                                Severity::Warning,
                                format!("Internet Gateway '{name}' is not attached to any VPC"),
                                vec![node.id.clone()],
                            ));
                        }
                    }
                    GatewayKind::Nat => {
                        let has_subnet_prop = props.subnet_id.is_some();
                        if !has_subnet && !has_subnet_prop {
                            results.push(Diagnostic::new(
                                diag_id("orphan-nat"),
                                Severity::Warning,
                                format!("NAT Gateway '{name}' is not attached to any subnet"),
                                vec![node.id.clone()],
                            ));
                        }
                    }
                },
                _ => {}
            }
        }

        results
    }
}
