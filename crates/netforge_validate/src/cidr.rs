//! Subnet CIDR overlap detection.

use ipnet::Ipv4Net;

use netforge_graph::{Diagnostic, EdgeKind, Graph, NodeKind, NodeProps, Severity};

use crate::{diag_id, ValidationPass};

/// Flags subnets attached to the same network whose address ranges
/// intersect, and CIDR literals that fail to parse.
pub struct CidrOverlap;

impl ValidationPass for CidrOverlap {
    fn name(&self) -> &'static str {
        "cidr_overlap"
    }

    fn run(&self, graph: &Graph) -> Vec<Diagnostic> {
        let mut results = Vec::new();

        let vpc_ids: Vec<&str> = graph
            .nodes_of_kind(NodeKind::Network)
            .map(|n| n.id.as_str())
            .collect();

        // vpc id -> (subnet id, subnet name, cidr)
        let mut vpc_subnets: Vec<(&str, Vec<(&str, &str, &str)>)> =
            vpc_ids.iter().map(|id| (*id, Vec::new())).collect();

        for node in graph.nodes_of_kind(NodeKind::Subnet) {
            let NodeProps::Subnet(props) = &node.props else {
                continue;
            };
            if props.cidr_block.is_empty() {
                continue;
            }
            let attached_vpc = graph
                .edges
                .iter()
                .find(|e| {
                    e.kind == EdgeKind::AttachedTo
                        && e.from_node == node.id
                        && vpc_ids.contains(&e.to_node.as_str())
                })
                .map(|e| e.to_node.as_str());
            if let Some(vpc_id) = attached_vpc {
                if let Some((_, subnets)) = vpc_subnets.iter_mut().find(|(id, _)| *id == vpc_id) {
                    subnets.push((&node.id, node.display_name(), &props.cidr_block));
                }
            }
        }

        for (_, subnets) in &vpc_subnets {
            if subnets.len() < 2 {
                continue;
            }

            let mut parsed: Vec<(&str, &str, Ipv4Net)> = Vec::new();
            for &(subnet_id, subnet_name, cidr) in subnets {
                match cidr.parse::<Ipv4Net>() {
                    Ok(net) => parsed.push((subnet_id, subnet_name, net.trunc())),
                    Err(_) => results.push(Diagnostic::new(
                        diag_id("cidr-invalid"),
                        Severity::Error,
                        format!("Invalid CIDR block '{cidr}' in subnet '{subnet_name}'"),
                        vec![subnet_id.to_string()],
                    )),
                }
            }

            for i in 0..parsed.len() {
                for j in (i + 1)..parsed.len() {
                    let (id1, name1, net1) = &parsed[i];
                    let (id2, name2, net2) = &parsed[j];
                    if net1.contains(net2) || net2.contains(net1) {
                        results.push(Diagnostic::new(
                            diag_id("cidr-overlap"),
                            Severity::Error,
                            format!(
                                "CIDR overlap: '{name1}' ({net1}) overlaps with '{name2}' ({net2})"
                            ),
                            vec![id1.to_string(), id2.to_string()],
                        ));
                    }
                }
            }
        }

        results
    }
}
