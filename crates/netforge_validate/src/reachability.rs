//! Security-group reachability analysis.

use netforge_graph::{
    Diagnostic, EdgeKind, Graph, Node, NodeKind, NodeProps, RuleSource, Severity,
};

use crate::{diag_id, ValidationPass};

/// Ports that are risky to expose to the internet.
const SENSITIVE_PORTS: &[(u16, &str)] = &[
    (22, "SSH"),
    (3389, "RDP"),
    (3306, "MySQL"),
    (5432, "PostgreSQL"),
    (27017, "MongoDB"),
    (6379, "Redis"),
    (11211, "Memcached"),
];

/// Database ports whose internet exposure is an error rather than a warning.
const DATABASE_PORTS: &[u16] = &[3306, 5432, 27017, 6379, 11211];

/// The CIDR that means "open to the world".
const OPEN_CIDR: &str = "0.0.0.0/0";

fn node_security_groups(node: &Node) -> Option<&[String]> {
    match &node.props {
        NodeProps::ComputeInstance(p) => Some(&p.security_groups),
        NodeProps::Database(p) => Some(&p.security_groups),
        NodeProps::LoadBalancer(p) => Some(&p.security_groups),
        _ => None,
    }
}

/// Flags security-group rules that expose protected resources to the open
/// internet. Every finding for a rule is reported separately; a database
/// behind an open rule on a database port yields two distinct errors.
pub struct Reachability;

impl ValidationPass for Reachability {
    fn name(&self) -> &'static str {
        "reachability"
    }

    fn run(&self, graph: &Graph) -> Vec<Diagnostic> {
        let mut results = Vec::new();

        for node in graph.nodes_of_kind(NodeKind::SecurityGroup) {
            let NodeProps::SecurityGroup(props) = &node.props else {
                continue;
            };
            let sg_id = node.id.as_str();
            let sg_name = node.display_name();

            // Resources protected via edges and via group-reference props.
            let mut protected: Vec<&str> = graph
                .edges
                .iter()
                .filter(|e| e.kind == EdgeKind::ProtectedBy && e.to_node == sg_id)
                .map(|e| e.from_node.as_str())
                .collect();
            for other in &graph.nodes {
                if let Some(groups) = node_security_groups(other) {
                    let references = groups.iter().any(|g| g == sg_id || g == sg_name);
                    if references && !protected.contains(&other.id.as_str()) {
                        protected.push(other.id.as_str());
                    }
                }
            }

            let protected_databases: Vec<&Node> = protected
                .iter()
                .filter_map(|id| graph.node(id))
                .filter(|n| n.kind() == NodeKind::Database)
                .collect();

            for rule in &props.ingress {
                let is_open = matches!(
                    &rule.source,
                    RuleSource::Cidrs { cidr_blocks } if cidr_blocks.iter().any(|c| c == OPEN_CIDR)
                );
                if !is_open {
                    continue;
                }

                if !protected_databases.is_empty() {
                    let db_names: Vec<&str> = protected_databases
                        .iter()
                        .map(|n| n.display_name())
                        .collect();
                    let mut node_ids = vec![sg_id.to_string()];
                    node_ids.extend(protected.iter().map(|id| id.to_string()));
                    results.push(Diagnostic::new(
                        diag_id("security-db-open"),
                        Severity::Error,
                        format!(
                            "Security group '{sg_name}' allows internet access to database(s): {}",
                            db_names.join(", ")
                        ),
                        node_ids,
                    ));
                }

                for (port, service) in SENSITIVE_PORTS {
                    if rule.from_port <= *port && *port <= rule.to_port {
                        if *port == 22 {
                            results.push(Diagnostic::new(
                                diag_id("security-ssh-open"),
                                Severity::Warning,
                                format!(
                                    "Security group '{sg_name}' allows SSH (22) from 0.0.0.0/0 - consider restricting to known IPs"
                                ),
                                vec![sg_id.to_string()],
                            ));
                        } else if DATABASE_PORTS.contains(port) {
                            results.push(Diagnostic::new(
                                diag_id("security-dbport-open"),
                                Severity::Error,
                                format!(
                                    "Security group '{sg_name}' exposes {service} (port {port}) to the internet"
                                ),
                                vec![sg_id.to_string()],
                            ));
                        } else {
                            results.push(Diagnostic::new(
                                diag_id("security-port-open"),
                                Severity::Warning,
                                format!(
                                    "Security group '{sg_name}' exposes {service} (port {port}) to 0.0.0.0/0"
                                ),
                                vec![sg_id.to_string()],
                            ));
                        }
                    }
                }
            }
        }

        results
    }
}
