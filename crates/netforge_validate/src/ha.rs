//! High-availability and single-point-of-failure analysis.

use netforge_graph::{Diagnostic, GatewayKind, Graph, NodeProps, Severity};

use crate::{diag_id, ValidationPass};

/// Groups values by key preserving first-seen key order, so messages name
/// the same AZ on every run.
fn group_by_az<'a>(pairs: impl Iterator<Item = (Option<&'a str>, &'a str)>) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for (az, id) in pairs {
        let key = az.unwrap_or("unknown").to_string();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, ids)) => ids.push(id.to_string()),
            None => groups.push((key, vec![id.to_string()])),
        }
    }
    groups
}

/// Flags topologies that defeat redundancy: multiple instances piled into
/// one AZ, databases without multi-AZ, a lone NAT gateway serving several
/// AZs, and load balancers fronting a single-AZ fleet.
pub struct HaSpof;

impl ValidationPass for HaSpof {
    fn name(&self) -> &'static str {
        "ha_spof"
    }

    fn run(&self, graph: &Graph) -> Vec<Diagnostic> {
        let mut results = Vec::new();

        let mut compute: Vec<(Option<&str>, &str)> = Vec::new();
        let mut subnets: Vec<(Option<&str>, &str)> = Vec::new();
        let mut databases: Vec<(&str, &str, bool)> = Vec::new();
        let mut nat_gateways: Vec<(&str, &str, Option<&str>)> = Vec::new();
        let mut load_balancers: Vec<(&str, &str)> = Vec::new();

        for node in &graph.nodes {
            let az = node.az.as_deref();
            match &node.props {
                NodeProps::ComputeInstance(_) => compute.push((az, node.id.as_str())),
                NodeProps::Subnet(_) => subnets.push((az, node.id.as_str())),
                NodeProps::Database(props) => {
                    databases.push((node.id.as_str(), node.display_name(), props.multi_az))
                }
                NodeProps::Gateway(props) if props.gateway_type == GatewayKind::Nat => {
                    nat_gateways.push((node.id.as_str(), node.display_name(), az))
                }
                NodeProps::LoadBalancer(_) => {
                    load_balancers.push((node.id.as_str(), node.display_name()))
                }
                _ => {}
            }
        }

        let compute_by_az = group_by_az(compute.into_iter());
        let subnets_by_az = group_by_az(subnets.into_iter());
        let total_compute: usize = compute_by_az.iter().map(|(_, ids)| ids.len()).sum();

        if total_compute > 1 && compute_by_az.len() == 1 {
            let (az_name, instance_ids) = &compute_by_az[0];
            results.push(Diagnostic::new(
                diag_id("ha-single-az-compute"),
                Severity::Warning,
                format!(
                    "All {total_compute} compute instances are in a single AZ ({az_name}). Consider distributing across AZs for high availability."
                ),
                instance_ids.clone(),
            ));
        }

        for (db_id, db_name, multi_az) in &databases {
            if !multi_az {
                results.push(Diagnostic::new(
                    diag_id("ha-db-single-az"),
                    Severity::Info,
                    format!(
                        "Database '{db_name}' is not configured for Multi-AZ. Consider enabling for production workloads."
                    ),
                    vec![db_id.to_string()],
                ));
            }
        }

        if nat_gateways.len() == 1 && subnets_by_az.len() > 1 {
            let (nat_id, nat_name, nat_az) = nat_gateways[0];
            results.push(Diagnostic::new(
                diag_id("ha-single-nat"),
                Severity::Warning,
                format!(
                    "Single NAT Gateway '{nat_name}' in {}, but subnets span {} AZs. If this NAT fails, private subnets in other AZs lose internet access.",
                    nat_az.unwrap_or("unknown AZ"),
                    subnets_by_az.len()
                ),
                vec![nat_id.to_string()],
            ));
        }

        if !load_balancers.is_empty() && total_compute > 1 && compute_by_az.len() == 1 {
            let (_, instance_ids) = &compute_by_az[0];
            for (lb_id, lb_name) in &load_balancers {
                let mut node_ids = vec![lb_id.to_string()];
                node_ids.extend(instance_ids.iter().cloned());
                results.push(Diagnostic::new(
                    diag_id("ha-lb-single-az"),
                    Severity::Warning,
                    format!(
                        "Load balancer '{lb_name}' exists but all target instances are in a single AZ. This defeats the purpose of load balancing for HA."
                    ),
                    node_ids,
                ));
            }
        }

        results
    }
}
