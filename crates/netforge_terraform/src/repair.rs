//! Platform constraint repair.
//!
//! A managed relational database requires subnets spanning at least two
//! availability zones. When a graph supplies only one eligible subnet, a
//! second one is synthesized before emission: fresh id, a /24 block disjoint
//! from every existing subnet CIDR, and the availability-zone suffix
//! flipped. The repair runs once and returns a new graph value; emission and
//! validation both operate on the repaired graph. This is the sole
//! sanctioned writer of a graph after the builder.

use ipnet::Ipv4Net;
use tracing::info;

use netforge_graph::{Edge, EdgeKind, Graph, Node, NodeKind, NodeProps, SubnetProps};

/// Subnets a database's subnet group may span: those whose id names the db
/// tier, else the private tier, else any subnet at all.
pub(crate) fn eligible_db_subnets(graph: &Graph) -> Vec<&Node> {
    let subnets: Vec<&Node> = graph.nodes_of_kind(NodeKind::Subnet).collect();
    let db: Vec<&Node> = subnets
        .iter()
        .copied()
        .filter(|n| n.id.to_lowercase().contains("db"))
        .collect();
    if !db.is_empty() {
        return db;
    }
    let private: Vec<&Node> = subnets
        .iter()
        .copied()
        .filter(|n| n.id.to_lowercase().contains("private"))
        .collect();
    if !private.is_empty() {
        return private;
    }
    subnets
}

/// Repair the graph so every database has at least two eligible subnets.
/// Returns the input unchanged (cloned) when no repair is needed.
pub fn repair_platform_constraints(graph: &Graph) -> Graph {
    let mut repaired = graph.clone();

    if repaired.nodes_of_kind(NodeKind::Database).next().is_none() {
        return repaired;
    }

    let eligible = eligible_db_subnets(&repaired);
    if eligible.len() != 1 {
        return repaired;
    }

    let original = eligible[0];
    let original_id = original.id.clone();
    let original_name = original.display_name().to_string();
    let original_az = original
        .az
        .clone()
        .unwrap_or_else(|| format!("{}a", original.region.as_deref().unwrap_or("us-east-1")));
    let region = original.region.clone();
    let provider = original.provider;
    let (is_public, map_public_ip) = match &original.props {
        NodeProps::Subnet(p) => (p.is_public, p.map_public_ip_on_launch),
        _ => (false, false),
    };
    let network_id = repaired
        .attached_targets(&original_id)
        .into_iter()
        .find(|id| {
            repaired
                .node(id)
                .is_some_and(|n| n.kind() == NodeKind::Network)
        })
        .map(str::to_string);

    let existing: Vec<Ipv4Net> = repaired
        .nodes_of_kind(NodeKind::Subnet)
        .filter_map(|n| match &n.props {
            NodeProps::Subnet(p) => p.cidr_block.parse().ok(),
            _ => None,
        })
        .collect();
    let cidr = next_free_cidr(&existing);
    let az = flip_az_suffix(&original_az);

    let subnet_id = format!("{original_id}-az2");
    info!(
        subnet = %subnet_id,
        cidr = %cidr,
        az = %az,
        "synthesizing second database subnet"
    );

    let mut node = Node::new(
        &subnet_id,
        NodeProps::Subnet(SubnetProps {
            cidr_block: cidr,
            is_public,
            map_public_ip_on_launch: map_public_ip,
            extra: Default::default(),
        }),
    )
    .with_name(format!("{original_name}-az2"))
    .with_az(az)
    .with_tag("Name", format!("netforge-auto-{subnet_id}"))
    .with_tag("ManagedBy", "NetForge")
    .with_tag("AutoCreated", "true");
    if let Some(region) = region {
        node = node.with_region(region);
    }
    if let Some(provider) = provider {
        node = node.with_provider(provider);
    }
    repaired.nodes.push(node);

    if let Some(network_id) = network_id {
        let edge_id = fresh_edge_id(&repaired);
        repaired.edges.push(Edge {
            id: edge_id,
            kind: EdgeKind::AttachedTo,
            from_node: subnet_id,
            to_node: network_id,
            props: None,
        });
    }

    repaired
}

/// First /24 inside 10.0.0.0/16 that is disjoint from every block in use.
fn next_free_cidr(existing: &[Ipv4Net]) -> String {
    for octet in 1..=255u32 {
        let candidate = format!("10.0.{octet}.0/24");
        if let Ok(net) = candidate.parse::<Ipv4Net>() {
            if existing
                .iter()
                .all(|used| !used.contains(&net) && !net.contains(used))
            {
                return candidate;
            }
        }
    }
    "10.0.2.0/24".to_string()
}

/// Flip the trailing AZ letter: `a` becomes `b`, anything else becomes `a`.
fn flip_az_suffix(az: &str) -> String {
    let (head, tail) = az.split_at(az.len().saturating_sub(1));
    let flipped = if tail == "a" { "b" } else { "a" };
    format!("{head}{flipped}")
}

fn fresh_edge_id(graph: &Graph) -> String {
    let mut n = graph.edges.len() + 1;
    loop {
        let id = format!("e{n}");
        if graph.edges.iter().all(|e| e.id != id) {
            return id;
        }
        n += 1;
    }
}
