//! Integration tests for the validation passes.

use std::collections::BTreeMap;

use netforge_builder::build_topology;
use netforge_graph::{
    ComputeProps, DatabaseProps, Edge, EdgeKind, GatewayKind, GatewayProps, Graph, NetworkProps,
    Node, NodeProps, SecurityGroupProps, Severity, SgRule, SubnetProps,
};
use netforge_spec::{ComponentRole, ComponentSpec, TopologySpec};
use netforge_terraform::repair_platform_constraints;
use netforge_validate::{
    run_all_validations, CidrOverlap, HaSpof, OrphanedNodes, Reachability, ValidationPass,
};

fn vpc() -> Node {
    Node::new(
        "vpc-main",
        NodeProps::Network(NetworkProps {
            cidr_block: "10.0.0.0/16".into(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            extra: BTreeMap::new(),
        }),
    )
}

fn subnet(id: &str, cidr: &str, az: &str) -> Node {
    Node::new(
        id,
        NodeProps::Subnet(SubnetProps {
            cidr_block: cidr.into(),
            is_public: false,
            map_public_ip_on_launch: false,
            extra: BTreeMap::new(),
        }),
    )
    .with_az(az)
}

fn attached(id: &str, from: &str, to: &str) -> Edge {
    Edge {
        id: id.into(),
        kind: EdgeKind::AttachedTo,
        from_node: from.into(),
        to_node: to.into(),
        props: None,
    }
}

fn instance(id: &str, az: &str) -> Node {
    Node::new(
        id,
        NodeProps::ComputeInstance(ComputeProps {
            instance_type: "t3.micro".into(),
            subnet_id: "subnet-a".into(),
            security_groups: Vec::new(),
            associate_public_ip: false,
            extra: BTreeMap::new(),
        }),
    )
    .with_az(az)
}

#[test]
fn test_overlapping_cidrs_yield_exactly_one_error() {
    let mut graph = Graph::new("g");
    graph.nodes.push(vpc());
    graph.nodes.push(subnet("subnet-a", "10.0.1.0/24", "us-east-1a"));
    graph.nodes.push(subnet("subnet-b", "10.0.1.128/25", "us-east-1b"));
    graph.edges.push(attached("e1", "subnet-a", "vpc-main"));
    graph.edges.push(attached("e2", "subnet-b", "vpc-main"));

    let results = CidrOverlap.run(&graph);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].severity, Severity::Error);
    assert_eq!(results[0].node_ids, vec!["subnet-a", "subnet-b"]);
}

#[test]
fn test_disjoint_cidrs_yield_nothing() {
    let mut graph = Graph::new("g");
    graph.nodes.push(vpc());
    graph.nodes.push(subnet("subnet-a", "10.0.1.0/24", "us-east-1a"));
    graph.nodes.push(subnet("subnet-b", "10.0.2.0/24", "us-east-1b"));
    graph.edges.push(attached("e1", "subnet-a", "vpc-main"));
    graph.edges.push(attached("e2", "subnet-b", "vpc-main"));

    assert!(CidrOverlap.run(&graph).is_empty());
}

#[test]
fn test_unparsable_cidr_is_an_error() {
    let mut graph = Graph::new("g");
    graph.nodes.push(vpc());
    graph.nodes.push(subnet("subnet-a", "10.0.1.0/24", "us-east-1a"));
    graph.nodes.push(subnet("subnet-b", "not-a-cidr", "us-east-1b"));
    graph.edges.push(attached("e1", "subnet-a", "vpc-main"));
    graph.edges.push(attached("e2", "subnet-b", "vpc-main"));

    let results = CidrOverlap.run(&graph);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].severity, Severity::Error);
    assert!(results[0].message.contains("not-a-cidr"));
    assert_eq!(results[0].node_ids, vec!["subnet-b"]);
}

#[test]
fn test_unattached_subnet_yields_one_warning() {
    let mut graph = Graph::new("g");
    graph.nodes.push(vpc());
    graph.nodes.push(subnet("subnet-stray", "10.0.9.0/24", "us-east-1a"));

    let results = OrphanedNodes.run(&graph);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].severity, Severity::Warning);
    assert_eq!(results[0].node_ids, vec!["subnet-stray"]);
    assert!(results[0].message.contains("subnet-stray"));
}

#[test]
fn test_orphan_wording_per_kind() {
    let mut graph = Graph::new("g");
    graph.nodes.push(instance("ec2-stray", "us-east-1a"));
    graph.nodes.push(Node::new(
        "nat-stray",
        NodeProps::Gateway(GatewayProps {
            gateway_type: GatewayKind::Nat,
            subnet_id: None,
            extra: BTreeMap::new(),
        }),
    ));
    graph.nodes.push(Node::new(
        "sg-stray",
        NodeProps::SecurityGroup(SecurityGroupProps {
            description: "stray".into(),
            ingress: Vec::new(),
            egress: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));

    let results = OrphanedNodes.run(&graph);
    assert_eq!(results.len(), 3);
    assert!(results[0].message.contains("not attached to any subnet"));
    assert!(results[1].message.contains("not attached to any subnet"));
    assert!(results[2].message.contains("not attached to any VPC"));
}

#[test]
fn test_nat_gateway_subnet_prop_counts_as_placement() {
    let mut graph = Graph::new("g");
    graph.nodes.push(Node::new(
        "nat-main",
        NodeProps::Gateway(GatewayProps {
            gateway_type: GatewayKind::Nat,
            subnet_id: Some("subnet-public-1".into()),
            extra: BTreeMap::new(),
        }),
    ));
    assert!(OrphanedNodes.run(&graph).is_empty());
}

#[test]
fn test_open_database_port_yields_two_distinct_errors() {
    let mut graph = Graph::new("g");
    graph.nodes.push(Node::new(
        "sg-db",
        NodeProps::SecurityGroup(SecurityGroupProps {
            description: "db".into(),
            ingress: vec![SgRule::tcp_from_cidrs(5432, vec!["0.0.0.0/0".into()])],
            egress: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));
    graph.nodes.push(
        Node::new(
            "rds-1",
            NodeProps::Database(DatabaseProps {
                engine: "postgres".into(),
                engine_version: "15.4".into(),
                instance_class: "db.t3.micro".into(),
                allocated_storage: 20,
                subnet_ids: vec!["subnet-db-1".into()],
                security_groups: Vec::new(),
                multi_az: false,
                publicly_accessible: false,
                extra: BTreeMap::new(),
            }),
        )
        .with_name("main-db"),
    );
    graph.edges.push(Edge {
        id: "e1".into(),
        kind: EdgeKind::ProtectedBy,
        from_node: "rds-1".into(),
        to_node: "sg-db".into(),
        props: None,
    });

    let results = Reachability.run(&graph);
    assert_eq!(results.len(), 2, "both findings must be preserved, not merged");
    assert!(results.iter().all(|r| r.severity == Severity::Error));
    assert!(results[0].message.contains("internet access to database(s): main-db"));
    assert!(results[1].message.contains("PostgreSQL (port 5432)"));
    assert_ne!(results[0].id, results[1].id);
}

#[test]
fn test_group_references_in_props_are_resolved() {
    let mut graph = Graph::new("g");
    graph.nodes.push(Node::new(
        "sg-db",
        NodeProps::SecurityGroup(SecurityGroupProps {
            description: "db".into(),
            ingress: vec![SgRule::tcp_from_cidrs(3306, vec!["0.0.0.0/0".into()])],
            egress: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));
    // No protection edge; only the props reference ties the db to the group.
    graph.nodes.push(Node::new(
        "rds-1",
        NodeProps::Database(DatabaseProps {
            engine: "mysql".into(),
            engine_version: "8.0".into(),
            instance_class: "db.t3.micro".into(),
            allocated_storage: 20,
            subnet_ids: vec!["subnet-db-1".into()],
            security_groups: vec!["sg-db".into()],
            multi_az: false,
            publicly_accessible: false,
            extra: BTreeMap::new(),
        }),
    ));

    let results = Reachability.run(&graph);
    assert_eq!(results.len(), 2);
    assert!(results[0].message.contains("internet access to database(s)"));
    assert!(results[1].message.contains("MySQL (port 3306)"));
}

#[test]
fn test_open_ssh_is_a_warning() {
    let mut graph = Graph::new("g");
    graph.nodes.push(Node::new(
        "sg-web",
        NodeProps::SecurityGroup(SecurityGroupProps {
            description: "web".into(),
            ingress: vec![SgRule::tcp_from_cidrs(22, vec!["0.0.0.0/0".into()])],
            egress: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));
    let results = Reachability.run(&graph);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].severity, Severity::Warning);
    assert!(results[0].message.contains("SSH (22)"));
}

#[test]
fn test_port_range_covering_sensitive_ports_flags_each() {
    let mut graph = Graph::new("g");
    graph.nodes.push(Node::new(
        "sg-wide",
        NodeProps::SecurityGroup(SecurityGroupProps {
            description: "wide open".into(),
            ingress: vec![SgRule {
                from_port: 0,
                to_port: 65535,
                protocol: "tcp".into(),
                source: netforge_graph::RuleSource::Cidrs {
                    cidr_blocks: vec!["0.0.0.0/0".into()],
                },
                description: None,
            }],
            egress: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));
    let results = Reachability.run(&graph);
    // One finding per recognized sensitive port.
    assert_eq!(results.len(), 7);
}

#[test]
fn test_three_instances_in_one_az_yield_one_warning() {
    let mut graph = Graph::new("g");
    graph.nodes.push(instance("ec2-1", "us-east-1a"));
    graph.nodes.push(instance("ec2-2", "us-east-1a"));
    graph.nodes.push(instance("ec2-3", "us-east-1a"));

    let results = HaSpof.run(&graph);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].severity, Severity::Warning);
    assert_eq!(results[0].node_ids, vec!["ec2-1", "ec2-2", "ec2-3"]);
}

#[test]
fn test_spread_instances_yield_no_compute_warning() {
    let mut graph = Graph::new("g");
    graph.nodes.push(instance("ec2-1", "us-east-1a"));
    graph.nodes.push(instance("ec2-2", "us-east-1b"));
    assert!(HaSpof.run(&graph).is_empty());
}

#[test]
fn test_single_nat_across_azs_is_a_warning() {
    let mut graph = Graph::new("g");
    graph.nodes.push(subnet("subnet-a", "10.0.1.0/24", "us-east-1a"));
    graph.nodes.push(subnet("subnet-b", "10.0.2.0/24", "us-east-1b"));
    graph.nodes.push(
        Node::new(
            "nat-main",
            NodeProps::Gateway(GatewayProps {
                gateway_type: GatewayKind::Nat,
                subnet_id: Some("subnet-a".into()),
                extra: BTreeMap::new(),
            }),
        )
        .with_az("us-east-1a"),
    );

    let results = HaSpof.run(&graph);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].severity, Severity::Warning);
    assert_eq!(results[0].node_ids, vec!["nat-main"]);
    assert!(results[0].message.contains("subnets span 2 AZs"));
}

#[test]
fn test_load_balancer_over_single_az_fleet_is_a_warning() {
    let mut graph = Graph::new("g");
    graph.nodes.push(instance("ec2-1", "us-east-1a"));
    graph.nodes.push(instance("ec2-2", "us-east-1a"));
    graph.nodes.push(Node::new(
        "alb-web",
        NodeProps::LoadBalancer(netforge_graph::LoadBalancerProps {
            lb_type: "application".into(),
            scheme: "internet-facing".into(),
            subnets: Vec::new(),
            security_groups: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));

    let results = HaSpof.run(&graph);
    // Single-AZ compute warning plus the load-balancer warning.
    assert_eq!(results.len(), 2);
    let lb_warning = results.iter().find(|r| r.message.contains("Load balancer")).unwrap();
    assert_eq!(lb_warning.node_ids, vec!["alb-web", "ec2-1", "ec2-2"]);
}

#[test]
fn test_engine_preserves_pass_order_without_dedup() {
    let mut graph = Graph::new("g");
    graph.nodes.push(vpc());
    // Overlapping subnets (cidr pass), a stray subnet (orphan pass), an
    // open SSH rule (reachability), and a single-AZ fleet (ha).
    graph.nodes.push(subnet("subnet-a", "10.0.1.0/24", "us-east-1a"));
    graph.nodes.push(subnet("subnet-b", "10.0.1.0/25", "us-east-1b"));
    graph.nodes.push(subnet("subnet-stray", "10.0.9.0/24", "us-east-1a"));
    graph.edges.push(attached("e1", "subnet-a", "vpc-main"));
    graph.edges.push(attached("e2", "subnet-b", "vpc-main"));
    graph.nodes.push(Node::new(
        "sg-web",
        NodeProps::SecurityGroup(SecurityGroupProps {
            description: "web".into(),
            ingress: vec![SgRule::tcp_from_cidrs(22, vec!["0.0.0.0/0".into()])],
            egress: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));
    graph.nodes.push(instance("ec2-1", "us-east-1a"));
    graph.nodes.push(instance("ec2-2", "us-east-1a"));
    graph.edges.push(attached("e3", "ec2-1", "subnet-a"));
    graph.edges.push(attached("e4", "ec2-2", "subnet-a"));

    let results = run_all_validations(&graph);
    let prefixes: Vec<&str> = results
        .iter()
        .map(|r| r.id.rsplit_once('-').map(|(head, _)| head).unwrap_or(&r.id))
        .collect();
    assert_eq!(
        prefixes,
        vec![
            "cidr-overlap",
            "orphan-subnet",
            "orphan-sg",
            "security-ssh-open",
            "ha-single-az-compute",
        ]
    );
}

#[test]
fn test_pipeline_validates_repaired_graph_cleanly() {
    let spec = TopologySpec {
        components: vec![
            ComponentSpec::new(ComponentRole::WebTier, "simple app"),
            ComponentSpec::new(ComponentRole::DbTier, "with a database"),
        ],
        ..Default::default()
    };
    let graph = build_topology(&spec);
    let repaired = repair_platform_constraints(&graph);
    let results = run_all_validations(&repaired);

    // The synthesized subnet arrives attached, so the only findings are the
    // deliberate minimal-tier tradeoffs: open SSH and a single-AZ database.
    assert_eq!(results.len(), 2);
    assert!(results[0].message.contains("SSH (22)"));
    assert_eq!(results[0].severity, Severity::Warning);
    assert!(results[1].message.contains("Multi-AZ"));
    assert_eq!(results[1].severity, Severity::Info);
}

#[test]
fn test_production_topology_known_findings() {
    let spec = TopologySpec {
        components: vec![
            ComponentSpec::new(ComponentRole::WebTier, "production web app"),
            ComponentSpec::new(ComponentRole::DbTier, "database"),
        ],
        ..Default::default()
    };
    let graph = build_topology(&spec);
    let results = run_all_validations(&graph);

    // A non-multi-AZ database and a single NAT serving two AZs.
    assert_eq!(results.len(), 2);
    assert!(results[0].message.contains("Multi-AZ"));
    assert!(results[1].message.contains("Single NAT Gateway"));
    assert!(results.iter().all(|r| r.severity != Severity::Error));
}
