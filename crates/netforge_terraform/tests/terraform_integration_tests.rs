//! Integration tests for graph-to-Terraform lowering.

use std::collections::BTreeMap;

use netforge_builder::build_topology;
use netforge_graph::{
    Edge, EdgeKind, Graph, Node, NodeKind, NodeProps, RouteTableProps, SecurityGroupProps, SgRule,
    SubnetProps,
};
use netforge_spec::{ComponentRole, ComponentSpec, TopologySpec};
use netforge_terraform::{generate, generate_with_repair, repair_platform_constraints, TfValue};

fn minimal_web_db_graph() -> Graph {
    let spec = TopologySpec {
        components: vec![
            ComponentSpec::new(ComponentRole::WebTier, "simple app"),
            ComponentSpec::new(ComponentRole::DbTier, "with a database"),
        ],
        ..Default::default()
    };
    build_topology(&spec)
}

fn production_graph() -> Graph {
    let spec = TopologySpec {
        components: vec![
            ComponentSpec::new(ComponentRole::WebTier, "production web app"),
            ComponentSpec::new(ComponentRole::DbTier, "database"),
        ],
        ..Default::default()
    };
    build_topology(&spec)
}

#[test]
fn test_generation_is_deterministic() {
    let graph = production_graph();
    let first = generate(&graph).to_json_pretty().unwrap();
    let second = generate(&graph).to_json_pretty().unwrap();
    assert_eq!(first, second, "same graph must render byte-identical output");
}

#[test]
fn test_references_render_as_interpolations() {
    let graph = minimal_web_db_graph();
    let (_, document) = generate_with_repair(&graph);
    let rendered = document.to_json_pretty().unwrap();

    assert!(rendered.contains("\"${aws_vpc.vpc_main.id}\""));
    assert!(rendered.contains("\"${aws_security_group.sg_web.id}\""));
    // No reference is ever pre-resolved to a literal id.
    assert!(!rendered.contains("\"vpc_id\": \"vpc-main\""));
}

#[test]
fn test_name_sanitization_is_consistent() {
    let graph = minimal_web_db_graph();
    let (_, document) = generate_with_repair(&graph);

    assert!(document.resource("aws_subnet", "subnet_public").is_some());
    let rendered = document.to_json_pretty().unwrap();
    // Hyphenated node ids never leak into resource keys or references.
    assert!(!rendered.contains("aws_subnet.subnet-public"));
}

#[test]
fn test_az_repair_synthesizes_second_subnet() {
    let graph = minimal_web_db_graph();
    assert_eq!(graph.nodes_of_kind(NodeKind::Subnet).count(), 1);

    let (repaired, document) = generate_with_repair(&graph);

    let subnets: Vec<&Node> = repaired.nodes_of_kind(NodeKind::Subnet).collect();
    assert_eq!(subnets.len(), 2);
    let synthesized = subnets[1];
    assert_eq!(synthesized.id, "subnet-public-az2");
    assert_eq!(synthesized.az.as_deref(), Some("us-east-1b"));
    assert_eq!(synthesized.tags.get("AutoCreated").map(String::as_str), Some("true"));

    let NodeProps::Subnet(original) = &subnets[0].props else {
        panic!("expected subnet props");
    };
    let NodeProps::Subnet(added) = &synthesized.props else {
        panic!("expected subnet props");
    };
    assert_eq!(original.cidr_block, "10.0.1.0/24");
    assert_eq!(added.cidr_block, "10.0.2.0/24");
    assert_eq!(added.is_public, original.is_public);

    // The synthesized subnet is attached to the network, and the subnet
    // group references both subnets.
    assert_eq!(repaired.attached_targets("subnet-public-az2"), vec!["vpc-main"]);
    let group = document
        .resource("aws_db_subnet_group", "rds_main_subnet_group")
        .unwrap();
    let TfValue::List(ids) = &group["subnet_ids"] else {
        panic!("expected subnet id list");
    };
    assert_eq!(ids.len(), 2);
    let rendered = serde_json::to_string(&group["subnet_ids"]).unwrap();
    assert!(rendered.contains("${aws_subnet.subnet_public.id}"));
    assert!(rendered.contains("${aws_subnet.subnet_public_az2.id}"));
}

#[test]
fn test_repair_is_a_noop_with_enough_subnets() {
    let graph = production_graph();
    let repaired = repair_platform_constraints(&graph);
    assert_eq!(repaired, graph);
}

#[test]
fn test_repair_is_a_noop_without_database() {
    let spec = TopologySpec {
        components: vec![ComponentSpec::new(ComponentRole::WebTier, "simple site")],
        ..Default::default()
    };
    let graph = build_topology(&spec);
    let repaired = repair_platform_constraints(&graph);
    assert_eq!(repaired, graph);
}

#[test]
fn test_nat_gateway_emits_eip_and_depends_on_igw() {
    let graph = production_graph();
    let document = generate(&graph);

    assert!(document.resource("aws_eip", "nat_main_eip").is_some());
    let nat = document.resource("aws_nat_gateway", "nat_main").unwrap();
    let rendered = serde_json::to_string(&nat["depends_on"]).unwrap();
    assert!(rendered.contains("aws_internet_gateway.igw_main"));
    let rendered = serde_json::to_string(&nat["subnet_id"]).unwrap();
    assert!(rendered.contains("${aws_subnet.subnet_public_1.id}"));
}

#[test]
fn test_routes_become_standalone_resources() {
    let graph = production_graph();
    let document = generate(&graph);

    let public_route = document.resource("aws_route", "rt_public_route_0").unwrap();
    let rendered = serde_json::to_string(public_route).unwrap();
    assert!(rendered.contains("${aws_internet_gateway.igw_main.id}"));

    let private_route = document.resource("aws_route", "rt_private_route_0").unwrap();
    let rendered = serde_json::to_string(private_route).unwrap();
    assert!(rendered.contains("${aws_nat_gateway.nat_main.id}"));
}

#[test]
fn test_load_balancer_emits_target_group_and_listener() {
    let graph = production_graph();
    let document = generate(&graph);

    assert!(document.resource("aws_lb", "alb_web").is_some());
    assert!(document.resource("aws_lb_target_group", "alb_web_tg").is_some());
    let listener = document.resource("aws_lb_listener", "alb_web_listener").unwrap();
    let rendered = serde_json::to_string(&listener["load_balancer_arn"]).unwrap();
    assert!(rendered.contains("${aws_lb.alb_web.arn}"));
}

#[test]
fn test_security_group_rules_are_standalone_resources() {
    let graph = production_graph();
    let document = generate(&graph);

    let rules = document.resources_of("aws_security_group_rule").unwrap();
    // web sg: two group-sourced rules plus SSH from the VPC, plus egress.
    assert!(rules.contains_key("sg_web_ingress_0"));
    assert!(rules.contains_key("sg_web_egress_0"));
    let rendered = serde_json::to_string(&rules["sg_web_ingress_0"]).unwrap();
    assert!(rendered.contains("${aws_security_group.sg_alb.id}"));
}

#[test]
fn test_empty_egress_backfilled_with_allow_all() {
    let mut graph = Graph::new("hand-built");
    graph.nodes.push(Node::new(
        "sg-bare",
        NodeProps::SecurityGroup(SecurityGroupProps {
            description: "no egress specified".into(),
            ingress: vec![SgRule::tcp_from_cidrs(80, vec!["0.0.0.0/0".into()])],
            egress: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));
    let document = generate(&graph);

    let egress = document
        .resource("aws_security_group_rule", "sg_bare_egress_0")
        .unwrap();
    let rendered = serde_json::to_string(egress).unwrap();
    assert!(rendered.contains("\"protocol\":\"-1\""));
    assert!(rendered.contains("0.0.0.0/0"));
}

#[test]
fn test_route_table_subnet_edges_become_associations() {
    let mut graph = Graph::new("hand-built");
    graph.nodes.push(
        Node::new(
            "subnet-app",
            NodeProps::Subnet(SubnetProps {
                cidr_block: "10.0.1.0/24".into(),
                is_public: true,
                map_public_ip_on_launch: true,
                extra: BTreeMap::new(),
            }),
        )
        .with_az("us-east-1a"),
    );
    graph.nodes.push(Node::new(
        "rt-app",
        NodeProps::RouteTable(RouteTableProps {
            routes: Vec::new(),
            extra: BTreeMap::new(),
        }),
    ));
    graph.edges.push(Edge {
        id: "e1".into(),
        kind: EdgeKind::AttachedTo,
        from_node: "rt-app".into(),
        to_node: "subnet-app".into(),
        props: None,
    });

    let document = generate(&graph);
    let assoc = document
        .resource("aws_route_table_association", "subnet_app_rt_assoc")
        .unwrap();
    let rendered = serde_json::to_string(assoc).unwrap();
    assert!(rendered.contains("${aws_subnet.subnet_app.id}"));
    assert!(rendered.contains("${aws_route_table.rt_app.id}"));
}

#[test]
fn test_generation_never_fails_on_sparse_graphs() {
    // Structurally valid but missing almost everything.
    let document = generate(&Graph::new("empty"));
    assert!(document.to_json_pretty().is_ok());

    let mut graph = Graph::new("lonely-instance");
    graph.nodes.push(Node::new(
        "ec2-stray",
        NodeProps::ComputeInstance(netforge_graph::ComputeProps {
            instance_type: "t3.micro".into(),
            subnet_id: "subnet-missing".into(),
            security_groups: Vec::new(),
            associate_public_ip: false,
            extra: BTreeMap::new(),
        }),
    ));
    let document = generate(&graph);
    assert!(document.resource("aws_instance", "ec2_stray").is_some());
}

#[test]
fn test_provider_metadata_block() {
    let graph = minimal_web_db_graph();
    let document = generate(&graph);
    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["provider"]["aws"]["region"], "us-east-1");
    assert_eq!(
        value["terraform"]["required_providers"]["aws"]["source"],
        "hashicorp/aws"
    );
}
