//! Per-kind emitters from graph nodes to Terraform resource blocks.

use serde_json::{json, Value};
use tracing::{debug, info};

use netforge_graph::{
    ComputeProps, DatabaseProps, EdgeKind, GatewayKind, GatewayProps, Graph, LoadBalancerProps,
    NetworkProps, Node, NodeKind, NodeProps, RouteTableProps, RuleSource, SecurityGroupProps,
    SgRule, SubnetProps,
};

use crate::document::{AttrMap, TerraformDocument};
use crate::repair::{eligible_db_subnets, repair_platform_constraints};
use crate::value::{sanitize_name, TfValue};

/// Amazon Linux 2023 AMIs per region.
const AMI_BY_REGION: &[(&str, &str)] = &[
    ("us-east-1", "ami-0c7217cdde317cfec"),
    ("us-east-2", "ami-0900fe555666598a2"),
    ("us-west-1", "ami-0827b6c5b977c020e"),
    ("us-west-2", "ami-0f3769c8d8429942f"),
    ("ca-central-1", "ami-0a2e7efb4257c0907"),
    ("eu-west-1", "ami-0694d931cee176e7d"),
    ("eu-central-1", "ami-0faab6bdbac9486fb"),
];

const FALLBACK_REGION: &str = "us-east-2";

/// Generate a configuration document from a graph, without running the
/// constraint-repair pre-pass.
pub fn generate(graph: &Graph) -> TerraformDocument {
    TerraformGenerator::new(graph).generate()
}

/// Run the constraint-repair pre-pass and generate from the repaired graph.
/// Returns the repaired graph so diagnostics can reflect the same topology
/// the document was emitted from.
pub fn generate_with_repair(graph: &Graph) -> (Graph, TerraformDocument) {
    let repaired = repair_platform_constraints(graph);
    let document = TerraformGenerator::new(&repaired).generate();
    (repaired, document)
}

/// Lowers a topology graph into Terraform-JSON resource blocks.
///
/// A single pass over the nodes dispatches on kind; a second pass over the
/// edges emits join resources that need both endpoints present. Emission
/// never fails for a structurally valid graph.
pub struct TerraformGenerator<'a> {
    graph: &'a Graph,
    vpc_name: Option<String>,
    igw_name: Option<String>,
}

impl<'a> TerraformGenerator<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        let vpc_name = graph.network().map(|n| sanitize_name(&n.id));
        let igw_name = graph.internet_gateway().map(|n| sanitize_name(&n.id));
        Self {
            graph,
            vpc_name,
            igw_name,
        }
    }

    /// Lower the whole graph into a document.
    pub fn generate(&self) -> TerraformDocument {
        info!(graph = %self.graph.id, "generating terraform configuration");
        let region = self.graph.region().unwrap_or(FALLBACK_REGION);
        let mut doc = TerraformDocument::for_aws(region);

        for node in &self.graph.nodes {
            match &node.props {
                NodeProps::Network(props) => self.emit_vpc(&mut doc, node, props),
                NodeProps::Subnet(props) => self.emit_subnet(&mut doc, node, props),
                NodeProps::Gateway(props) => self.emit_gateway(&mut doc, node, props),
                NodeProps::RouteTable(props) => self.emit_route_table(&mut doc, node, props),
                NodeProps::SecurityGroup(props) => {
                    self.emit_security_group(&mut doc, node, props)
                }
                NodeProps::LoadBalancer(props) => self.emit_load_balancer(&mut doc, node, props),
                NodeProps::ComputeInstance(props) => self.emit_instance(&mut doc, node, props),
                NodeProps::Database(props) => self.emit_database(&mut doc, node, props),
                // Not lowered to configuration.
                NodeProps::TrafficGenerator(_) => {}
            }
        }

        self.emit_route_table_associations(&mut doc);
        doc
    }

    fn vpc_ref(&self) -> TfValue {
        TfValue::reference(
            "aws_vpc",
            self.vpc_name.as_deref().unwrap_or("vpc_main"),
            "id",
        )
    }

    /// Resource address of the internet gateway, for `depends_on`.
    fn igw_address(&self) -> String {
        format!(
            "aws_internet_gateway.{}",
            self.igw_name.as_deref().unwrap_or("igw_main")
        )
    }

    fn tags_value(node: &Node) -> TfValue {
        if node.tags.is_empty() {
            return TfValue::Literal(json!({ "Name": node.display_name() }));
        }
        let map: Value = node
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect::<serde_json::Map<String, Value>>()
            .into();
        TfValue::Literal(map)
    }

    fn emit_vpc(&self, doc: &mut TerraformDocument, node: &Node, props: &NetworkProps) {
        let mut attrs = AttrMap::new();
        attrs.insert("cidr_block".into(), props.cidr_block.clone().into());
        attrs.insert(
            "enable_dns_hostnames".into(),
            props.enable_dns_hostnames.into(),
        );
        attrs.insert("enable_dns_support".into(), props.enable_dns_support.into());
        attrs.insert("tags".into(), Self::tags_value(node));
        doc.insert_resource("aws_vpc", sanitize_name(&node.id), attrs);
    }

    fn emit_subnet(&self, doc: &mut TerraformDocument, node: &Node, props: &SubnetProps) {
        let az = node.az.clone().unwrap_or_else(|| {
            format!("{}a", node.region.as_deref().unwrap_or("us-east-1"))
        });
        let mut attrs = AttrMap::new();
        attrs.insert("vpc_id".into(), self.vpc_ref());
        attrs.insert("cidr_block".into(), props.cidr_block.clone().into());
        attrs.insert("availability_zone".into(), az.into());
        attrs.insert(
            "map_public_ip_on_launch".into(),
            props.map_public_ip_on_launch.into(),
        );
        attrs.insert("tags".into(), Self::tags_value(node));
        doc.insert_resource("aws_subnet", sanitize_name(&node.id), attrs);
    }

    fn emit_gateway(&self, doc: &mut TerraformDocument, node: &Node, props: &GatewayProps) {
        let name = sanitize_name(&node.id);
        match props.gateway_type {
            GatewayKind::Internet => {
                let mut attrs = AttrMap::new();
                attrs.insert("vpc_id".into(), self.vpc_ref());
                attrs.insert("tags".into(), Self::tags_value(node));
                doc.insert_resource("aws_internet_gateway", name, attrs);
            }
            GatewayKind::Nat => {
                // NAT needs an elastic IP of its own.
                let eip_name = format!("{name}_eip");
                let mut eip_attrs = AttrMap::new();
                eip_attrs.insert("domain".into(), "vpc".into());
                eip_attrs.insert(
                    "tags".into(),
                    TfValue::Literal(json!({ "Name": format!("{}-eip", node.display_name()) })),
                );
                doc.insert_resource("aws_eip", eip_name.clone(), eip_attrs);

                let subnet_id = props.subnet_id.as_deref().unwrap_or("subnet-public-1");
                let mut attrs = AttrMap::new();
                attrs.insert(
                    "allocation_id".into(),
                    TfValue::reference("aws_eip", eip_name, "id"),
                );
                attrs.insert(
                    "subnet_id".into(),
                    TfValue::reference("aws_subnet", sanitize_name(subnet_id), "id"),
                );
                attrs.insert("tags".into(), Self::tags_value(node));
                attrs.insert(
                    "depends_on".into(),
                    TfValue::List(vec![self.igw_address().into()]),
                );
                doc.insert_resource("aws_nat_gateway", name, attrs);
            }
        }
    }

    fn emit_route_table(&self, doc: &mut TerraformDocument, node: &Node, props: &RouteTableProps) {
        let name = sanitize_name(&node.id);
        let mut attrs = AttrMap::new();
        attrs.insert("vpc_id".into(), self.vpc_ref());
        attrs.insert("tags".into(), Self::tags_value(node));
        doc.insert_resource("aws_route_table", name.clone(), attrs);

        // Routes as standalone resources rather than inline blocks.
        for (idx, route) in props.routes.iter().enumerate() {
            let mut route_attrs = AttrMap::new();
            route_attrs.insert(
                "route_table_id".into(),
                TfValue::reference("aws_route_table", name.clone(), "id"),
            );
            route_attrs.insert(
                "destination_cidr_block".into(),
                route.destination.clone().into(),
            );
            if route.target.contains("igw") {
                route_attrs.insert(
                    "gateway_id".into(),
                    TfValue::reference("aws_internet_gateway", sanitize_name(&route.target), "id"),
                );
            } else if route.target.contains("nat") {
                route_attrs.insert(
                    "nat_gateway_id".into(),
                    TfValue::reference("aws_nat_gateway", sanitize_name(&route.target), "id"),
                );
            }
            doc.insert_resource("aws_route", format!("{name}_route_{idx}"), route_attrs);
        }
    }

    fn emit_security_group(
        &self,
        doc: &mut TerraformDocument,
        node: &Node,
        props: &SecurityGroupProps,
    ) {
        let name = sanitize_name(&node.id);
        let mut attrs = AttrMap::new();
        attrs.insert("name".into(), node.display_name().into());
        attrs.insert("description".into(), props.description.clone().into());
        attrs.insert("vpc_id".into(), self.vpc_ref());
        attrs.insert("tags".into(), Self::tags_value(node));
        doc.insert_resource("aws_security_group", name.clone(), attrs);

        for (idx, rule) in props.ingress.iter().enumerate() {
            let rule_attrs = self.rule_attrs(&name, "ingress", rule);
            doc.insert_resource(
                "aws_security_group_rule",
                format!("{name}_ingress_{idx}"),
                rule_attrs,
            );
        }

        let default_egress;
        let egress: &[SgRule] = if props.egress.is_empty() {
            // Backfill for graphs built outside the builder.
            default_egress = [SgRule {
                description: Some("Allow all outbound".to_string()),
                ..SgRule::allow_all_egress()
            }];
            &default_egress
        } else {
            &props.egress
        };
        for (idx, rule) in egress.iter().enumerate() {
            let rule_attrs = self.rule_attrs(&name, "egress", rule);
            doc.insert_resource(
                "aws_security_group_rule",
                format!("{name}_egress_{idx}"),
                rule_attrs,
            );
        }
    }

    fn rule_attrs(&self, group_name: &str, direction: &str, rule: &SgRule) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert("type".into(), direction.into());
        attrs.insert(
            "security_group_id".into(),
            TfValue::reference("aws_security_group", group_name, "id"),
        );
        attrs.insert("from_port".into(), rule.from_port.into());
        attrs.insert("to_port".into(), rule.to_port.into());
        attrs.insert("protocol".into(), rule.protocol.clone().into());
        attrs.insert(
            "description".into(),
            rule.description.clone().unwrap_or_default().into(),
        );
        match &rule.source {
            RuleSource::Cidrs { cidr_blocks } => {
                attrs.insert(
                    "cidr_blocks".into(),
                    TfValue::Literal(json!(cidr_blocks)),
                );
            }
            RuleSource::Group {
                source_security_group,
            } => {
                attrs.insert(
                    "source_security_group_id".into(),
                    TfValue::reference(
                        "aws_security_group",
                        sanitize_name(source_security_group),
                        "id",
                    ),
                );
            }
        }
        attrs
    }

    fn emit_load_balancer(
        &self,
        doc: &mut TerraformDocument,
        node: &Node,
        props: &LoadBalancerProps,
    ) {
        let name = sanitize_name(&node.id);

        let subnet_refs: Vec<TfValue> = props
            .subnets
            .iter()
            .map(|s| TfValue::reference("aws_subnet", sanitize_name(s), "id"))
            .collect();
        let sg_refs: Vec<TfValue> = props
            .security_groups
            .iter()
            .map(|s| TfValue::reference("aws_security_group", sanitize_name(s), "id"))
            .collect();

        let mut attrs = AttrMap::new();
        // ALB names are capped at 32 characters.
        attrs.insert("name".into(), truncate(node.display_name(), 32).into());
        attrs.insert("internal".into(), (props.scheme != "internet-facing").into());
        attrs.insert("load_balancer_type".into(), "application".into());
        attrs.insert("security_groups".into(), TfValue::List(sg_refs));
        attrs.insert("subnets".into(), TfValue::List(subnet_refs));
        attrs.insert("tags".into(), Self::tags_value(node));
        doc.insert_resource("aws_lb", name.clone(), attrs);

        let tg_name = format!("{name}_tg");
        let mut tg_attrs = AttrMap::new();
        tg_attrs.insert(
            "name".into(),
            format!("{}-tg", truncate(node.display_name(), 26)).into(),
        );
        tg_attrs.insert("port".into(), 80u16.into());
        tg_attrs.insert("protocol".into(), "HTTP".into());
        tg_attrs.insert("vpc_id".into(), self.vpc_ref());
        tg_attrs.insert(
            "health_check".into(),
            TfValue::Literal(json!({
                "path": "/",
                "healthy_threshold": 2,
                "unhealthy_threshold": 10
            })),
        );
        doc.insert_resource("aws_lb_target_group", tg_name.clone(), tg_attrs);

        let mut listener_attrs = AttrMap::new();
        listener_attrs.insert(
            "load_balancer_arn".into(),
            TfValue::reference("aws_lb", name.clone(), "arn"),
        );
        listener_attrs.insert("port".into(), 80u16.into());
        listener_attrs.insert("protocol".into(), "HTTP".into());
        let mut action = AttrMap::new();
        action.insert("type".into(), "forward".into());
        action.insert(
            "target_group_arn".into(),
            TfValue::reference("aws_lb_target_group", tg_name, "arn"),
        );
        listener_attrs.insert("default_action".into(), TfValue::Map(action));
        doc.insert_resource("aws_lb_listener", format!("{name}_listener"), listener_attrs);
    }

    fn emit_instance(&self, doc: &mut TerraformDocument, node: &Node, props: &ComputeProps) {
        let region = node.region.as_deref().unwrap_or(FALLBACK_REGION);
        let ami = AMI_BY_REGION
            .iter()
            .find(|(r, _)| *r == region)
            .or_else(|| AMI_BY_REGION.iter().find(|(r, _)| *r == FALLBACK_REGION))
            .map(|(_, ami)| *ami)
            .unwrap_or_default();

        let sg_refs: Vec<TfValue> = props
            .security_groups
            .iter()
            .map(|s| TfValue::reference("aws_security_group", sanitize_name(s), "id"))
            .collect();

        let mut attrs = AttrMap::new();
        attrs.insert("ami".into(), ami.into());
        attrs.insert("instance_type".into(), props.instance_type.clone().into());
        attrs.insert(
            "subnet_id".into(),
            TfValue::reference("aws_subnet", sanitize_name(&props.subnet_id), "id"),
        );
        attrs.insert("vpc_security_group_ids".into(), TfValue::List(sg_refs));
        attrs.insert("tags".into(), Self::tags_value(node));
        doc.insert_resource("aws_instance", sanitize_name(&node.id), attrs);
    }

    fn emit_database(&self, doc: &mut TerraformDocument, node: &Node, props: &DatabaseProps) {
        let name = sanitize_name(&node.id);

        let eligible = eligible_db_subnets(self.graph);
        let mut subnet_refs: Vec<TfValue> = eligible
            .iter()
            .map(|s| TfValue::reference("aws_subnet", sanitize_name(&s.id), "id"))
            .collect();
        // The repair pre-pass guarantees two subnets on the normal path;
        // degrade rather than fail when generating from an unrepaired graph.
        if subnet_refs.len() == 1 {
            debug!(database = %node.id, "single eligible subnet, duplicating reference");
            subnet_refs.push(subnet_refs[0].clone());
        }

        let group_res = format!("{name}_subnet_group");
        let mut group_attrs = AttrMap::new();
        group_attrs.insert(
            "name".into(),
            format!("{}-subnet-group", truncate(node.display_name(), 20)).into(),
        );
        group_attrs.insert("subnet_ids".into(), TfValue::List(subnet_refs));
        group_attrs.insert(
            "tags".into(),
            TfValue::Literal(json!({
                "Name": format!("{}-subnet-group", node.display_name())
            })),
        );
        doc.insert_resource("aws_db_subnet_group", group_res.clone(), group_attrs);

        let sg_refs: Vec<TfValue> = props
            .security_groups
            .iter()
            .map(|s| TfValue::reference("aws_security_group", sanitize_name(s), "id"))
            .collect();

        let mut attrs = AttrMap::new();
        attrs.insert(
            "identifier".into(),
            truncate(node.display_name(), 63).into(),
        );
        attrs.insert("engine".into(), props.engine.clone().into());
        attrs.insert("engine_version".into(), props.engine_version.clone().into());
        attrs.insert("instance_class".into(), props.instance_class.clone().into());
        attrs.insert("allocated_storage".into(), props.allocated_storage.into());
        attrs.insert("db_name".into(), "netforgedb".into());
        attrs.insert("username".into(), "netforgeadmin".into());
        // Placeholder credential; a secrets manager takes over at deploy time.
        attrs.insert("password".into(), "NetForge2024!Secure".into());
        attrs.insert(
            "db_subnet_group_name".into(),
            TfValue::reference("aws_db_subnet_group", group_res, "name"),
        );
        attrs.insert("vpc_security_group_ids".into(), TfValue::List(sg_refs));
        attrs.insert("skip_final_snapshot".into(), true.into());
        attrs.insert("publicly_accessible".into(), false.into());
        attrs.insert("tags".into(), Self::tags_value(node));
        doc.insert_resource("aws_db_instance", name, attrs);
    }

    /// Join resources that need both endpoints already emitted: route-table
    /// to subnet associations, keyed off `attached_to` edges between those
    /// two kinds.
    fn emit_route_table_associations(&self, doc: &mut TerraformDocument) {
        for edge in &self.graph.edges {
            if edge.kind != EdgeKind::AttachedTo {
                continue;
            }
            let (Some(from), Some(to)) = (
                self.graph.node(&edge.from_node),
                self.graph.node(&edge.to_node),
            ) else {
                continue;
            };
            if from.kind() != NodeKind::RouteTable || to.kind() != NodeKind::Subnet {
                continue;
            }
            let mut attrs = AttrMap::new();
            attrs.insert(
                "subnet_id".into(),
                TfValue::reference("aws_subnet", sanitize_name(&to.id), "id"),
            );
            attrs.insert(
                "route_table_id".into(),
                TfValue::reference("aws_route_table", sanitize_name(&from.id), "id"),
            );
            doc.insert_resource(
                "aws_route_table_association",
                format!("{}_rt_assoc", sanitize_name(&to.id)),
                attrs,
            );
        }
    }
}

/// Character-safe prefix truncation.
fn truncate(s: &str, max_len: usize) -> &str {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
