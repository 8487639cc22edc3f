//! Lower a topology spec into a topology graph.
//!
//! The builder never fails for a syntactically valid spec: unknown roles
//! were already degraded at deserialization, and every missing constraint
//! falls back to a fixed default. Session-scoped counters (CIDR allocator,
//! edge-id allocator) live on the builder and do not outlive one build call.

use serde_json::json;
use tracing::{debug, info};

use netforge_graph::{
    ComputeProps, DatabaseProps, Edge, EdgeKind, EdgeProps, GatewayKind, GatewayProps, Graph,
    LoadBalancerProps, NetworkProps, Node, NodeProps, Provider, Route, RouteTableProps,
    SecurityGroupProps, SgRule, SubnetProps,
};
use netforge_spec::{ComponentRole, TopologySpec};

use crate::tier::{classify, Tier};

const VPC_CIDR: &str = "10.0.0.0/16";
const OPEN_CIDR: &str = "0.0.0.0/0";

const DEFAULT_INSTANCE_TYPE: &str = "t3.micro";
const DEFAULT_DB_ENGINE: &str = "postgres";
const DEFAULT_DB_INSTANCE_CLASS: &str = "db.t3.micro";
const DEFAULT_DB_STORAGE_GB: u32 = 20;

const MANAGED_BY_TAG: (&str, &str) = ("ManagedBy", "NetForge");

const AZ_SUFFIXES: [char; 6] = ['a', 'b', 'c', 'd', 'e', 'f'];

/// Default port for a database engine: 5432 for postgres, 3306 otherwise.
fn engine_port(engine: &str) -> u16 {
    if engine == "postgres" {
        5432
    } else {
        3306
    }
}

/// Default engine version: 15.4 for postgres, 8.0 otherwise.
fn engine_version(engine: &str) -> &'static str {
    if engine == "postgres" {
        "15.4"
    } else {
        "8.0"
    }
}

/// Build a topology graph from a spec.
pub fn build_topology(spec: &TopologySpec) -> Graph {
    TopologyBuilder::new(spec).build()
}

/// Builds a [`Graph`] from a [`TopologySpec`] according to the selected tier.
pub struct TopologyBuilder<'a> {
    spec: &'a TopologySpec,
    tier: Tier,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    subnet_counter: u32,
    edge_counter: u32,
    vpc_id: Option<String>,
    igw_id: Option<String>,
    nat_id: Option<String>,
    public_subnet_ids: Vec<String>,
    private_subnet_ids: Vec<String>,
    web_sg_id: Option<String>,
    db_sg_id: Option<String>,
    alb_sg_id: Option<String>,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(spec: &'a TopologySpec) -> Self {
        Self {
            spec,
            tier: classify(spec),
            nodes: Vec::new(),
            edges: Vec::new(),
            subnet_counter: 1,
            edge_counter: 0,
            vpc_id: None,
            igw_id: None,
            nat_id: None,
            public_subnet_ids: Vec::new(),
            private_subnet_ids: Vec::new(),
            web_sg_id: None,
            db_sg_id: None,
            alb_sg_id: None,
        }
    }

    /// The tier the spec classified into.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Build the complete topology graph.
    pub fn build(self) -> Graph {
        info!(
            tier = %self.tier,
            region = %self.spec.region,
            "building topology graph"
        );
        match self.tier {
            Tier::Minimal => self.build_minimal(),
            Tier::Production => self.build_production(),
        }
    }

    /// Minimal tier: one AZ, one public subnet, IGW only. Compute sits in
    /// the public subnet; a requested database shares it but is never made
    /// publicly reachable.
    fn build_minimal(mut self) -> Graph {
        self.create_vpc();
        self.create_internet_gateway();
        self.create_single_public_subnet();
        self.create_simple_route_table();

        let has_web = self.spec.has_role(ComponentRole::WebTier);
        let has_db = self.spec.has_role(ComponentRole::DbTier);

        if has_web {
            self.create_minimal_web_security_group();
        }
        if has_db {
            self.create_db_security_group(true);
        }
        if has_web {
            let quantity = self.quantity_for(ComponentRole::WebTier);
            self.create_minimal_instances(quantity);
        }
        if has_db {
            self.create_minimal_database();
        }

        self.finish()
    }

    /// Production tier: two AZs, public subnets for the load balancer,
    /// private subnets for compute and database, NAT gateway, ALB.
    fn build_production(mut self) -> Graph {
        self.create_vpc();
        self.create_internet_gateway();

        let has_web = self.spec.has_role(ComponentRole::WebTier);
        let has_db = self.spec.has_role(ComponentRole::DbTier);
        let web_quantity = self.quantity_for(ComponentRole::WebTier);
        let db_quantity = self.quantity_for(ComponentRole::DbTier);

        let num_azs = 2;

        if has_web {
            self.create_public_subnets(num_azs);
            self.create_private_subnets(num_azs, "web");
            self.create_nat_gateway();
        }
        if has_db {
            self.create_private_subnets(num_azs, "db");
        }

        self.create_route_tables();

        if has_web {
            self.create_alb_security_group();
            self.create_web_security_group();
        }
        if has_db {
            self.create_db_security_group(false);
        }
        if has_web {
            self.create_load_balancer();
            self.create_web_instances(web_quantity);
        }
        if has_db {
            self.create_database_instances(db_quantity);
        }

        self.finish()
    }

    fn finish(self) -> Graph {
        let mut graph = Graph::new(format!("topo-{}-{}", self.tier.mode(), self.spec.region));
        graph.name = Some(format!(
            "{} - {}",
            match self.tier {
                Tier::Minimal => "Minimal (hobby)",
                Tier::Production => "Production (HA)",
            },
            self.spec.region
        ));
        graph.nodes = self.nodes;
        graph.edges = self.edges;
        graph.metadata.insert("version".into(), json!("0.1.0"));
        graph.metadata.insert("tier".into(), json!(self.tier.level()));
        graph.metadata.insert("mode".into(), json!(self.tier.mode()));
        graph
            .metadata
            .insert("region".into(), json!(self.spec.region));
        if let Ok(spec) = serde_json::to_value(self.spec) {
            graph.metadata.insert("spec".into(), spec);
        }
        info!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "topology graph complete"
        );
        graph
    }

    // ---- resolution helpers ----

    /// Quantity for a role: explicit value from the first component that set
    /// one, else tier-dependent defaults.
    fn quantity_for(&self, role: ComponentRole) -> u32 {
        if let Some(q) = self.spec.quantity_for(role).filter(|q| *q > 0) {
            return q;
        }
        match role {
            ComponentRole::WebTier => {
                if self.tier == Tier::Production {
                    2
                } else {
                    1
                }
            }
            _ => 1,
        }
    }

    fn db_engine(&self) -> String {
        self.spec
            .constraints_for(ComponentRole::DbTier)
            .and_then(|c| c.engine.clone())
            .unwrap_or_else(|| DEFAULT_DB_ENGINE.to_string())
    }

    fn instance_type(&self) -> String {
        self.spec
            .constraints_for(ComponentRole::WebTier)
            .and_then(|c| c.instance_type.clone())
            .unwrap_or_else(|| DEFAULT_INSTANCE_TYPE.to_string())
    }

    fn next_subnet_cidr(&mut self) -> String {
        let cidr = format!("10.0.{}.0/24", self.subnet_counter);
        self.subnet_counter += 1;
        cidr
    }

    fn next_edge_id(&mut self) -> String {
        self.edge_counter += 1;
        format!("e{}", self.edge_counter)
    }

    fn azs(&self, count: usize) -> Vec<String> {
        AZ_SUFFIXES
            .iter()
            .take(count)
            .map(|suffix| format!("{}{}", self.spec.region, suffix))
            .collect()
    }

    fn add_node(&mut self, node: Node) {
        debug!(id = %node.id, kind = %node.kind(), "add node");
        self.nodes.push(node);
    }

    fn add_edge(&mut self, kind: EdgeKind, from: &str, to: &str, props: Option<EdgeProps>) {
        let edge = Edge {
            id: self.next_edge_id(),
            kind,
            from_node: from.to_string(),
            to_node: to.to_string(),
            props,
        };
        self.edges.push(edge);
    }

    fn base_node(&self, id: &str, name: &str, props: NodeProps) -> Node {
        Node::new(id, props)
            .with_name(name)
            .with_provider(Provider::Aws)
            .with_region(&self.spec.region)
            .with_tag("Name", format!("netforge-{name}"))
            .with_tag(MANAGED_BY_TAG.0, MANAGED_BY_TAG.1)
    }

    /// Security-group props with the allow-all egress default applied when
    /// the caller specifies no egress rules.
    fn security_group_props(
        description: &str,
        ingress: Vec<SgRule>,
        egress: Vec<SgRule>,
    ) -> SecurityGroupProps {
        let egress = if egress.is_empty() {
            vec![SgRule::allow_all_egress()]
        } else {
            egress
        };
        SecurityGroupProps {
            description: description.to_string(),
            ingress,
            egress,
            extra: Default::default(),
        }
    }

    // ---- shared resources ----

    fn create_vpc(&mut self) {
        let vpc_id = "vpc-main".to_string();
        let node = self.base_node(
            &vpc_id,
            "main-vpc",
            NodeProps::Network(NetworkProps {
                cidr_block: VPC_CIDR.to_string(),
                enable_dns_hostnames: true,
                enable_dns_support: true,
                extra: Default::default(),
            }),
        );
        self.add_node(node);
        self.vpc_id = Some(vpc_id);
    }

    fn create_internet_gateway(&mut self) {
        let igw_id = "igw-main".to_string();
        let node = self.base_node(
            &igw_id,
            "main-igw",
            NodeProps::Gateway(GatewayProps {
                gateway_type: GatewayKind::Internet,
                subnet_id: None,
                extra: Default::default(),
            }),
        );
        self.add_node(node);
        let vpc_id = self.vpc_id.clone().unwrap_or_default();
        self.add_edge(EdgeKind::AttachedTo, &igw_id, &vpc_id, None);
        self.igw_id = Some(igw_id);
    }

    // ---- minimal tier ----

    fn create_single_public_subnet(&mut self) {
        let subnet_id = "subnet-public".to_string();
        let az = self.azs(1).remove(0);
        let cidr = self.next_subnet_cidr();
        let node = self
            .base_node(
                &subnet_id,
                "public-subnet",
                NodeProps::Subnet(SubnetProps {
                    cidr_block: cidr,
                    is_public: true,
                    map_public_ip_on_launch: true,
                    extra: Default::default(),
                }),
            )
            .with_az(az);
        self.add_node(node);
        let vpc_id = self.vpc_id.clone().unwrap_or_default();
        self.add_edge(EdgeKind::AttachedTo, &subnet_id, &vpc_id, None);
        self.public_subnet_ids.push(subnet_id);
    }

    fn create_simple_route_table(&mut self) {
        let Some(igw_id) = self.igw_id.clone() else {
            return;
        };
        let rt_id = "rt-main".to_string();
        let node = self.base_node(
            &rt_id,
            "main-rt",
            NodeProps::RouteTable(RouteTableProps {
                routes: vec![Route {
                    destination: OPEN_CIDR.to_string(),
                    target: igw_id.clone(),
                }],
                extra: Default::default(),
            }),
        );
        self.add_node(node);
        let vpc_id = self.vpc_id.clone().unwrap_or_default();
        self.add_edge(EdgeKind::AttachedTo, &rt_id, &vpc_id, None);
        self.add_edge(EdgeKind::RoutesTo, &rt_id, &igw_id, None);
    }

    fn create_minimal_web_security_group(&mut self) {
        let sg_id = "sg-web".to_string();
        let open = |port| SgRule::tcp_from_cidrs(port, vec![OPEN_CIDR.to_string()]);
        let node = self.base_node(
            &sg_id,
            "web-sg",
            NodeProps::SecurityGroup(Self::security_group_props(
                "Security group for web access",
                vec![open(80), open(443), open(22)],
                Vec::new(),
            )),
        );
        self.add_node(node);
        let vpc_id = self.vpc_id.clone().unwrap_or_default();
        self.add_edge(EdgeKind::AttachedTo, &sg_id, &vpc_id, None);
        self.web_sg_id = Some(sg_id);
    }

    fn create_minimal_instances(&mut self, quantity: u32) {
        let instance_type = self.instance_type();
        let subnet_id = match self.public_subnet_ids.first() {
            Some(id) => id.clone(),
            None => return,
        };
        let az = self.azs(1).remove(0);
        let security_groups: Vec<String> = self.web_sg_id.iter().cloned().collect();

        for i in 0..quantity {
            let (ec2_id, ec2_name) = if quantity > 1 {
                (format!("ec2-{}", i + 1), format!("instance-{}", i + 1))
            } else {
                ("ec2-instance".to_string(), "test-instance".to_string())
            };
            let node = self
                .base_node(
                    &ec2_id,
                    &ec2_name,
                    NodeProps::ComputeInstance(ComputeProps {
                        instance_type: instance_type.clone(),
                        subnet_id: subnet_id.clone(),
                        security_groups: security_groups.clone(),
                        associate_public_ip: true,
                        extra: Default::default(),
                    }),
                )
                .with_az(az.clone());
            self.add_node(node);
            self.add_edge(EdgeKind::AttachedTo, &ec2_id, &subnet_id, None);
            if let Some(sg_id) = self.web_sg_id.clone() {
                self.add_edge(EdgeKind::ProtectedBy, &ec2_id, &sg_id, None);
            }
        }
    }

    fn create_minimal_database(&mut self) {
        let (Some(db_sg_id), Some(subnet_id)) = (
            self.db_sg_id.clone(),
            self.public_subnet_ids.first().cloned(),
        ) else {
            return;
        };

        let engine = self.db_engine();
        let constraints = self.spec.constraints_for(ComponentRole::DbTier);
        let version = constraints
            .and_then(|c| c.engine_version.clone())
            .unwrap_or_else(|| engine_version(&engine).to_string());
        let instance_class = constraints
            .and_then(|c| c.instance_class.clone())
            .unwrap_or_else(|| DEFAULT_DB_INSTANCE_CLASS.to_string());
        let storage = constraints
            .and_then(|c| c.allocated_storage)
            .unwrap_or(DEFAULT_DB_STORAGE_GB);

        let rds_id = "rds-main".to_string();
        let az = self.azs(1).remove(0);
        let node = self
            .base_node(
                &rds_id,
                "main-db",
                NodeProps::Database(DatabaseProps {
                    engine,
                    engine_version: version,
                    instance_class,
                    allocated_storage: storage,
                    subnet_ids: vec![subnet_id.clone()],
                    security_groups: vec![db_sg_id],
                    multi_az: false,
                    // Lives in the public subnet on this tier, but is never
                    // internet-facing; isolation comes from the group rules.
                    publicly_accessible: false,
                    extra: Default::default(),
                }),
            )
            .with_az(az)
            .with_tag("Tier", "1");
        self.add_node(node);
        self.add_edge(EdgeKind::AttachedTo, &rds_id, &subnet_id, None);
    }

    // ---- production tier ----

    fn create_public_subnets(&mut self, num_azs: usize) {
        for (i, az) in self.azs(num_azs).into_iter().enumerate() {
            let subnet_id = format!("subnet-public-{}", i + 1);
            let cidr = self.next_subnet_cidr();
            let node = self
                .base_node(
                    &subnet_id,
                    &format!("public-subnet-{}", i + 1),
                    NodeProps::Subnet(SubnetProps {
                        cidr_block: cidr,
                        is_public: true,
                        map_public_ip_on_launch: true,
                        extra: Default::default(),
                    }),
                )
                .with_az(az)
                .with_tag("Tier", "public");
            self.add_node(node);
            let vpc_id = self.vpc_id.clone().unwrap_or_default();
            self.add_edge(EdgeKind::AttachedTo, &subnet_id, &vpc_id, None);
            self.public_subnet_ids.push(subnet_id);
        }
    }

    fn create_private_subnets(&mut self, num_azs: usize, tier_name: &str) {
        for (i, az) in self.azs(num_azs).into_iter().enumerate() {
            let subnet_id = format!("subnet-{}-{}", tier_name, i + 1);
            let cidr = self.next_subnet_cidr();
            let node = self
                .base_node(
                    &subnet_id,
                    &format!("{}-subnet-{}", tier_name, i + 1),
                    NodeProps::Subnet(SubnetProps {
                        cidr_block: cidr,
                        is_public: false,
                        map_public_ip_on_launch: false,
                        extra: Default::default(),
                    }),
                )
                .with_az(az)
                .with_tag("Tier", tier_name);
            self.add_node(node);
            let vpc_id = self.vpc_id.clone().unwrap_or_default();
            self.add_edge(EdgeKind::AttachedTo, &subnet_id, &vpc_id, None);
            self.private_subnet_ids.push(subnet_id);
        }
    }

    fn create_nat_gateway(&mut self) {
        let Some(subnet_id) = self.public_subnet_ids.first().cloned() else {
            return;
        };
        let nat_az = self
            .nodes
            .iter()
            .find(|n| n.id == subnet_id)
            .and_then(|n| n.az.clone());

        let nat_id = "nat-main".to_string();
        let mut node = self.base_node(
            &nat_id,
            "nat-gateway",
            NodeProps::Gateway(GatewayProps {
                gateway_type: GatewayKind::Nat,
                subnet_id: Some(subnet_id.clone()),
                extra: Default::default(),
            }),
        );
        node.az = nat_az;
        self.add_node(node);
        self.add_edge(EdgeKind::AttachedTo, &nat_id, &subnet_id, None);
        self.nat_id = Some(nat_id);
    }

    fn create_route_tables(&mut self) {
        let Some(igw_id) = self.igw_id.clone() else {
            return;
        };
        let vpc_id = self.vpc_id.clone().unwrap_or_default();

        let rt_public_id = "rt-public".to_string();
        let node = self.base_node(
            &rt_public_id,
            "public-rt",
            NodeProps::RouteTable(RouteTableProps {
                routes: vec![Route {
                    destination: OPEN_CIDR.to_string(),
                    target: igw_id.clone(),
                }],
                extra: Default::default(),
            }),
        );
        self.add_node(node);
        self.add_edge(EdgeKind::AttachedTo, &rt_public_id, &vpc_id, None);
        self.add_edge(EdgeKind::RoutesTo, &rt_public_id, &igw_id, None);

        if let Some(nat_id) = self.nat_id.clone() {
            let rt_private_id = "rt-private".to_string();
            let node = self.base_node(
                &rt_private_id,
                "private-rt",
                NodeProps::RouteTable(RouteTableProps {
                    routes: vec![Route {
                        destination: OPEN_CIDR.to_string(),
                        target: nat_id.clone(),
                    }],
                    extra: Default::default(),
                }),
            );
            self.add_node(node);
            self.add_edge(EdgeKind::AttachedTo, &rt_private_id, &vpc_id, None);
            self.add_edge(EdgeKind::RoutesTo, &rt_private_id, &nat_id, None);
        }
    }

    fn create_alb_security_group(&mut self) {
        let sg_id = "sg-alb".to_string();
        let open = |port| SgRule::tcp_from_cidrs(port, vec![OPEN_CIDR.to_string()]);
        let node = self.base_node(
            &sg_id,
            "alb-sg",
            NodeProps::SecurityGroup(Self::security_group_props(
                "Security group for Application Load Balancer",
                vec![open(80), open(443)],
                Vec::new(),
            )),
        );
        self.add_node(node);
        let vpc_id = self.vpc_id.clone().unwrap_or_default();
        self.add_edge(EdgeKind::AttachedTo, &sg_id, &vpc_id, None);
        self.alb_sg_id = Some(sg_id);
    }

    fn create_web_security_group(&mut self) {
        let sg_id = "sg-web".to_string();
        let alb_sg_id = self.alb_sg_id.clone().unwrap_or_default();
        let ingress = vec![
            SgRule::tcp_from_group(80, &alb_sg_id),
            SgRule::tcp_from_group(443, &alb_sg_id),
            // SSH reachable from inside the VPC only.
            SgRule::tcp_from_cidrs(22, vec![VPC_CIDR.to_string()]),
        ];
        let node = self.base_node(
            &sg_id,
            "web-sg",
            NodeProps::SecurityGroup(Self::security_group_props(
                "Security group for web tier",
                ingress,
                Vec::new(),
            )),
        );
        self.add_node(node);
        let vpc_id = self.vpc_id.clone().unwrap_or_default();
        self.add_edge(EdgeKind::AttachedTo, &sg_id, &vpc_id, None);
        self.add_edge(
            EdgeKind::AllowedTraffic,
            &alb_sg_id,
            &sg_id,
            Some(EdgeProps {
                ports: vec![80, 443],
                extra: Default::default(),
            }),
        );
        self.web_sg_id = Some(sg_id);
    }

    /// Database security group. Ingress comes from the web group when one
    /// exists; on the minimal tier, with no web group, it falls back to the
    /// VPC CIDR so the database stays reachable from inside the network.
    fn create_db_security_group(&mut self, vpc_cidr_fallback: bool) {
        let sg_id = "sg-db".to_string();
        let db_port = engine_port(&self.db_engine());

        let mut ingress = Vec::new();
        if let Some(web_sg_id) = self.web_sg_id.clone() {
            ingress.push(SgRule::tcp_from_group(db_port, &web_sg_id));
        } else if vpc_cidr_fallback {
            ingress.push(SgRule::tcp_from_cidrs(db_port, vec![VPC_CIDR.to_string()]));
        }

        let node = self.base_node(
            &sg_id,
            "db-sg",
            NodeProps::SecurityGroup(Self::security_group_props(
                "Security group for database",
                ingress,
                Vec::new(),
            )),
        );
        self.add_node(node);
        let vpc_id = self.vpc_id.clone().unwrap_or_default();
        self.add_edge(EdgeKind::AttachedTo, &sg_id, &vpc_id, None);

        if let Some(web_sg_id) = self.web_sg_id.clone() {
            self.add_edge(
                EdgeKind::AllowedTraffic,
                &web_sg_id,
                &sg_id,
                Some(EdgeProps {
                    ports: vec![db_port],
                    extra: Default::default(),
                }),
            );
        }
        self.db_sg_id = Some(sg_id);
    }

    fn create_load_balancer(&mut self) {
        let Some(alb_sg_id) = self.alb_sg_id.clone() else {
            return;
        };
        if self.public_subnet_ids.is_empty() {
            return;
        }
        let alb_id = "alb-web".to_string();
        let node = self.base_node(
            &alb_id,
            "web-alb",
            NodeProps::LoadBalancer(LoadBalancerProps {
                lb_type: "application".to_string(),
                scheme: "internet-facing".to_string(),
                subnets: self.public_subnet_ids.clone(),
                security_groups: vec![alb_sg_id],
                extra: Default::default(),
            }),
        );
        self.add_node(node);
        for subnet_id in self.public_subnet_ids.clone() {
            self.add_edge(EdgeKind::AttachedTo, &alb_id, &subnet_id, None);
        }
    }

    fn create_web_instances(&mut self, quantity: u32) {
        let Some(web_sg_id) = self.web_sg_id.clone() else {
            return;
        };
        if self.private_subnet_ids.is_empty() {
            return;
        }
        let instance_type = self.instance_type();

        // Distribute instances round-robin across the web subnets.
        let mut web_subnets: Vec<String> = self
            .private_subnet_ids
            .iter()
            .filter(|s| s.contains("web"))
            .cloned()
            .collect();
        if web_subnets.is_empty() {
            web_subnets = self.private_subnet_ids.iter().take(2).cloned().collect();
        }

        for i in 0..quantity {
            let subnet_id = web_subnets[i as usize % web_subnets.len()].clone();
            let az = self
                .nodes
                .iter()
                .find(|n| n.id == subnet_id)
                .and_then(|n| n.az.clone())
                .unwrap_or_else(|| format!("{}a", self.spec.region));

            let ec2_id = format!("ec2-web-{}", i + 1);
            let node = self
                .base_node(
                    &ec2_id,
                    &format!("web-server-{}", i + 1),
                    NodeProps::ComputeInstance(ComputeProps {
                        instance_type: instance_type.clone(),
                        subnet_id: subnet_id.clone(),
                        security_groups: vec![web_sg_id.clone()],
                        associate_public_ip: false,
                        extra: Default::default(),
                    }),
                )
                .with_az(az)
                .with_tag("Role", "web");
            self.add_node(node);
            self.add_edge(EdgeKind::AttachedTo, &ec2_id, &subnet_id, None);
        }
    }

    fn create_database_instances(&mut self, quantity: u32) {
        let Some(db_sg_id) = self.db_sg_id.clone() else {
            return;
        };

        let engine = self.db_engine();
        let constraints = self.spec.constraints_for(ComponentRole::DbTier);
        let version = constraints
            .and_then(|c| c.engine_version.clone())
            .unwrap_or_else(|| engine_version(&engine).to_string());
        let instance_class = constraints
            .and_then(|c| c.instance_class.clone())
            .unwrap_or_else(|| DEFAULT_DB_INSTANCE_CLASS.to_string());
        let storage = constraints
            .and_then(|c| c.allocated_storage)
            .unwrap_or(DEFAULT_DB_STORAGE_GB);

        let mut db_subnets: Vec<String> = self
            .private_subnet_ids
            .iter()
            .filter(|s| s.contains("db"))
            .cloned()
            .collect();
        if db_subnets.is_empty() {
            db_subnets = if self.private_subnet_ids.len() >= 2 {
                self.private_subnet_ids[self.private_subnet_ids.len() - 2..].to_vec()
            } else {
                self.private_subnet_ids.clone()
            };
        }

        for i in 0..quantity {
            let subnet_id = (!db_subnets.is_empty())
                .then(|| db_subnets[i as usize % db_subnets.len()].clone());
            let az = subnet_id
                .as_ref()
                .and_then(|id| self.nodes.iter().find(|n| &n.id == id))
                .and_then(|n| n.az.clone())
                .unwrap_or_else(|| format!("{}a", self.spec.region));

            let rds_id = format!("rds-{}", i + 1);
            let rds_name = if quantity > 1 {
                format!("main-db-{}", i + 1)
            } else {
                "main-db".to_string()
            };
            let node = self
                .base_node(
                    &rds_id,
                    &rds_name,
                    NodeProps::Database(DatabaseProps {
                        engine: engine.clone(),
                        engine_version: version.clone(),
                        instance_class: instance_class.clone(),
                        allocated_storage: storage,
                        subnet_ids: db_subnets.clone(),
                        security_groups: vec![db_sg_id.clone()],
                        multi_az: false,
                        publicly_accessible: false,
                        extra: Default::default(),
                    }),
                )
                .with_az(az);
            self.add_node(node);
            if let Some(subnet_id) = subnet_id {
                self.add_edge(EdgeKind::AttachedTo, &rds_id, &subnet_id, None);
            }
        }
    }
}
