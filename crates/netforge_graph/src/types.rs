//! Core data structures for the topology graph intermediate representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
    Generic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
            Provider::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of infrastructure resource a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// VPC / VNet / VPC Network.
    Network,
    Subnet,
    SecurityGroup,
    LoadBalancer,
    ComputeInstance,
    Database,
    /// IGW or NAT, discriminated by [`GatewayKind`].
    Gateway,
    TrafficGenerator,
    RouteTable,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Network => "network",
            NodeKind::Subnet => "subnet",
            NodeKind::SecurityGroup => "security_group",
            NodeKind::LoadBalancer => "load_balancer",
            NodeKind::ComputeInstance => "compute_instance",
            NodeKind::Database => "database",
            NodeKind::Gateway => "gateway",
            NodeKind::TrafficGenerator => "traffic_generator",
            NodeKind::RouteTable => "route_table",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed relationship between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// subnet -> network, gateway -> network, instance -> subnet, ...
    AttachedTo,
    /// route_table -> gateway/subnet.
    RoutesTo,
    /// security_group -> security_group.
    AllowedTraffic,
    /// compute/database -> security_group.
    ProtectedBy,
    DependsOn,
    Contains,
}

/// Discriminates the two gateway flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    Internet,
    Nat,
}

/// A single route table entry. `target` names a gateway node by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub destination: String,
    pub target: String,
}

/// Source scope of a security-group rule: literal address ranges or a single
/// source security group, never a mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSource {
    Cidrs { cidr_blocks: Vec<String> },
    Group { source_security_group: String },
}

/// An ingress or egress rule on a security group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgRule {
    pub from_port: u16,
    pub to_port: u16,
    pub protocol: String,
    #[serde(flatten)]
    pub source: RuleSource,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl SgRule {
    /// TCP rule on a single port, open to the given CIDR blocks.
    pub fn tcp_from_cidrs(port: u16, cidr_blocks: Vec<String>) -> Self {
        Self {
            from_port: port,
            to_port: port,
            protocol: "tcp".to_string(),
            source: RuleSource::Cidrs { cidr_blocks },
            description: None,
        }
    }

    /// TCP rule on a single port, sourced from another security group.
    pub fn tcp_from_group(port: u16, group_id: impl Into<String>) -> Self {
        Self {
            from_port: port,
            to_port: port,
            protocol: "tcp".to_string(),
            source: RuleSource::Group {
                source_security_group: group_id.into(),
            },
            description: None,
        }
    }

    /// The all-ports, all-protocols, all-destinations egress rule.
    pub fn allow_all_egress() -> Self {
        Self {
            from_port: 0,
            to_port: 0,
            protocol: "-1".to_string(),
            source: RuleSource::Cidrs {
                cidr_blocks: vec!["0.0.0.0/0".to_string()],
            },
            description: None,
        }
    }
}

/// Kind-specific attributes for a network node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkProps {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind-specific attributes for a subnet node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetProps {
    pub cidr_block: String,
    pub is_public: bool,
    pub map_public_ip_on_launch: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind-specific attributes for a security group node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroupProps {
    pub description: String,
    pub ingress: Vec<SgRule>,
    pub egress: Vec<SgRule>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind-specific attributes for a load balancer node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerProps {
    pub lb_type: String,
    pub scheme: String,
    /// Subnet node ids the balancer spans.
    pub subnets: Vec<String>,
    /// Security group node ids.
    pub security_groups: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind-specific attributes for a compute instance node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeProps {
    pub instance_type: String,
    /// Subnet node id the instance is placed in.
    pub subnet_id: String,
    /// Security group node ids.
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub associate_public_ip: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind-specific attributes for a managed database node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseProps {
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub allocated_storage: u32,
    /// Subnet node ids for the subnet group.
    pub subnet_ids: Vec<String>,
    /// Security group node ids.
    pub security_groups: Vec<String>,
    pub multi_az: bool,
    pub publicly_accessible: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind-specific attributes for a gateway node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayProps {
    pub gateway_type: GatewayKind,
    /// NAT gateways record the subnet they live in.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subnet_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind-specific attributes for a route table node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTableProps {
    pub routes: Vec<Route>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind-specific attributes for a traffic generator node. Accepted by the
/// IR but never lowered to configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficGeneratorProps {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The per-kind attribute payload of a node. Serialized adjacently so the
/// wire form reads `{"kind": "subnet", "props": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "props", rename_all = "snake_case")]
pub enum NodeProps {
    Network(NetworkProps),
    Subnet(SubnetProps),
    SecurityGroup(SecurityGroupProps),
    LoadBalancer(LoadBalancerProps),
    ComputeInstance(ComputeProps),
    Database(DatabaseProps),
    Gateway(GatewayProps),
    TrafficGenerator(TrafficGeneratorProps),
    RouteTable(RouteTableProps),
}

impl NodeProps {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeProps::Network(_) => NodeKind::Network,
            NodeProps::Subnet(_) => NodeKind::Subnet,
            NodeProps::SecurityGroup(_) => NodeKind::SecurityGroup,
            NodeProps::LoadBalancer(_) => NodeKind::LoadBalancer,
            NodeProps::ComputeInstance(_) => NodeKind::ComputeInstance,
            NodeProps::Database(_) => NodeKind::Database,
            NodeProps::Gateway(_) => NodeKind::Gateway,
            NodeProps::TrafficGenerator(_) => NodeKind::TrafficGenerator,
            NodeProps::RouteTable(_) => NodeKind::RouteTable,
        }
    }
}

/// A node in the topology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub provider: Option<Provider>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub az: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub tags: BTreeMap<String, String>,
    #[serde(flatten)]
    pub props: NodeProps,
}

impl Node {
    /// Create a node with the given id and props; remaining fields via `with_*`.
    pub fn new(id: impl Into<String>, props: NodeProps) -> Self {
        Self {
            id: id.into(),
            name: None,
            provider: None,
            region: None,
            az: None,
            tags: BTreeMap::new(),
            props,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_az(mut self, az: impl Into<String>) -> Self {
        self.az = Some(az.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.props.kind()
    }

    /// Human-facing name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Optional payload on an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeProps {
    /// Ports permitted by an `allowed_traffic` edge.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ports: Vec<u16>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An edge connecting two nodes in the topology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub kind: EdgeKind,
    #[serde(rename = "from")]
    pub from_node: String,
    #[serde(rename = "to")]
    pub to_node: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub props: Option<EdgeProps>,
}

/// The complete topology graph with nodes and edges. Node insertion order is
/// significant: it drives deterministic configuration output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All nodes of the given kind, in insertion order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    /// The first network (VPC) node, if any.
    pub fn network(&self) -> Option<&Node> {
        self.nodes_of_kind(NodeKind::Network).next()
    }

    /// The internet gateway node, if any.
    pub fn internet_gateway(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| {
            matches!(
                &n.props,
                NodeProps::Gateway(g) if g.gateway_type == GatewayKind::Internet
            )
        })
    }

    /// Ids this node is attached to via `attached_to` edges.
    pub fn attached_targets(&self, from_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::AttachedTo && e.from_node == from_id)
            .map(|e| e.to_node.as_str())
            .collect()
    }

    /// The region recorded on the first node that carries one.
    pub fn region(&self) -> Option<&str> {
        self.nodes.iter().find_map(|n| n.region.as_deref())
    }
}
