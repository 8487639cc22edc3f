//! Data models for topology requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SpecResult;

/// Role a requested component plays in the topology. Unknown roles degrade
/// to [`ComponentRole::Other`] instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentRole {
    WebTier,
    DbTier,
    TrafficGen,
    Networking,
    Other,
}

impl ComponentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentRole::WebTier => "web_tier",
            ComponentRole::DbTier => "db_tier",
            ComponentRole::TrafficGen => "traffic_gen",
            ComponentRole::Networking => "networking",
            ComponentRole::Other => "other",
        }
    }

    /// Parse a role name; anything unrecognized is the generic role.
    pub fn from_str(s: &str) -> Self {
        match s {
            "web_tier" => ComponentRole::WebTier,
            "db_tier" => ComponentRole::DbTier,
            "traffic_gen" => ComponentRole::TrafficGen,
            "networking" => ComponentRole::Networking,
            _ => ComponentRole::Other,
        }
    }
}

impl<'de> Deserialize<'de> for ComponentRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ComponentRole::from_str(&raw))
    }
}

impl std::fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-component sizing and engine constraints. Absent values fall back to
/// fixed defaults in the builder; unrecognized keys land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub instance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub engine_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub instance_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub allocated_storage: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Specification for a single component in the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub role: ComponentRole,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quantity: Option<u32>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub constraints: Option<Constraints>,
}

impl ComponentSpec {
    pub fn new(role: ComponentRole, description: impl Into<String>) -> Self {
        Self {
            role,
            quantity: None,
            description: description.into(),
            constraints: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// High-level topology request, produced by an external collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySpec {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

fn default_provider() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for TopologySpec {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            region: default_region(),
            components: Vec::new(),
        }
    }
}

impl TopologySpec {
    /// Parse a spec from its JSON wire form.
    pub fn from_json(input: &str) -> SpecResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Whether any component carries the given role.
    pub fn has_role(&self, role: ComponentRole) -> bool {
        self.components.iter().any(|c| c.role == role)
    }

    /// Explicit quantity from the first component of the role that set one.
    pub fn quantity_for(&self, role: ComponentRole) -> Option<u32> {
        self.components
            .iter()
            .filter(|c| c.role == role)
            .find_map(|c| c.quantity)
    }

    /// Constraints from the first component of the role that carries any.
    pub fn constraints_for(&self, role: ComponentRole) -> Option<&Constraints> {
        self.components
            .iter()
            .filter(|c| c.role == role)
            .find_map(|c| c.constraints.as_ref())
    }
}
