//! The generated configuration document.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::GeneratorResult;
use crate::value::TfValue;

/// Attribute map of a single resource block.
pub type AttrMap = BTreeMap<String, TfValue>;

/// Provider requirement inside the `terraform` block.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRequirement {
    pub source: String,
    pub version: String,
}

/// The `terraform` metadata block.
#[derive(Debug, Clone, Serialize)]
pub struct TerraformBlock {
    pub required_providers: BTreeMap<String, ProviderRequirement>,
}

/// A declarative configuration document shaped
/// `resource_type -> resource_name -> attribute_map`, plus provider and
/// version metadata. Serializes to deterministic JSON: maps are ordered and
/// references render as `${type.name.attribute}`.
#[derive(Debug, Clone, Serialize)]
pub struct TerraformDocument {
    pub terraform: TerraformBlock,
    pub provider: BTreeMap<String, AttrMap>,
    pub resource: BTreeMap<String, BTreeMap<String, AttrMap>>,
}

impl TerraformDocument {
    /// Document targeting the AWS provider in the given region.
    pub fn for_aws(region: &str) -> Self {
        let mut required_providers = BTreeMap::new();
        required_providers.insert(
            "aws".to_string(),
            ProviderRequirement {
                source: "hashicorp/aws".to_string(),
                version: "~> 5.0".to_string(),
            },
        );
        let mut aws = AttrMap::new();
        aws.insert("region".to_string(), region.into());
        let mut provider = BTreeMap::new();
        provider.insert("aws".to_string(), aws);
        Self {
            terraform: TerraformBlock { required_providers },
            provider,
            resource: BTreeMap::new(),
        }
    }

    /// Insert a resource block under `resource_type.resource_name`.
    pub fn insert_resource(
        &mut self,
        resource_type: &str,
        resource_name: impl Into<String>,
        attributes: AttrMap,
    ) {
        self.resource
            .entry(resource_type.to_string())
            .or_default()
            .insert(resource_name.into(), attributes);
    }

    /// All blocks of one resource type, if any were emitted.
    pub fn resources_of(&self, resource_type: &str) -> Option<&BTreeMap<String, AttrMap>> {
        self.resource.get(resource_type)
    }

    /// A single resource block.
    pub fn resource(&self, resource_type: &str, resource_name: &str) -> Option<&AttrMap> {
        self.resources_of(resource_type)?.get(resource_name)
    }

    /// Serialized text rendering. Byte-identical across invocations for the
    /// same document.
    pub fn to_json_pretty(&self) -> GeneratorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
