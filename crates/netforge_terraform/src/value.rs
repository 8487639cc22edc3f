//! Terraform attribute values.
//!
//! Attributes that point at another resource are kept as structured
//! references through the whole pipeline and rendered to the
//! `${type.name.attribute}` interpolation form only at serialization time.
//! This models the plan-time/apply-time split of the provisioning tool: the
//! value does not exist until apply, so it must never be pre-resolved.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A deferred-evaluation reference to another resource's attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfRef {
    pub resource_type: String,
    pub resource_name: String,
    pub attribute: String,
}

impl TfRef {
    pub fn new(
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            attribute: attribute.into(),
        }
    }

    /// The textual interpolation form understood by the provisioning tool.
    pub fn render(&self) -> String {
        format!(
            "${{{}.{}.{}}}",
            self.resource_type, self.resource_name, self.attribute
        )
    }
}

/// A Terraform attribute value: a literal, a deferred reference, or a
/// container of either.
#[derive(Debug, Clone, PartialEq)]
pub enum TfValue {
    Literal(Value),
    Reference(TfRef),
    List(Vec<TfValue>),
    Map(BTreeMap<String, TfValue>),
}

impl TfValue {
    pub fn reference(
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        TfValue::Reference(TfRef::new(resource_type, resource_name, attribute))
    }
}

impl From<&str> for TfValue {
    fn from(value: &str) -> Self {
        TfValue::Literal(Value::from(value))
    }
}

impl From<String> for TfValue {
    fn from(value: String) -> Self {
        TfValue::Literal(Value::from(value))
    }
}

impl From<bool> for TfValue {
    fn from(value: bool) -> Self {
        TfValue::Literal(Value::from(value))
    }
}

impl From<u16> for TfValue {
    fn from(value: u16) -> Self {
        TfValue::Literal(Value::from(value))
    }
}

impl From<u32> for TfValue {
    fn from(value: u32) -> Self {
        TfValue::Literal(Value::from(value))
    }
}

impl From<Value> for TfValue {
    fn from(value: Value) -> Self {
        TfValue::Literal(value)
    }
}

impl From<Vec<TfValue>> for TfValue {
    fn from(values: Vec<TfValue>) -> Self {
        TfValue::List(values)
    }
}

impl Serialize for TfValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TfValue::Literal(value) => value.serialize(serializer),
            TfValue::Reference(r) => serializer.serialize_str(&r.render()),
            TfValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TfValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Rewrite a node id into a valid Terraform resource name. The substitution
/// is deterministic and reversible (hyphen to underscore) and must be used
/// for every occurrence of the id, keys and references alike.
pub fn sanitize_name(name: &str) -> String {
    name.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_renders_interpolation_form() {
        let value = TfValue::reference("aws_vpc", "vpc_main", "id");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"${aws_vpc.vpc_main.id}\"");
    }

    #[test]
    fn test_literals_pass_through() {
        let value: TfValue = "10.0.0.0/16".into();
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"10.0.0.0/16\"");
        let value: TfValue = true.into();
        assert_eq!(serde_json::to_string(&value).unwrap(), "true");
    }

    #[test]
    fn test_nested_list_of_references() {
        let value = TfValue::List(vec![
            TfValue::reference("aws_subnet", "subnet_public", "id"),
            TfValue::reference("aws_subnet", "subnet_public_az2", "id"),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            json,
            "[\"${aws_subnet.subnet_public.id}\",\"${aws_subnet.subnet_public_az2.id}\"]"
        );
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("subnet-public-1"), "subnet_public_1");
        assert_eq!(sanitize_name("vpc_main"), "vpc_main");
    }
}
