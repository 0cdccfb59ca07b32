//! JSON Schema nodes as they appear in the document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extensions::{Extensions, SchemaSummary};

/// Prefix of references to named definitions.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// A named or inline schema.
///
/// Only the facets the pipeline reads are modelled; constraints such as
/// `minimum` or `pattern` ride along in [`Extensions::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Reference to a named definition.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,

    /// Title; generators use the source type name here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON-schema `type` (a string, or an array of strings).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<Value>,

    /// Format hint (e.g., date-time, uri).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Properties for object types.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    /// Required property names for object types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Item schema for array types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Enum values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Vendor extensions and every other schema keyword.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Schema {
    /// A schema holding nothing but a reference to the definition `name`.
    pub fn reference(name: &str) -> Self {
        Schema {
            ref_path: Some(format!("{SCHEMA_REF_PREFIX}{name}")),
            ..Schema::default()
        }
    }

    /// A schema with a single scalar `type`.
    pub fn scalar(schema_type: &str) -> Self {
        Schema {
            schema_type: Some(Value::String(schema_type.to_string())),
            ..Schema::default()
        }
    }

    /// Name of the referenced definition, if this node is a local reference.
    pub fn referenced_name(&self) -> Option<&str> {
        self.ref_path
            .as_deref()
            .and_then(|path| path.strip_prefix(SCHEMA_REF_PREFIX))
    }

    /// True when the node carries a reference and nothing else.
    pub fn is_reference_only(&self) -> bool {
        self.ref_path.is_some() && *self == Schema::reference_from(self.ref_path.as_deref())
    }

    fn reference_from(ref_path: Option<&str>) -> Self {
        Schema {
            ref_path: ref_path.map(str::to_string),
            ..Schema::default()
        }
    }

    /// Replace this node with a bare reference to `name`.
    ///
    /// Every inline facet is dropped so the named definition stays the
    /// single source of truth.
    pub fn make_reference_to(&mut self, name: &str) {
        *self = Schema::reference(name);
    }

    /// Reduce to type and reference.
    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            schema_type: self.schema_type.clone(),
            ref_path: self.ref_path.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_round_trip_keeps_constraints() {
        let json = r#"{"type":"object","properties":{"count":{"type":"integer","minimum":0}},"required":["count"],"additionalProperties":false}"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.properties["count"].extensions.extra()["minimum"], 0);
        assert_eq!(serde_json::to_string(&schema).unwrap(), json);
    }

    #[test]
    fn test_make_reference_clears_inline_facets() {
        let mut schema: Schema = serde_json::from_str(
            r#"{"type":"object","description":"Account","properties":{"id":{"type":"string"}},"x-ms-summary":"Acct"}"#,
        )
        .unwrap();
        schema.make_reference_to("Account");
        assert!(schema.is_reference_only());
        assert_eq!(schema.referenced_name(), Some("Account"));
        assert_eq!(
            serde_json::to_string(&schema).unwrap(),
            r##"{"$ref":"#/components/schemas/Account"}"##
        );
    }

    #[test]
    fn test_reference_with_siblings_is_not_reference_only() {
        let mut schema = Schema::reference("Account");
        schema.description = Some("An account".to_string());
        assert!(!schema.is_reference_only());
        assert!(!Schema::scalar("string").is_reference_only());
    }
}
