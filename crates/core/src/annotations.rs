//! Declared annotation records.
//!
//! The host materialises what its source declares about operations,
//! parameters and data types into an [`AnnotationIndex`] once, before the
//! pipeline runs. The pipeline never inspects anything else.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::spec::HttpMethod;

/// Names of data types whose schema is a bare JSON primitive.
const TRIVIAL_TYPES: &[&str] = &[
    "any", "array", "boolean", "integer", "number", "object", "string",
];

/// Progressive-disclosure tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    /// No explicit tier.
    #[default]
    Default,
    /// Emphasised in the designer.
    Important,
    /// Hidden behind "advanced options".
    Advanced,
    /// Never shown to the user.
    Internal,
}

impl Visibility {
    /// Value written to `x-ms-visibility`; `None` for the default tier,
    /// which is expressed by the absence of the field.
    pub fn as_extension(self) -> Option<&'static str> {
        match self {
            Visibility::Default => None,
            Visibility::Important => Some("important"),
            Visibility::Advanced => Some("advanced"),
            Visibility::Internal => Some("internal"),
        }
    }
}

/// Friendly name, description and visibility of an operation, parameter,
/// property or type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataAnnotation {
    /// Label shown in the designer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Visibility tier.
    #[serde(default)]
    pub visibility: Visibility,
}

impl MetadataAnnotation {
    /// Friendly name, ignoring blank values.
    pub fn friendly_name(&self) -> Option<&str> {
        non_blank(self.friendly_name.as_deref())
    }

    /// Description, ignoring blank values.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// How a trigger operation delivers data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum TriggerPattern {
    /// Polled; each poll yields one item.
    PollingSingle,
    /// Polled; each poll yields a batch.
    PollingBatched,
    /// Pushed to a registered callback.
    Subscription,
}

impl TriggerPattern {
    /// Value written to `x-ms-trigger`.
    pub fn batch_mode(self) -> &'static str {
        match self {
            TriggerPattern::PollingBatched => "batch",
            TriggerPattern::PollingSingle | TriggerPattern::Subscription => "single",
        }
    }
}

/// Name of a data type; it doubles as the definition name in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    /// Wrap a type name.
    pub fn new(name: impl Into<String>) -> Self {
        TypeRef(name.into())
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// True for JSON primitives and blank names, which never become
    /// named definitions.
    pub fn is_trivial(&self) -> bool {
        let name = self.0.trim();
        name.is_empty() || TRIVIAL_TYPES.contains(&name)
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marks an operation as a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAnnotation {
    /// Delivery pattern.
    pub pattern: TriggerPattern,
    /// Type of the delivered data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<TypeRef>,
    /// Friendly description of the delivered data.
    pub data_friendly_name: String,
}

/// Declares that choices for a parameter or property come from another operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynamicValueLookup {
    /// Action name of the lookup operation.
    pub lookup_operation: String,
    /// Parameter spec: a JSON object or `k1=v1&k2=v2`.
    #[serde(default)]
    pub parameters: String,
    /// Path to the collection of values in the lookup response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_collection: Option<String>,
    /// Path to each value.
    pub value_path: String,
    /// Path to each value's display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_title: Option<String>,
}

/// Declares that a type's shape comes from another operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSchemaLookup {
    /// Action name of the lookup operation.
    pub lookup_operation: String,
    /// Parameter spec: a JSON object or `k1=v1&k2=v2`.
    #[serde(default)]
    pub parameters: String,
    /// Path to the schema in the lookup response.
    pub value_path: String,
}

/// Annotations declared on one operation parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterAnnotations {
    /// Parameter name as it appears in the document.
    pub name: String,
    /// Friendly name, description and visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataAnnotation>,
    /// Edit-time value lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_values: Option<DynamicValueLookup>,
}

/// Annotations declared on one operation, keyed by its path and verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationAnnotations {
    /// Route template of the operation.
    pub path: String,
    /// HTTP verb of the operation.
    pub method: HttpMethod,
    /// Action (handler) name in the host's source.
    pub action: String,
    /// Every declared parameter of the action, in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterAnnotations>,
    /// Friendly name, description and visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataAnnotation>,
    /// Trigger semantics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerAnnotation>,
}

impl OperationAnnotations {
    /// Declared parameter names, sorted.
    pub fn sorted_parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Annotations declared on one property of a type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAnnotations {
    /// Friendly name, description and visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataAnnotation>,
    /// Edit-time value lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_values: Option<DynamicValueLookup>,
    /// The property receives the subscription callback URL.
    #[serde(default)]
    pub callback_url: bool,
}

/// Annotations declared on a data type and its properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnnotations {
    /// Friendly name, description and visibility of the type itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataAnnotation>,
    /// Edit-time schema lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_schema: Option<DynamicSchemaLookup>,
    /// Per-property annotations keyed by serialized property name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, PropertyAnnotations>,
}

/// Every annotation record of one API, built once by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationIndex {
    /// Operation records.
    #[serde(default)]
    pub operations: Vec<OperationAnnotations>,
    /// Type records keyed by type name.
    #[serde(default)]
    pub types: IndexMap<String, TypeAnnotations>,
}

impl AnnotationIndex {
    /// Parse an index from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// JSON Schema describing the index file format.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(AnnotationIndex)
    }

    /// Record declared for the operation at `path` and `method`.
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&OperationAnnotations> {
        self.operations
            .iter()
            .find(|op| op.method == method && op.path == path)
    }

    /// Record declared for a type.
    pub fn type_annotations(&self, name: &str) -> Option<(TypeRef, &TypeAnnotations)> {
        self.types
            .get_key_value(name)
            .map(|(key, annotations)| (TypeRef::new(key.as_str()), annotations))
    }
}
