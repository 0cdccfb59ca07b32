//! OpenAPI document structs for serde (de)serialization.
//!
//! This module defines the subset of the OpenAPI 3 document the pipeline
//! reads and writes. Maps keep document order, and fields the pipeline does
//! not interpret are carried through untouched.

mod extensions;
mod schema;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub use extensions::{
    DynamicSchema, DynamicValues, ExtensionKey, ExtensionValue, Extensions, NotificationContent,
    SchemaSummary,
};
pub use schema::{SCHEMA_REF_PREFIX, Schema};

use crate::error::Result;

/// Root OpenAPI document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// OpenAPI version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,
    /// API metadata, carried verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    /// API paths and their operations.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components (named schemas).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Top-level vendor extensions and other fields.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Document {
    /// Parse a document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Iterate every operation together with its path and verb.
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations
                .iter()
                .map(move |(method, op)| (path.as_str(), *method, op))
        })
    }
}

/// Components section containing reusable schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Named schema definitions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
    /// Other component kinds, carried verbatim.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// HTTP verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Lowercase field name used for the verb inside a path item.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    /// Parse a path-item field name.
    pub fn from_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// A path item: operations keyed by verb plus path-level fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathItem {
    /// Operations in document order.
    pub operations: IndexMap<HttpMethod, Operation>,
    /// Path-level vendor extensions and other fields (`parameters`, `summary`, ...).
    pub extensions: Extensions,
}

impl Serialize for PathItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (method, operation) in &self.operations {
            map.serialize_entry(method.as_str(), operation)?;
        }
        self.extensions.serialize_fields(&mut map)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for PathItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut operations = IndexMap::new();
        let mut rest = IndexMap::new();
        for (name, value) in fields {
            match HttpMethod::from_field(&name) {
                Some(method) => {
                    let operation: Operation = serde_json::from_value(value)
                        .map_err(|err| D::Error::custom(format!("invalid {name} operation: {err}")))?;
                    operations.insert(method, operation);
                }
                None => {
                    rest.insert(name, value);
                }
            }
        }
        let extensions = Extensions::from_fields(rest).map_err(D::Error::custom)?;
        Ok(PathItem {
            operations,
            extensions,
        })
    }
}

/// An API operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Stable identifier used to reference the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Short label shown by the designer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code string (or `default`).
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    /// Vendor extensions and other fields.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Operation {
    /// Find an inline parameter by name; references never match.
    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.parameters
            .iter_mut()
            .find(|param| param.name.as_deref() == Some(name))
    }
}

/// A parameter (query, path, header or cookie), or a reference to one
/// under `components.parameters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Reference to a shared parameter; a reference carries no name.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,
    /// Parameter name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Location (`query`, `path`, ...).
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Parameter schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Vendor extensions and other fields.
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parameter {
    /// Inline parameter called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Parameter {
            name: Some(name.into()),
            ..Parameter::default()
        }
    }

    /// True for a `$ref` to a shared parameter.
    pub fn is_reference(&self) -> bool {
        self.ref_path.is_some()
    }
}

/// A request body definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Payload per media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// Other fields (`required`, ...).
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A response definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Payload per media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// Vendor extensions and other fields.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Payload schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Other fields (`example`, ...).
    #[serde(flatten)]
    pub extensions: Extensions,
}
