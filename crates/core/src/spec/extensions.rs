//! Reserved `x-ms-*` vendor extensions.
//!
//! Extension fields are parsed into a closed vocabulary ([`ExtensionKey`])
//! with typed values ([`ExtensionValue`]). Anything else found on the same
//! node is kept verbatim so documents round-trip.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::lookup::ParameterMap;

/// Reserved extension names understood by the workflow designer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionKey {
    /// `x-ms-summary`: friendly name of a parameter or property.
    Summary,
    /// `x-ms-visibility`: progressive-disclosure tier.
    Visibility,
    /// `x-ms-trigger`: trigger batch mode.
    Trigger,
    /// `x-ms-dynamic-values`: edit-time value lookup.
    DynamicValues,
    /// `x-ms-dynamic-schema`: edit-time schema lookup.
    DynamicSchema,
    /// `x-ms-notification-content`: subscription payload description.
    NotificationContent,
    /// `x-ms-notification-url`: marks a callback URL property.
    NotificationUrl,
}

impl ExtensionKey {
    /// Every reserved key, in declaration order.
    pub const ALL: [ExtensionKey; 7] = [
        ExtensionKey::Summary,
        ExtensionKey::Visibility,
        ExtensionKey::Trigger,
        ExtensionKey::DynamicValues,
        ExtensionKey::DynamicSchema,
        ExtensionKey::NotificationContent,
        ExtensionKey::NotificationUrl,
    ];

    /// The field name as written in the document.
    pub fn as_str(self) -> &'static str {
        match self {
            ExtensionKey::Summary => "x-ms-summary",
            ExtensionKey::Visibility => "x-ms-visibility",
            ExtensionKey::Trigger => "x-ms-trigger",
            ExtensionKey::DynamicValues => "x-ms-dynamic-values",
            ExtensionKey::DynamicSchema => "x-ms-dynamic-schema",
            ExtensionKey::NotificationContent => "x-ms-notification-content",
            ExtensionKey::NotificationUrl => "x-ms-notification-url",
        }
    }

    /// Map a document field name back to a reserved key.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

/// Value of a reserved extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtensionValue {
    /// Plain string (summary, visibility, trigger mode).
    String(String),
    /// Boolean flag (notification url).
    Bool(bool),
    /// Dynamic value lookup record.
    DynamicValues(DynamicValues),
    /// Dynamic schema lookup record.
    DynamicSchema(DynamicSchema),
    /// Subscription notification payload.
    NotificationContent(NotificationContent),
}

impl ExtensionValue {
    /// Parse a raw JSON value according to the shape `key` requires.
    fn from_json(key: ExtensionKey, value: Value) -> Result<Self, serde_json::Error> {
        match key {
            ExtensionKey::Summary | ExtensionKey::Visibility | ExtensionKey::Trigger => {
                serde_json::from_value(value).map(ExtensionValue::String)
            }
            ExtensionKey::NotificationUrl => match value {
                Value::Bool(flag) => Ok(ExtensionValue::Bool(flag)),
                // Older documents carry the flag as a lowercase string.
                Value::String(text) if text.eq_ignore_ascii_case("true") => {
                    Ok(ExtensionValue::Bool(true))
                }
                Value::String(text) if text.eq_ignore_ascii_case("false") => {
                    Ok(ExtensionValue::Bool(false))
                }
                other => Err(serde_json::Error::custom(format!(
                    "expected boolean for {}, found {other}",
                    key.as_str()
                ))),
            },
            ExtensionKey::DynamicValues => {
                serde_json::from_value(value).map(ExtensionValue::DynamicValues)
            }
            ExtensionKey::DynamicSchema => {
                serde_json::from_value(value).map(ExtensionValue::DynamicSchema)
            }
            ExtensionKey::NotificationContent => {
                serde_json::from_value(value).map(ExtensionValue::NotificationContent)
            }
        }
    }

    /// The string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExtensionValue::String(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for ExtensionValue {
    fn from(value: &str) -> Self {
        ExtensionValue::String(value.to_string())
    }
}

impl From<bool> for ExtensionValue {
    fn from(value: bool) -> Self {
        ExtensionValue::Bool(value)
    }
}

impl From<DynamicValues> for ExtensionValue {
    fn from(value: DynamicValues) -> Self {
        ExtensionValue::DynamicValues(value)
    }
}

impl From<DynamicSchema> for ExtensionValue {
    fn from(value: DynamicSchema) -> Self {
        ExtensionValue::DynamicSchema(value)
    }
}

impl From<NotificationContent> for ExtensionValue {
    fn from(value: NotificationContent) -> Self {
        ExtensionValue::NotificationContent(value)
    }
}

/// `x-ms-dynamic-values` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicValues {
    /// Identifier of the operation to call at edit time.
    pub operation_id: String,
    /// Arguments passed to the lookup operation.
    #[serde(default, skip_serializing_if = "ParameterMap::is_empty")]
    pub parameters: ParameterMap,
    /// Path to the array of values in the lookup response.
    #[serde(
        rename = "value-collection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value_collection: Option<String>,
    /// Path to the value within each collection item.
    #[serde(rename = "value-path")]
    pub value_path: String,
    /// Path to the display title within each collection item.
    #[serde(rename = "value-title", default, skip_serializing_if = "Option::is_none")]
    pub value_title: Option<String>,
}

/// `x-ms-dynamic-schema` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSchema {
    /// Identifier of the operation returning the schema.
    pub operation_id: String,
    /// Arguments passed to the lookup operation.
    #[serde(default, skip_serializing_if = "ParameterMap::is_empty")]
    pub parameters: ParameterMap,
    /// Path to the schema within the lookup response.
    #[serde(rename = "value-path")]
    pub value_path: String,
}

/// `x-ms-notification-content` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    /// Friendly description of the pushed payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Shape of the pushed payload.
    pub schema: SchemaSummary,
}

/// A schema reduced to its type and reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSummary {
    /// JSON-schema `type`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<Value>,
    /// `$ref` to a named definition.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,
}

/// Vendor extensions of one document node, plus every field of that node
/// the pipeline does not model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    entries: IndexMap<ExtensionKey, ExtensionValue>,
    extra: IndexMap<String, Value>,
}

impl Extensions {
    /// True when no reserved extension is set and nothing was passed through.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.extra.is_empty()
    }

    /// Look up a reserved extension.
    pub fn get(&self, key: ExtensionKey) -> Option<&ExtensionValue> {
        self.entries.get(&key)
    }

    /// Whether a reserved extension is set.
    pub fn contains(&self, key: ExtensionKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Add `value` under `key` unless the key is already present.
    ///
    /// Returns whether the value was inserted. Re-applying an annotation
    /// therefore never changes an existing extension.
    pub fn insert_if_absent(&mut self, key: ExtensionKey, value: impl Into<ExtensionValue>) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value.into());
        true
    }

    /// Set `value` under `key`, replacing any previous value in place.
    pub fn set(&mut self, key: ExtensionKey, value: ExtensionValue) -> Option<ExtensionValue> {
        self.entries.insert(key, value)
    }

    /// Remove a reserved extension, keeping the order of the others.
    pub fn take(&mut self, key: ExtensionKey) -> Option<ExtensionValue> {
        self.entries.shift_remove(&key)
    }

    /// Iterate reserved extensions in document order.
    pub fn iter(&self) -> impl Iterator<Item = (ExtensionKey, &ExtensionValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// Fields carried through without interpretation.
    pub fn extra(&self) -> &IndexMap<String, Value> {
        &self.extra
    }

    /// Mutable access to the pass-through fields.
    pub fn extra_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.extra
    }

    /// Build from a map of raw fields, splitting reserved keys from the rest.
    pub(crate) fn from_fields(fields: IndexMap<String, Value>) -> Result<Self, serde_json::Error> {
        let mut extensions = Extensions::default();
        for (name, value) in fields {
            match ExtensionKey::from_name(&name) {
                Some(key) => {
                    let parsed = ExtensionValue::from_json(key, value).map_err(|err| {
                        serde_json::Error::custom(format!("invalid {name}: {err}"))
                    })?;
                    extensions.entries.insert(key, parsed);
                }
                None => {
                    extensions.extra.insert(name, value);
                }
            }
        }
        Ok(extensions)
    }

    /// Write every field into an already-open map.
    pub(crate) fn serialize_fields<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        for (key, value) in &self.entries {
            map.serialize_entry(key.as_str(), value)?;
        }
        for (name, value) in &self.extra {
            map.serialize_entry(name, value)?;
        }
        Ok(())
    }
}

impl Serialize for Extensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + self.extra.len()))?;
        self.serialize_fields(&mut map)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Extensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = IndexMap::<String, Value>::deserialize(deserializer)?;
        Extensions::from_fields(fields).map_err(D::Error::custom)
    }
}
