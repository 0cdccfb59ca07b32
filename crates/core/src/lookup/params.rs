//! Parameter spec parsing for dynamic lookups.
//!
//! A lookup declares the arguments of the operation it calls as text, in
//! one of two forms:
//! - a JSON object: `{"kind": "open", "owner": {"parameter": "accountId"}}`
//! - a query string: `kind=open&owner={accountId}`
//!
//! Both parse into the same ordered [`ParameterMap`].

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::{Error, Result};

/// Key marking a reference to another operation parameter in JSON form.
const REFERENCE_KEY: &str = "parameter";

/// One lookup argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Fixed value passed as-is.
    Literal(Value),
    /// Value taken from the named parameter of the current operation.
    Reference(String),
}

impl ParamValue {
    fn from_json(value: Value) -> Self {
        if let Value::Object(fields) = &value
            && fields.len() == 1
            && let Some(Value::String(name)) = fields.get(REFERENCE_KEY)
        {
            return ParamValue::Reference(name.clone());
        }
        ParamValue::Literal(value)
    }

    fn from_query(value: &str) -> Self {
        match value
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(name) if !name.trim().is_empty() => ParamValue::Reference(name.trim().to_string()),
            _ => ParamValue::Literal(Value::String(value.to_string())),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ParamValue::Literal(value) => value.clone(),
            ParamValue::Reference(name) => {
                let mut fields = Map::new();
                fields.insert(REFERENCE_KEY.to_string(), Value::String(name.clone()));
                Value::Object(fields)
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Literal(Value::String(value.to_string()))
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ParamValue::from_json)
    }
}

/// Lookup arguments in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap(IndexMap<String, ParamValue>);

impl ParameterMap {
    /// True when the lookup takes no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Argument by name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Set an argument; a repeated name keeps its first position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Argument names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Arguments in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Parse a lookup parameter spec.
///
/// Blank text means "no arguments". Text that is neither a JSON object nor
/// a well-formed query string fails with [`Error::MalformedParameterSpec`].
pub fn parse_parameter_spec(spec: &str) -> Result<ParameterMap> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Ok(ParameterMap::default());
    }

    if trimmed.starts_with('{') {
        match serde_json::from_str::<IndexMap<String, Value>>(trimmed) {
            Ok(fields) => {
                return Ok(ParameterMap(
                    fields
                        .into_iter()
                        .map(|(name, value)| (name, ParamValue::from_json(value)))
                        .collect(),
                ));
            }
            Err(json_err) => {
                return parse_query(trimmed).map_err(|query_err| malformed(
                    spec,
                    format!("not a JSON object ({json_err}) nor a query string ({query_err})"),
                ));
            }
        }
    }

    parse_query(trimmed).map_err(|reason| malformed(spec, reason))
}

fn parse_query(text: &str) -> std::result::Result<ParameterMap, String> {
    let mut params = ParameterMap::default();
    for segment in text.split('&') {
        if segment.is_empty() {
            continue;
        }
        let Some((raw_key, _)) = segment.split_once('=') else {
            return Err(format!("segment '{segment}' has no '='"));
        };
        if raw_key.trim().is_empty() {
            return Err(format!("segment '{segment}' has an empty name"));
        }
        // One segment decodes to exactly one pair.
        for (key, value) in form_urlencoded::parse(segment.as_bytes()) {
            params.insert(key.into_owned(), ParamValue::from_query(&value));
        }
    }
    Ok(params)
}

fn malformed(spec: &str, reason: String) -> Error {
    Error::MalformedParameterSpec {
        spec: spec.to_string(),
        reason,
    }
}
