//! Named schema definitions for one document build.
//!
//! The registry is an explicit context object: it is seeded from the draft
//! document, threaded through every decorator call, and written back when
//! the build finishes. Nothing is shared between builds.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::annotations::TypeRef;
use crate::spec::Schema;

/// Named definitions keyed by type name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    definitions: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `definitions`.
    pub fn from_definitions(definitions: IndexMap<String, Schema>) -> Self {
        Self { definitions }
    }

    /// Hand the definitions back to the document.
    pub fn into_definitions(self) -> IndexMap<String, Schema> {
        self.definitions
    }

    /// Definition registered for `ty`, if any.
    pub fn try_lookup_by_type(&self, ty: &TypeRef) -> Option<&Schema> {
        self.definitions.get(ty.name())
    }

    /// Definition registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }

    /// Mutable access to a definition.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.definitions.get_mut(name)
    }

    /// Register `schema` under `name`.
    ///
    /// An existing definition is never replaced; returns whether `schema`
    /// was added.
    pub fn register(&mut self, name: impl Into<String>, schema: Schema) -> bool {
        let name = name.into();
        if self.definitions.contains_key(&name) {
            return false;
        }
        debug!(definition = %name, "Registered schema definition.");
        self.definitions.insert(name, schema);
        true
    }

    /// A bare reference to `name`, if it is registered.
    pub fn reference_to(&self, name: &str) -> Option<Schema> {
        self.definitions
            .contains_key(name)
            .then(|| Schema::reference(name))
    }

    /// Registered names in order.
    pub fn names(&self) -> Vec<String> {
        self.definitions.keys().cloned().collect()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Turns a data type into a schema fragment.
///
/// Implemented by the host's type-to-schema generator.
pub trait SchemaGenerator: std::fmt::Debug {
    /// Schema for `ty`, given the definitions registered so far.
    fn generate_schema(&self, ty: &TypeRef, registry: &SchemaRegistry) -> Schema;
}

/// Generator backed by the registry alone.
///
/// Registered types become references, JSON primitives become scalar
/// schemas, and anything else becomes an untyped object placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryGenerator;

impl SchemaGenerator for RegistryGenerator {
    fn generate_schema(&self, ty: &TypeRef, registry: &SchemaRegistry) -> Schema {
        if ty.is_trivial() {
            return match ty.name().trim() {
                "" | "any" => Schema::default(),
                name => Schema::scalar(name),
            };
        }
        if let Some(reference) = registry.reference_to(ty.name()) {
            return reference;
        }
        warn!(type_name = %ty, "No definition registered for type, using object placeholder.");
        Schema {
            title: Some(ty.name().to_string()),
            ..Schema::scalar("object")
        }
    }
}
