//! Decorators that rewrite vendor extensions in place.
//!
//! - `operation`: friendly names, visibility, lookups, trigger semantics and
//!   the `default` response of one operation
//! - `schema`: property metadata, value lookups and dynamic-schema
//!   registration of one schema node
//! - `finalize`: whole-document pass that must run after every operation
//!   has been decorated
//!
//! Every extension write goes through [`Extensions::insert_if_absent`], so
//! running a decorator twice leaves the document as running it once.

mod finalize;
mod operation;
mod schema;

pub use finalize::finalize_document;
pub use operation::{decorate_operation, synthesize_default_response};
pub use schema::{decorate_definition, decorate_schema, decorate_schema_tree};

use crate::annotations::{DynamicValueLookup, MetadataAnnotation};
use crate::lookup::{FallbackReason, ParameterMap, SiblingResolver};
use crate::registry::{SchemaGenerator, SchemaRegistry};
use crate::spec::{DynamicValues, ExtensionKey, Extensions, Parameter, Schema};

/// A lookup whose target kept its declared action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFallback {
    /// Operation owning the parameter, as `VERB /path`.
    pub operation: String,
    /// Parameter carrying the lookup.
    pub parameter: String,
    /// Declared action name.
    pub action: String,
    /// Why it was not resolved.
    pub reason: FallbackReason,
}

/// Per-build state threaded through every decorator call.
#[derive(Debug)]
pub struct DecorationContext<'a> {
    /// Named definitions of this build.
    pub registry: SchemaRegistry,
    generator: &'a dyn SchemaGenerator,
    resolver: SiblingResolver<'a>,
    synthesize_default_response: bool,
    fallbacks: Vec<LookupFallback>,
}

impl<'a> DecorationContext<'a> {
    /// Context for one build.
    pub fn new(
        registry: SchemaRegistry,
        generator: &'a dyn SchemaGenerator,
        resolver: SiblingResolver<'a>,
    ) -> Self {
        Self {
            registry,
            generator,
            resolver,
            synthesize_default_response: true,
            fallbacks: Vec::new(),
        }
    }

    /// Turn `default` response synthesis on or off.
    pub fn with_default_response(mut self, enabled: bool) -> Self {
        self.synthesize_default_response = enabled;
        self
    }

    /// Lookups that fell back to their action name so far.
    pub fn fallbacks(&self) -> &[LookupFallback] {
        &self.fallbacks
    }

    /// Finish the build, returning the registry and recorded fallbacks.
    pub fn into_parts(self) -> (SchemaRegistry, Vec<LookupFallback>) {
        (self.registry, self.fallbacks)
    }
}

/// A node that can carry a friendly name, description and visibility.
trait Annotatable {
    fn description_mut(&mut self) -> &mut Option<String>;
    fn extensions_mut(&mut self) -> &mut Extensions;
}

impl Annotatable for Parameter {
    fn description_mut(&mut self) -> &mut Option<String> {
        &mut self.description
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl Annotatable for Schema {
    fn description_mut(&mut self) -> &mut Option<String> {
        &mut self.description
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Description overwrites; friendly name goes to `x-ms-summary`; visibility
/// to `x-ms-visibility` unless it is the default tier.
fn apply_metadata<T: Annotatable>(target: &mut T, metadata: &MetadataAnnotation) {
    if let Some(description) = metadata.description() {
        *target.description_mut() = Some(description.to_string());
    }
    if let Some(friendly_name) = metadata.friendly_name() {
        target
            .extensions_mut()
            .insert_if_absent(ExtensionKey::Summary, friendly_name);
    }
    apply_visibility(target.extensions_mut(), metadata);
}

fn apply_visibility(extensions: &mut Extensions, metadata: &MetadataAnnotation) {
    if let Some(visibility) = metadata.visibility.as_extension() {
        extensions.insert_if_absent(ExtensionKey::Visibility, visibility);
    }
}

fn dynamic_values_record(
    lookup: &DynamicValueLookup,
    operation_id: String,
    parameters: ParameterMap,
) -> DynamicValues {
    DynamicValues {
        operation_id,
        parameters,
        value_collection: lookup.value_collection.clone(),
        value_path: lookup.value_path.clone(),
        value_title: lookup.value_title.clone(),
    }
}
