//! Document enrichment pipeline.
//!
//! The pipeline is:
//! 1. Seed: `components.schemas` -> SchemaRegistry
//! 2. Schemas: decorate annotated definitions, then every inline schema
//!    whose `title` names an annotated type (innermost first)
//! 3. Operations: decorate each operation with its annotations, looked up
//!    by path and verb
//!    (generated trigger payloads get the same schema decoration)
//! 4. Write back: SchemaRegistry -> `components.schemas`
//! 5. Finalize: hoist notification content to path items
//!
//! Everything a build needs lives in its own [`DecorationContext`]; two
//! builds never share state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::annotations::AnnotationIndex;
use crate::decorate::{
    DecorationContext, LookupFallback, decorate_definition, decorate_operation,
    decorate_schema_tree, finalize_document,
};
use crate::error::Result;
use crate::lookup::{LookupResolution, SiblingResolver};
use crate::registry::{RegistryGenerator, SchemaGenerator, SchemaRegistry};
use crate::spec::{Components, Document, Operation, Schema};

/// Knobs for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineOptions {
    /// What to do with lookups naming no operation, or several.
    pub lookup_resolution: LookupResolution,
    /// Copy the first 2xx response to `default`.
    pub synthesize_default_response: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            lookup_resolution: LookupResolution::Permissive,
            synthesize_default_response: true,
        }
    }
}

/// What a build changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Operations that had annotations.
    pub operations_decorated: usize,
    /// Definitions and inline schemas that had annotations.
    pub schemas_decorated: usize,
    /// Definitions added to `components.schemas`.
    pub definitions_registered: usize,
    /// Notification records moved to path items.
    pub notifications_hoisted: usize,
    /// Lookups that kept their declared action name.
    pub lookup_fallbacks: Vec<LookupFallback>,
}

/// Enrich `document` in place with what `index` declares.
pub fn enrich(
    document: &mut Document,
    index: &AnnotationIndex,
    options: &PipelineOptions,
    generator: &dyn SchemaGenerator,
) -> Result<EnrichReport> {
    let mut report = EnrichReport::default();

    // Seed the registry from the draft
    let seeded = document
        .components
        .as_mut()
        .map(|components| std::mem::take(&mut components.schemas))
        .unwrap_or_default();
    let seeded_count = seeded.len();
    let mut ctx = DecorationContext::new(
        SchemaRegistry::from_definitions(seeded),
        generator,
        SiblingResolver::new(index, options.lookup_resolution),
    )
    .with_default_response(options.synthesize_default_response);

    // Schemas before operations, so generated trigger payloads see every definition
    report.schemas_decorated += decorate_definitions(&mut ctx.registry, index)?;
    for item in document.paths.values_mut() {
        for operation in item.operations.values_mut() {
            for schema in operation_schemas(operation) {
                report.schemas_decorated +=
                    decorate_schema_tree(schema, &mut ctx.registry, index)?;
            }
        }
    }

    for (path, item) in document.paths.iter_mut() {
        for (method, operation) in item.operations.iter_mut() {
            let declared = index.operation(path, *method);
            if declared.is_some() {
                report.operations_decorated += 1;
            } else {
                debug!(%method, %path, "No annotations for operation.");
            }
            decorate_operation(operation, declared, &mut ctx)?;
        }
    }

    // Write the registry back
    let (registry, fallbacks) = ctx.into_parts();
    report.definitions_registered = registry.len().saturating_sub(seeded_count);
    report.lookup_fallbacks = fallbacks;
    if !registry.is_empty() {
        document
            .components
            .get_or_insert_with(Components::default)
            .schemas = registry.into_definitions();
    }

    report.notifications_hoisted = finalize_document(document);

    info!(
        operations = report.operations_decorated,
        schemas = report.schemas_decorated,
        definitions = report.definitions_registered,
        notifications = report.notifications_hoisted,
        fallbacks = report.lookup_fallbacks.len(),
        "Enriched document."
    );
    Ok(report)
}

/// Enrich an OpenAPI JSON string, returning pretty-printed JSON.
///
/// Uses [`RegistryGenerator`] for trigger payload schemas.
pub fn enrich_json(
    document_json: &str,
    index: &AnnotationIndex,
    options: &PipelineOptions,
) -> Result<String> {
    // Parse the draft
    let mut document = Document::from_json(document_json)?;

    // Decorate and finalize
    enrich(&mut document, index, options, &RegistryGenerator)?;

    document.to_json_pretty()
}

fn decorate_definitions(registry: &mut SchemaRegistry, index: &AnnotationIndex) -> Result<usize> {
    let mut decorated = 0;
    for name in registry.names() {
        // Taken out so nested inline schemas can register definitions too
        let Some(mut definition) = registry.get(&name).cloned() else {
            continue;
        };
        for property in definition.properties.values_mut() {
            decorated += decorate_schema_tree(property, registry, index)?;
        }
        if let Some(items) = definition.items.as_deref_mut() {
            decorated += decorate_schema_tree(items, registry, index)?;
        }
        if let Some((_, declared)) = index.type_annotations(&name) {
            decorate_definition(&mut definition, declared)?;
            decorated += 1;
        }
        if let Some(slot) = registry.get_mut(&name) {
            *slot = definition;
        }
    }
    Ok(decorated)
}

fn operation_schemas(operation: &mut Operation) -> Vec<&mut Schema> {
    let mut schemas = Vec::new();
    for param in operation.parameters.iter_mut() {
        schemas.extend(param.schema.as_mut());
    }
    if let Some(body) = operation.request_body.as_mut() {
        for media in body.content.values_mut() {
            schemas.extend(media.schema.as_mut());
        }
    }
    for response in operation.responses.values_mut() {
        for media in response.content.values_mut() {
            schemas.extend(media.schema.as_mut());
        }
    }
    schemas
}
