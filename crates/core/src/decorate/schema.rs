//! Schema decorator.
//!
//! Decorates the properties of a schema node with what its data type
//! declares, then handles dynamic-schema types: the node's shape is moved
//! into a named definition (registered once per type) carrying the
//! `x-ms-dynamic-schema` record, and the node becomes a bare reference.

use tracing::{debug, warn};

use super::{apply_metadata, dynamic_values_record};
use crate::annotations::{
    AnnotationIndex, DynamicSchemaLookup, PropertyAnnotations, TypeAnnotations, TypeRef,
};
use crate::error::Result;
use crate::lookup::parse_parameter_spec;
use crate::registry::SchemaRegistry;
use crate::spec::{DynamicSchema, ExtensionKey, Schema};

/// Decorate an inline schema node generated for `source`.
///
/// Does nothing when `source` is `None`.
pub fn decorate_schema(
    schema: &mut Schema,
    registry: &mut SchemaRegistry,
    source: Option<(&TypeRef, &TypeAnnotations)>,
) -> Result<()> {
    let Some((ty, declared)) = source else {
        return Ok(());
    };

    decorate_members(schema, declared)?;

    if let Some(lookup) = &declared.dynamic_schema {
        register_dynamic_schema(schema, registry, ty, lookup)?;
    }
    Ok(())
}

/// Decorate a named definition with what its type declares.
///
/// A definition is already the single source of truth for its type, so
/// the `x-ms-dynamic-schema` record goes on it directly.
pub fn decorate_definition(definition: &mut Schema, declared: &TypeAnnotations) -> Result<()> {
    decorate_members(definition, declared)?;
    if let Some(lookup) = &declared.dynamic_schema {
        let record = dynamic_schema_record(lookup)?;
        definition
            .extensions
            .insert_if_absent(ExtensionKey::DynamicSchema, record);
    }
    Ok(())
}

/// Decorate `schema` and every node below it whose `title` names an
/// annotated type, innermost first.
///
/// Returns how many nodes had annotations.
pub fn decorate_schema_tree(
    schema: &mut Schema,
    registry: &mut SchemaRegistry,
    index: &AnnotationIndex,
) -> Result<usize> {
    let mut decorated = 0;
    for property in schema.properties.values_mut() {
        decorated += decorate_schema_tree(property, registry, index)?;
    }
    if let Some(items) = schema.items.as_deref_mut() {
        decorated += decorate_schema_tree(items, registry, index)?;
    }

    let source = schema
        .title
        .as_deref()
        .and_then(|title| index.type_annotations(title));
    if let Some((ty, declared)) = source {
        decorate_schema(schema, registry, Some((&ty, declared)))?;
        decorated += 1;
    }
    Ok(decorated)
}

fn decorate_members(schema: &mut Schema, declared: &TypeAnnotations) -> Result<()> {
    // A bare reference must stay bare; the definition carries the metadata.
    if let Some(metadata) = &declared.metadata
        && !schema.is_reference_only()
    {
        apply_metadata(schema, metadata);
    }

    for (name, property) in schema.properties.iter_mut() {
        if let Some(annotations) = declared.properties.get(name) {
            decorate_property(name, property, annotations)?;
        }
    }
    Ok(())
}

fn decorate_property(
    name: &str,
    property: &mut Schema,
    declared: &PropertyAnnotations,
) -> Result<()> {
    if let Some(lookup) = &declared.dynamic_values {
        let parameters = parse_parameter_spec(&lookup.parameters)?;
        // Property lookups name their target operation directly.
        let record = dynamic_values_record(lookup, lookup.lookup_operation.clone(), parameters);
        if property
            .extensions
            .insert_if_absent(ExtensionKey::DynamicValues, record)
        {
            debug!(property = name, "Applied x-ms-dynamic-values.");
        }
    }

    if let Some(metadata) = &declared.metadata {
        apply_metadata(property, metadata);
    }

    if declared.callback_url {
        property
            .extensions
            .insert_if_absent(ExtensionKey::NotificationUrl, true);
        property
            .extensions
            .insert_if_absent(ExtensionKey::Visibility, "internal");
    }
    Ok(())
}

fn dynamic_schema_record(lookup: &DynamicSchemaLookup) -> Result<DynamicSchema> {
    Ok(DynamicSchema {
        operation_id: lookup.lookup_operation.clone(),
        parameters: parse_parameter_spec(&lookup.parameters)?,
        value_path: lookup.value_path.clone(),
    })
}

fn register_dynamic_schema(
    schema: &mut Schema,
    registry: &mut SchemaRegistry,
    ty: &TypeRef,
    lookup: &DynamicSchemaLookup,
) -> Result<()> {
    let record = dynamic_schema_record(lookup)?;
    if ty.is_trivial() {
        debug!(type_name = %ty, "Dynamic schema on a primitive type, nothing to register.");
        return Ok(());
    }
    let name = ty.name();

    if registry.try_lookup_by_type(ty).is_none() {
        if schema.ref_path.is_some() {
            warn!(
                type_name = %ty,
                reference = schema.ref_path.as_deref().unwrap_or_default(),
                "Schema references a definition that is not registered, leaving it as is."
            );
            return Ok(());
        }
        let mut definition = schema.clone();
        definition.extensions.take(ExtensionKey::DynamicSchema);
        registry.register(name, definition);
    }

    if let Some(definition) = registry.get_mut(name) {
        definition
            .extensions
            .insert_if_absent(ExtensionKey::DynamicSchema, record);
    }
    schema.make_reference_to(name);
    Ok(())
}
