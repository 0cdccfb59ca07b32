//! Operation decorator.
//!
//! Applies in order:
//! 1. Operation metadata: summary, friendly-name derived identifier, visibility
//! 2. Parameter metadata
//! 3. Parameter value lookups, resolved against sibling operations
//! 4. Trigger semantics: batch mode, notification content or polling responses
//! 5. `default` response synthesis
//!
//! Step 5 runs for every operation, annotated or not.

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::schema::decorate_schema_tree;
use super::{
    DecorationContext, LookupFallback, apply_metadata, apply_visibility, dynamic_values_record,
};
use crate::annotations::{
    MetadataAnnotation, OperationAnnotations, TriggerAnnotation, TriggerPattern, TypeRef,
};
use crate::error::Result;
use crate::lookup::{Resolution, parse_parameter_spec};
use crate::naming::operation_id;
use crate::spec::{ExtensionKey, MediaType, NotificationContent, Operation, Response, Schema};

const DEFAULT_RESPONSE: &str = "default";
const POLLING_DATA_RESPONSE: &str = "200";
const POLLING_ACCEPTED_RESPONSE: &str = "202";
const ACCEPTED_DESCRIPTION: &str = "Accepted";
const JSON_MEDIA_TYPE: &str = "application/json";

/// Decorate one operation with what `declared` says about it.
///
/// `declared` is `None` for operations without annotations; only the
/// `default` response is synthesized for those.
pub fn decorate_operation(
    operation: &mut Operation,
    declared: Option<&OperationAnnotations>,
    ctx: &mut DecorationContext<'_>,
) -> Result<()> {
    if let Some(declared) = declared {
        if let Some(metadata) = &declared.metadata {
            apply_operation_metadata(operation, metadata);
        }
        apply_parameter_metadata(operation, declared);
        apply_parameter_lookups(operation, declared, ctx)?;
        if let Some(trigger) = &declared.trigger {
            apply_trigger(operation, trigger, ctx)?;
        }
    }

    if ctx.synthesize_default_response && synthesize_default_response(operation) {
        debug!(
            operation_id = operation.operation_id.as_deref().unwrap_or_default(),
            "Synthesized default response."
        );
    }
    Ok(())
}

fn apply_operation_metadata(operation: &mut Operation, metadata: &MetadataAnnotation) {
    if let Some(description) = metadata.description() {
        operation.summary = Some(description.to_string());
    }
    if let Some(friendly_name) = metadata.friendly_name() {
        operation.summary = Some(friendly_name.to_string());
        operation.operation_id = Some(operation_id(friendly_name));
    }
    apply_visibility(&mut operation.extensions, metadata);
}

fn apply_parameter_metadata(operation: &mut Operation, declared: &OperationAnnotations) {
    for param in &declared.parameters {
        let Some(metadata) = &param.metadata else {
            continue;
        };
        match operation.parameter_mut(&param.name) {
            Some(target) => apply_metadata(target, metadata),
            None => debug!(
                method = %declared.method,
                path = %declared.path,
                parameter = %param.name,
                "Annotated parameter not present in document, skipping."
            ),
        }
    }
}

fn apply_parameter_lookups(
    operation: &mut Operation,
    declared: &OperationAnnotations,
    ctx: &mut DecorationContext<'_>,
) -> Result<()> {
    for param in &declared.parameters {
        let Some(lookup) = &param.dynamic_values else {
            continue;
        };
        let parameters = parse_parameter_spec(&lookup.parameters)?;
        let Some(target) = operation.parameter_mut(&param.name) else {
            warn!(
                method = %declared.method,
                path = %declared.path,
                parameter = %param.name,
                "Parameter with value lookup not present in document, skipping."
            );
            continue;
        };
        if target.extensions.contains(ExtensionKey::DynamicValues) {
            continue;
        }

        let names: Vec<&str> = parameters.names().collect();
        let resolution = ctx.resolver.resolve(&lookup.lookup_operation, &names)?;
        if let Resolution::Fallback { reason, .. } = &resolution {
            ctx.fallbacks.push(LookupFallback {
                operation: format!("{} {}", declared.method, declared.path),
                parameter: param.name.clone(),
                action: lookup.lookup_operation.clone(),
                reason: *reason,
            });
        }

        let record =
            dynamic_values_record(lookup, resolution.operation_id().to_string(), parameters);
        target
            .extensions
            .insert_if_absent(ExtensionKey::DynamicValues, record);
        debug!(parameter = %param.name, "Applied x-ms-dynamic-values.");
    }
    Ok(())
}

fn apply_trigger(
    operation: &mut Operation,
    trigger: &TriggerAnnotation,
    ctx: &mut DecorationContext<'_>,
) -> Result<()> {
    operation
        .extensions
        .insert_if_absent(ExtensionKey::Trigger, trigger.pattern.batch_mode());

    let data_schema = trigger
        .data_type
        .as_ref()
        .map(|ty| trigger_payload_schema(ty, ctx))
        .transpose()?;
    let data_description = non_blank(&trigger.data_friendly_name);

    match trigger.pattern {
        TriggerPattern::Subscription => {
            if operation
                .extensions
                .contains(ExtensionKey::NotificationContent)
            {
                return Ok(());
            }
            let content = NotificationContent {
                description: data_description.map(str::to_string),
                schema: data_schema.unwrap_or_default().summary(),
            };
            operation
                .extensions
                .insert_if_absent(ExtensionKey::NotificationContent, content);
        }
        TriggerPattern::PollingSingle | TriggerPattern::PollingBatched => {
            if !operation.responses.contains_key(POLLING_DATA_RESPONSE) {
                operation.responses.insert(
                    POLLING_DATA_RESPONSE.to_string(),
                    data_response(data_description, data_schema),
                );
            }
            if !operation.responses.contains_key(POLLING_ACCEPTED_RESPONSE) {
                operation.responses.insert(
                    POLLING_ACCEPTED_RESPONSE.to_string(),
                    Response {
                        description: Some(ACCEPTED_DESCRIPTION.to_string()),
                        ..Response::default()
                    },
                );
            }
        }
    }
    Ok(())
}

/// Generated payload schema, decorated like any schema already in the document.
fn trigger_payload_schema(ty: &TypeRef, ctx: &mut DecorationContext<'_>) -> Result<Schema> {
    let mut schema = ctx.generator.generate_schema(ty, &ctx.registry);
    let index = ctx.resolver.index();
    decorate_schema_tree(&mut schema, &mut ctx.registry, index)?;
    Ok(schema)
}

/// The JSON media entry is written even without a data type; its schema is
/// then left empty.
fn data_response(description: Option<&str>, schema: Option<Schema>) -> Response {
    let mut content = IndexMap::new();
    content.insert(
        JSON_MEDIA_TYPE.to_string(),
        MediaType {
            schema,
            ..MediaType::default()
        },
    );
    Response {
        description: description.map(str::to_string),
        content,
        ..Response::default()
    }
}

fn non_blank(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// Copy the first 2xx response to `default` when there is no `default`.
///
/// Responses are scanned in document order. Returns whether a response was
/// added.
pub fn synthesize_default_response(operation: &mut Operation) -> bool {
    if operation.responses.contains_key(DEFAULT_RESPONSE) {
        return false;
    }
    let Some(success) = operation
        .responses
        .iter()
        .find(|(code, _)| code.starts_with('2'))
        .map(|(_, response)| response.clone())
    else {
        return false;
    };
    operation
        .responses
        .insert(DEFAULT_RESPONSE.to_string(), success);
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationIndex;
    use crate::lookup::{FallbackReason, LookupResolution, ParamValue, SiblingResolver};
    use crate::registry::{RegistryGenerator, SchemaRegistry};
    use crate::spec::{ExtensionValue, HttpMethod, Parameter};
    use serde_json::json;

    const INDEX_JSON: &str = r#"{
      "operations": [
        {
          "path": "/invoices", "method": "get", "action": "ListInvoices",
          "metadata": {
            "friendlyName": "Get All Invoices",
            "description": "Lists every invoice",
            "visibility": "important"
          },
          "parameters": [
            {
              "name": "accountId",
              "metadata": { "friendlyName": "Account", "visibility": "advanced" },
              "dynamicValues": {
                "lookupOperation": "ListAccounts",
                "parameters": "region={region}&active=true",
                "valuePath": "id",
                "valueTitle": "name"
              }
            },
            {
              "name": "status",
              "dynamicValues": {
                "lookupOperation": "ListStatuses",
                "parameters": "",
                "valuePath": "code"
              }
            }
          ]
        },
        {
          "path": "/accounts", "method": "get", "action": "ListAccounts",
          "parameters": [{ "name": "active" }, { "name": "region" }],
          "metadata": { "friendlyName": "List Accounts" }
        },
        {
          "path": "/poll", "method": "get", "action": "PollInvoices",
          "trigger": { "pattern": "pollingBatched", "dataType": "Invoice", "dataFriendlyName": "Invoices" }
        },
        {
          "path": "/subscribe", "method": "post", "action": "Subscribe",
          "trigger": { "pattern": "subscription", "dataType": "Invoice", "dataFriendlyName": "New invoice" }
        }
      ]
    }"#;

    fn index() -> AnnotationIndex {
        AnnotationIndex::from_json(INDEX_JSON).unwrap()
    }

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register("Invoice", Schema::scalar("object"));
        registry
    }

    fn decorate(
        index: &AnnotationIndex,
        path: &str,
        method: HttpMethod,
        op: &mut Operation,
    ) -> Vec<LookupFallback> {
        let generator = RegistryGenerator;
        let mut ctx = DecorationContext::new(
            registry(),
            &generator,
            SiblingResolver::new(index, LookupResolution::Permissive),
        );
        decorate_operation(op, index.operation(path, method), &mut ctx).unwrap();
        ctx.into_parts().1
    }

    fn operation(json: serde_json::Value) -> Operation {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_metadata_sets_summary_id_and_visibility() {
        let index = index();
        let mut op = operation(json!({
            "operationId": "ListInvoices",
            "parameters": [{ "name": "accountId", "in": "query" }, { "name": "status", "in": "query" }],
            "responses": { "200": { "description": "OK" } }
        }));
        decorate(&index, "/invoices", HttpMethod::Get, &mut op);

        assert_eq!(op.summary.as_deref(), Some("Get All Invoices"));
        assert_eq!(op.operation_id.as_deref(), Some("GetAllInvoices"));
        assert_eq!(
            op.extensions.get(ExtensionKey::Visibility),
            Some(&ExtensionValue::from("important"))
        );

        let account = &op.parameters[0];
        assert_eq!(
            account.extensions.get(ExtensionKey::Summary),
            Some(&ExtensionValue::from("Account"))
        );
        assert_eq!(
            account.extensions.get(ExtensionKey::Visibility),
            Some(&ExtensionValue::from("advanced"))
        );
    }

    #[test]
    fn test_description_only_sets_summary() {
        let index = AnnotationIndex::from_json(
            r#"{ "operations": [{ "path": "/a", "method": "get", "action": "A",
                 "metadata": { "description": "Reads things" } }] }"#,
        )
        .unwrap();
        let mut op = operation(json!({ "operationId": "A", "responses": {} }));
        decorate(&index, "/a", HttpMethod::Get, &mut op);
        assert_eq!(op.summary.as_deref(), Some("Reads things"));
        assert_eq!(op.operation_id.as_deref(), Some("A"));
        assert!(op.extensions.is_empty());
    }

    #[test]
    fn test_lookup_resolves_sibling_and_records_fallbacks() {
        let index = index();
        let mut op = operation(json!({
            "parameters": [{ "name": "accountId" }, { "name": "status" }],
            "responses": {}
        }));
        let fallbacks = decorate(&index, "/invoices", HttpMethod::Get, &mut op);

        match op.parameters[0].extensions.get(ExtensionKey::DynamicValues) {
            Some(ExtensionValue::DynamicValues(record)) => {
                assert_eq!(record.operation_id, "ListAccounts");
                assert_eq!(
                    record.parameters.get("region"),
                    Some(&ParamValue::Reference("region".to_string()))
                );
                assert_eq!(record.value_path, "id");
                assert_eq!(record.value_title.as_deref(), Some("name"));
            }
            other => panic!("unexpected extension: {other:?}"),
        }

        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].operation, "GET /invoices");
        assert_eq!(fallbacks[0].parameter, "status");
        assert_eq!(fallbacks[0].reason, FallbackReason::NoMatch);
    }

    #[test]
    fn test_existing_lookup_is_left_alone() {
        let index = index();
        let existing = json!({ "operationId": "Handwritten", "value-path": "x" });
        let mut op = operation(json!({
            "parameters": [{ "name": "accountId", "x-ms-dynamic-values": existing }],
            "responses": {}
        }));
        decorate(&index, "/invoices", HttpMethod::Get, &mut op);
        let value = serde_json::to_value(&op.parameters[0]).unwrap();
        assert_eq!(value["x-ms-dynamic-values"], existing);
    }

    #[test]
    fn test_polling_trigger_adds_responses() {
        let index = index();
        let mut op = operation(json!({ "responses": {} }));
        decorate(&index, "/poll", HttpMethod::Get, &mut op);

        assert_eq!(
            op.extensions.get(ExtensionKey::Trigger),
            Some(&ExtensionValue::from("batch"))
        );
        let data = &op.responses["200"];
        assert_eq!(data.description.as_deref(), Some("Invoices"));
        let schema = data.content["application/json"].schema.as_ref().unwrap();
        assert_eq!(schema.referenced_name(), Some("Invoice"));
        assert_eq!(op.responses["202"].description.as_deref(), Some("Accepted"));
        assert_eq!(op.responses["default"], op.responses["200"]);
    }

    #[test]
    fn test_subscription_trigger_writes_notification_content() {
        let index = index();
        let mut op = operation(json!({ "responses": { "201": { "description": "Created" } } }));
        decorate(&index, "/subscribe", HttpMethod::Post, &mut op);

        assert_eq!(
            op.extensions.get(ExtensionKey::Trigger),
            Some(&ExtensionValue::from("single"))
        );
        match op.extensions.get(ExtensionKey::NotificationContent) {
            Some(ExtensionValue::NotificationContent(content)) => {
                assert_eq!(content.description.as_deref(), Some("New invoice"));
                assert_eq!(
                    content.schema.ref_path.as_deref(),
                    Some("#/components/schemas/Invoice")
                );
            }
            other => panic!("unexpected extension: {other:?}"),
        }
        assert!(!op.responses.contains_key("200"));
        assert!(!op.responses.contains_key("202"));
        assert_eq!(op.responses["default"].description.as_deref(), Some("Created"));
    }

    #[test]
    fn test_polling_without_data_type_has_empty_json_content() {
        let trigger = TriggerAnnotation {
            pattern: TriggerPattern::PollingSingle,
            data_type: None,
            data_friendly_name: String::new(),
        };
        let index = AnnotationIndex::default();
        let generator = RegistryGenerator;
        let mut ctx = DecorationContext::new(
            SchemaRegistry::new(),
            &generator,
            SiblingResolver::new(&index, LookupResolution::Permissive),
        );
        let mut op = Operation::default();
        apply_trigger(&mut op, &trigger, &mut ctx).unwrap();
        let data = &op.responses["200"];
        assert_eq!(data.content.keys().collect::<Vec<_>>(), vec!["application/json"]);
        assert!(data.content["application/json"].schema.is_none());
        assert!(data.description.is_none());
        assert_eq!(
            serde_json::to_value(data).unwrap(),
            json!({ "content": { "application/json": {} } })
        );
    }

    #[test]
    fn test_generated_payload_of_dynamic_schema_type_is_registered() {
        let index = AnnotationIndex::from_json(
            r#"{
              "operations": [{
                "path": "/poll", "method": "get", "action": "PollOrders",
                "trigger": { "pattern": "pollingSingle", "dataType": "Order", "dataFriendlyName": "Orders" }
              }],
              "types": { "Order": {
                "metadata": { "friendlyName": "Order" },
                "dynamicSchema": { "lookupOperation": "GetOrderSchema", "parameters": "", "valuePath": "schema" }
              } }
            }"#,
        )
        .unwrap();
        let generator = RegistryGenerator;
        let mut ctx = DecorationContext::new(
            SchemaRegistry::new(),
            &generator,
            SiblingResolver::new(&index, LookupResolution::Permissive),
        );
        let mut op = operation(json!({ "responses": {} }));
        decorate_operation(&mut op, index.operation("/poll", HttpMethod::Get), &mut ctx).unwrap();

        let schema = op.responses["200"].content["application/json"].schema.as_ref().unwrap();
        assert_eq!(schema.referenced_name(), Some("Order"));
        let (registry, _) = ctx.into_parts();
        let order = registry.get("Order").unwrap();
        assert!(order.extensions.contains(ExtensionKey::DynamicSchema));
        assert_eq!(
            order.extensions.get(ExtensionKey::Summary),
            Some(&ExtensionValue::from("Order"))
        );
    }

    #[test]
    fn test_default_response_uses_first_success_in_order() {
        let mut op = operation(json!({ "responses": {
            "404": { "description": "Missing" },
            "202": { "description": "Queued" },
            "200": { "description": "OK" }
        }}));
        assert!(synthesize_default_response(&mut op));
        assert_eq!(op.responses["default"].description.as_deref(), Some("Queued"));
    }

    #[test]
    fn test_default_response_never_overwritten() {
        let mut op = operation(json!({ "responses": {
            "200": { "description": "A" },
            "202": { "description": "C" },
            "default": { "description": "D" }
        }}));
        let before = op.clone();
        assert!(!synthesize_default_response(&mut op));
        assert_eq!(op, before);
    }

    #[test]
    fn test_no_success_response_means_no_default() {
        let mut op = operation(json!({ "responses": { "500": { "description": "Boom" } } }));
        assert!(!synthesize_default_response(&mut op));
        assert!(!op.responses.contains_key("default"));
    }

    #[test]
    fn test_malformed_lookup_arguments_fail() {
        let index = AnnotationIndex::from_json(
            r#"{ "operations": [{ "path": "/a", "method": "get", "action": "A",
                 "parameters": [{ "name": "p", "dynamicValues": {
                   "lookupOperation": "B", "parameters": "novalue", "valuePath": "id" } }] }] }"#,
        )
        .unwrap();
        let generator = RegistryGenerator;
        let mut ctx = DecorationContext::new(
            SchemaRegistry::new(),
            &generator,
            SiblingResolver::new(&index, LookupResolution::Permissive),
        );
        let mut op = Operation {
            parameters: vec![Parameter::named("p")],
            ..Operation::default()
        };
        let err = decorate_operation(&mut op, index.operation("/a", HttpMethod::Get), &mut ctx)
            .unwrap_err();
        assert_eq!(err.code(), "MALFORMED_PARAMETER_SPEC");
    }
}
