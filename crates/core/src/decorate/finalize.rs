//! Document finalizer.
//!
//! The designer reads `x-ms-notification-content` from the path item, not
//! from the operation that declared it.

use tracing::debug;

use crate::spec::{Document, ExtensionKey, PathItem};

/// Move notification content from each operation to its path item.
///
/// When several operations of one path carry it, the last in document
/// order wins. Returns how many records were moved.
pub fn finalize_document(document: &mut Document) -> usize {
    let mut moved = 0;
    for (path, item) in document.paths.iter_mut() {
        let PathItem {
            operations,
            extensions,
        } = item;
        for (method, operation) in operations.iter_mut() {
            let Some(content) = operation.extensions.take(ExtensionKey::NotificationContent) else {
                continue;
            };
            if extensions
                .set(ExtensionKey::NotificationContent, content)
                .is_some()
            {
                debug!(%path, %method, "Replaced path-level notification content.");
            }
            moved += 1;
        }
    }
    moved
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn document(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_notification_content_moves_to_path() {
        let content = json!({ "description": "New item", "schema": { "type": "object" } });
        let mut doc = document(json!({
            "paths": {
                "/hook": {
                    "post": { "x-ms-notification-content": content, "responses": {} },
                    "delete": { "responses": {} }
                }
            }
        }));
        assert_eq!(finalize_document(&mut doc), 1);

        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(out["paths"]["/hook"]["x-ms-notification-content"], content);
        assert!(out["paths"]["/hook"]["post"].get("x-ms-notification-content").is_none());
    }

    #[test]
    fn test_last_operation_wins() {
        let mut doc = document(json!({
            "paths": {
                "/hook": {
                    "x-ms-notification-content": { "description": "old", "schema": {} },
                    "put": { "x-ms-notification-content": { "description": "first", "schema": {} } },
                    "post": { "x-ms-notification-content": { "description": "second", "schema": {} } }
                }
            }
        }));
        assert_eq!(finalize_document(&mut doc), 2);
        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            out["paths"]["/hook"]["x-ms-notification-content"]["description"],
            "second"
        );
    }

    #[test]
    fn test_document_without_notifications_is_unchanged() {
        let mut doc = document(json!({ "paths": { "/a": { "get": { "responses": {} } } } }));
        let before = doc.clone();
        assert_eq!(finalize_document(&mut doc), 0);
        assert_eq!(doc, before);
    }
}
