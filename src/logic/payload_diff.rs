use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ListError, Result};
use crate::model::{canonical_json, Id};

/// Minimal update for one entity: its id plus every field that changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatePatch {
    pub id: Id,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UpdatePatch {
    /// Whether the patch changes anything besides addressing the entity
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Compute the fields of `update` that differ from `current`.
///
/// Values compare by their serialized form, so list order and object key
/// order are significant. A field missing from `current` counts as absent
/// and any value in `update` differs from it. Designated collection fields
/// that end up in the patch as `null` are sent as `[]` so the backend can
/// tell "cleared" from "untouched"; they are never added when unchanged.
pub fn build_update_patch(
    id: Id,
    update: &Map<String, Value>,
    current: &Map<String, Value>,
    collection_fields: &[&str],
) -> UpdatePatch {
    let mut fields = Map::new();
    for (field, new_value) in update {
        // The id addresses the entity and is never part of the change set
        if field == "id" {
            continue;
        }
        let old = current.get(field).map(canonical_json);
        if old.as_deref() != Some(canonical_json(new_value).as_str()) {
            fields.insert(field.clone(), new_value.clone());
        }
    }

    for field in collection_fields {
        if let Some(value) = fields.get_mut(*field) {
            if value.is_null() {
                *value = Value::Array(Vec::new());
            }
        }
    }

    UpdatePatch { id, fields }
}

/// Diff two serializable values that must both be JSON objects
pub fn diff_objects<U: Serialize, C: Serialize>(
    id: Id,
    update: &U,
    current: &C,
    collection_fields: &[&str],
    what: &'static str,
) -> Result<UpdatePatch> {
    let Value::Object(update) = serde_json::to_value(update)? else {
        return Err(ListError::NotAnObject(what));
    };
    let Value::Object(current) = serde_json::to_value(current)? else {
        return Err(ListError::NotAnObject(what));
    };
    Ok(build_update_patch(id, &update, &current, collection_fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLLECTIONS: &[&str] = &["supporter_ids", "tag_ids", "attachment_ids"];

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test value is not an object"),
        }
    }

    #[test]
    fn test_only_changed_fields_are_kept() {
        let current = object(json!({
            "id": 3, "title": "Budget", "number": "A1", "tag_ids": [1, 2]
        }));
        let update = object(json!({
            "title": "Budget", "number": "A2", "tag_ids": [1, 2]
        }));

        let patch = build_update_patch(3, &update, &current, COLLECTIONS);
        assert_eq!(patch.fields, object(json!({"number": "A2"})));
        assert_eq!(
            patch.to_value().unwrap(),
            json!({"id": 3, "number": "A2"})
        );
    }

    #[test]
    fn test_id_is_always_present() {
        let current = object(json!({"id": 9, "title": "Same"}));
        let update = object(json!({"title": "Same"}));

        let patch = build_update_patch(9, &update, &current, COLLECTIONS);
        assert!(patch.is_empty());
        assert_eq!(patch.to_value().unwrap(), json!({"id": 9}));
    }

    #[test]
    fn test_list_order_is_significant() {
        let current = object(json!({"submitter_ids": [1, 2]}));
        let update = object(json!({"submitter_ids": [2, 1]}));

        let patch = build_update_patch(1, &update, &current, COLLECTIONS);
        assert_eq!(patch.get("submitter_ids"), Some(&json!([2, 1])));
    }

    #[test]
    fn test_nested_key_order_is_significant() {
        let current = object(serde_json::from_str(r#"{"amendment_paragraph": {"1": "a", "2": "b"}}"#).unwrap());
        let update = object(serde_json::from_str(r#"{"amendment_paragraph": {"2": "b", "1": "a"}}"#).unwrap());

        let patch = build_update_patch(1, &update, &current, COLLECTIONS);
        assert!(patch.get("amendment_paragraph").is_some());
    }

    #[test]
    fn test_missing_current_field_counts_as_absent() {
        let current = object(json!({"id": 1}));
        let update = object(json!({"reason": null, "category_id": 4}));

        let patch = build_update_patch(1, &update, &current, COLLECTIONS);
        assert_eq!(patch.get("reason"), Some(&Value::Null));
        assert_eq!(patch.get("category_id"), Some(&json!(4)));
    }

    #[test]
    fn test_cleared_collections_become_empty_lists() {
        let current = object(json!({
            "supporter_ids": [4], "tag_ids": [1], "attachment_ids": null, "submitter_ids": [2]
        }));
        let update = object(json!({
            "supporter_ids": null, "tag_ids": null, "attachment_ids": null, "submitter_ids": null
        }));

        let patch = build_update_patch(1, &update, &current, COLLECTIONS);
        assert_eq!(patch.get("supporter_ids"), Some(&json!([])));
        assert_eq!(patch.get("tag_ids"), Some(&json!([])));
        // Unchanged, so not forced into the patch
        assert_eq!(patch.get("attachment_ids"), None);
        // Not a designated collection field
        assert_eq!(patch.get("submitter_ids"), Some(&Value::Null));
    }

    #[test]
    fn test_non_object_input_is_rejected() {
        let result = diff_objects(1, &json!([1]), &json!({"id": 1}), COLLECTIONS, "motion update");
        assert!(matches!(result, Err(ListError::NotAnObject("motion update"))));
    }
}
