use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::canonical_json;

/// A filterable property together with its selectable conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub property: String,
    pub label: String,
    pub options: Vec<FilterOption>,
}

impl FilterDefinition {
    /// Build a definition, dropping options whose condition repeats an earlier one
    pub fn new(property: impl Into<String>, label: impl Into<String>, options: Vec<FilterOption>) -> Self {
        let mut definition = Self {
            property: property.into(),
            label: label.into(),
            options: Vec::with_capacity(options.len()),
        };
        for option in options {
            if !definition.has_condition(&option.condition) {
                definition.options.push(option);
            }
        }
        definition
    }

    /// Two-option definition over a boolean field
    pub fn boolean(
        property: impl Into<String>,
        label: impl Into<String>,
        when_true: impl Into<String>,
        when_false: impl Into<String>,
    ) -> Self {
        Self::new(
            property,
            label,
            vec![
                FilterOption::new(Value::Bool(true), when_true),
                FilterOption::new(Value::Bool(false), when_false),
            ],
        )
    }

    pub fn has_condition(&self, condition: &Value) -> bool {
        self.options
            .iter()
            .any(|option| same_condition(&option.condition, condition))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Scalar to compare against, or a related entity id; `null` is the "none" sentinel
    pub condition: Value,
    pub label: OptionLabel,
}

impl FilterOption {
    pub fn new(condition: Value, label: impl Into<String>) -> Self {
        Self {
            condition,
            label: OptionLabel::Text(label.into()),
        }
    }

    pub fn counted(condition: Value, one: impl Into<String>, other: impl Into<String>) -> Self {
        Self {
            condition,
            label: OptionLabel::Counted {
                one: one.into(),
                other: other.into(),
            },
        }
    }

    pub fn is_none_sentinel(&self) -> bool {
        self.condition.is_null()
    }
}

/// Display label of a filter option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionLabel {
    Text(String),
    /// Label chosen by the number of matching entities; `{count}` is substituted
    Counted { one: String, other: String },
}

impl OptionLabel {
    pub fn resolve(&self, count: usize) -> String {
        match self {
            OptionLabel::Text(text) => text.clone(),
            OptionLabel::Counted { one, other } => {
                let template = if count == 1 { one } else { other };
                template.replace("{count}", &count.to_string())
            }
        }
    }
}

/// Conditions compare by their serialized form, so `1` and `1.0` are distinct
pub fn same_condition(a: &Value, b: &Value) -> bool {
    canonical_json(a) == canonical_json(b)
}

/// Currently selected conditions per property.
///
/// A property with no entry, or an empty list, excludes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveFilterState {
    selections: BTreeMap<String, Vec<Value>>,
}

impl ActiveFilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conditions(&self, property: &str) -> &[Value] {
        self.selections
            .get(property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, property: &str, condition: &Value) -> bool {
        self.conditions(property)
            .iter()
            .any(|active| same_condition(active, condition))
    }

    /// Add the condition if absent, remove it if present
    pub fn toggle(&mut self, property: &str, condition: Value) {
        let entry = self.selections.entry(property.to_string()).or_default();
        match entry.iter().position(|active| same_condition(active, &condition)) {
            Some(index) => {
                entry.remove(index);
            }
            None => entry.push(condition),
        }
        if entry.is_empty() {
            self.selections.remove(property);
        }
    }

    /// Replace the selection of one property; an empty list clears it
    pub fn set(&mut self, property: &str, conditions: Vec<Value>) {
        let mut unique: Vec<Value> = Vec::with_capacity(conditions.len());
        for condition in conditions {
            if !unique.iter().any(|c| same_condition(c, &condition)) {
                unique.push(condition);
            }
        }
        if unique.is_empty() {
            self.selections.remove(property);
        } else {
            self.selections.insert(property.to_string(), unique);
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<Vec<Value>> {
        self.selections.remove(property)
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    /// Properties that currently exclude entities
    pub fn active_properties(&self) -> impl Iterator<Item = (&String, &Vec<Value>)> {
        self.selections.iter().filter(|(_, conditions)| !conditions.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.active_properties().next().is_none()
    }

    /// Total number of selected conditions across all properties
    pub fn condition_count(&self) -> usize {
        self.selections.values().map(Vec::len).sum()
    }

    /// Leniently read stored state.
    ///
    /// Properties whose value is not a list of conditions are skipped and
    /// returned by name; anything that is not an object yields empty state.
    pub fn from_persisted(value: &Value) -> (Self, Vec<String>) {
        let mut state = Self::new();
        let mut skipped = Vec::new();
        let Some(object) = value.as_object() else {
            if !value.is_null() {
                skipped.push("<root>".to_string());
            }
            return (state, skipped);
        };
        for (property, conditions) in object {
            match conditions.as_array() {
                Some(conditions) => state.set(property, conditions.clone()),
                None => skipped.push(property.clone()),
            }
        }
        (state, skipped)
    }

    pub fn to_persisted(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_drops_duplicate_conditions() {
        let definition = FilterDefinition::new(
            "state_id",
            "State",
            vec![
                FilterOption::new(json!(1), "submitted"),
                FilterOption::new(json!(1), "submitted again"),
                FilterOption::new(json!(2), "accepted"),
            ],
        );
        assert_eq!(definition.options.len(), 2);
        assert_eq!(definition.options[0].label, OptionLabel::Text("submitted".to_string()));
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut state = ActiveFilterState::new();
        state.toggle("is_active", json!(true));
        assert!(state.contains("is_active", &json!(true)));

        state.toggle("is_active", json!(true));
        assert!(!state.contains("is_active", &json!(true)));
        assert!(state.is_empty());
        assert_eq!(state, ActiveFilterState::new());
    }

    #[test]
    fn test_set_with_empty_list_clears_property() {
        let mut state = ActiveFilterState::new();
        state.set("committee_ids", vec![json!(5), json!(5), json!(null)]);
        assert_eq!(state.conditions("committee_ids"), &[json!(5), json!(null)]);

        state.set("committee_ids", vec![]);
        assert!(state.conditions("committee_ids").is_empty());
        assert!(state.is_empty());
    }

    #[test]
    fn test_counted_label_resolution() {
        let option = FilterOption::counted(json!(3), "{count} motion", "{count} motions");
        assert_eq!(option.label.resolve(1), "1 motion");
        assert_eq!(option.label.resolve(4), "4 motions");
        assert_eq!(OptionLabel::Text("Tag".to_string()).resolve(9), "Tag");
    }

    #[test]
    fn test_state_serializes_as_plain_map() {
        let mut state = ActiveFilterState::new();
        state.set("committee_ids", vec![json!(5)]);
        state.set("is_active", vec![json!(false)]);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json, json!({"committee_ids": [5], "is_active": [false]}));

        let parsed: ActiveFilterState = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_from_persisted_skips_malformed_properties() {
        let stored = json!({
            "committee_ids": [5],
            "is_active": "yes",
            "meeting_ids": []
        });
        let (state, skipped) = ActiveFilterState::from_persisted(&stored);

        assert_eq!(state.conditions("committee_ids"), &[json!(5)]);
        assert!(state.conditions("meeting_ids").is_empty());
        assert_eq!(skipped, vec!["is_active".to_string()]);

        let (state, skipped) = ActiveFilterState::from_persisted(&json!([1, 2]));
        assert!(state.is_empty());
        assert_eq!(skipped.len(), 1);
    }
}
