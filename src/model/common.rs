use serde_json::{Map, Value};

pub type Id = u64;

/// A record the list core can read fields from.
///
/// Entities are owned by the caller; filters and sorters only read them.
pub trait Entity {
    fn id(&self) -> Id;

    /// Value of the named field, `None` when the entity has no such field
    fn field(&self, name: &str) -> Option<Value>;
}

impl Entity for Value {
    fn id(&self) -> Id {
        self.get("id").and_then(Value::as_u64).unwrap_or_default()
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Entity for Map<String, Value> {
    fn id(&self) -> Id {
        self.get("id").and_then(Value::as_u64).unwrap_or_default()
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Whether a field value counts as "set" under loose truthiness:
/// absent, `null`, `false`, `0` and `""` are all unset.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Canonical serialized form used for deep value comparison.
///
/// Object keys keep their insertion order, so two objects with the same
/// entries in a different order are not equal.
pub fn canonical_json(value: &Value) -> String {
    // Serializing a `Value` cannot fail: all keys are strings
    serde_json::to_string(value).unwrap_or_default()
}

/// Convert a list of ids into a JSON array
pub fn ids_to_value(ids: &[Id]) -> Value {
    Value::Array(ids.iter().map(|id| Value::from(*id)).collect())
}
