use serde::{Deserialize, Serialize};

use crate::model::Id;

/// A related entity that can appear as a dynamic filter option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: Id,
    pub name: String,
}

impl ReferenceRecord {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Full contents of a reference collection at one point in time.
///
/// Revisions increase with every change of the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    pub revision: u64,
    pub records: Vec<ReferenceRecord>,
}
