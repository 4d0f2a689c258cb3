use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::Result;
use crate::model::{ReferenceRecord, ReferenceSnapshot};
use crate::store::{FilterStateStore, ReferenceSource};

/// Filter state kept in process memory only
#[derive(Debug, Default)]
pub struct MemoryFilterStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key, e.g. with state restored from elsewhere
    pub fn insert(&self, key: &str, state: Value) {
        self.entries.write().insert(key.to_string(), state);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait::async_trait]
impl FilterStateStore for MemoryFilterStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, state: &Value) -> Result<()> {
        self.insert(key, state.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CollectionState {
    revision: u64,
    records: Vec<ReferenceRecord>,
    observers: Vec<UnboundedSender<ReferenceSnapshot>>,
}

impl CollectionState {
    fn snapshot(&self) -> ReferenceSnapshot {
        ReferenceSnapshot {
            revision: self.revision,
            records: self.records.clone(),
        }
    }
}

/// In-memory reference collection that pushes a snapshot to every observer on change
#[derive(Debug, Default)]
pub struct ReferenceCollection {
    state: Mutex<CollectionState>,
}

impl ReferenceCollection {
    pub fn new(records: Vec<ReferenceRecord>) -> Self {
        Self {
            state: Mutex::new(CollectionState {
                revision: 1,
                records,
                observers: Vec::new(),
            }),
        }
    }

    /// Replace the whole collection and notify observers
    pub fn replace(&self, records: Vec<ReferenceRecord>) {
        self.modify(|current| *current = records);
    }

    /// Insert or rename one record and notify observers
    pub fn upsert(&self, record: ReferenceRecord) {
        self.modify(|records| {
            match records.iter_mut().find(|existing| existing.id == record.id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        });
    }

    pub fn remove(&self, id: crate::model::Id) {
        self.modify(|records| records.retain(|record| record.id != id));
    }

    /// Change, bump and broadcast under one lock so concurrent edits never
    /// overwrite each other
    fn modify(&self, change: impl FnOnce(&mut Vec<ReferenceRecord>)) {
        let mut state = self.state.lock();
        change(&mut state.records);
        state.revision += 1;
        let snapshot = state.snapshot();
        // Observers whose receiver was dropped are forgotten
        state
            .observers
            .retain(|observer| observer.send(snapshot.clone()).is_ok());
    }

    pub fn records(&self) -> Vec<ReferenceRecord> {
        self.state.lock().records.clone()
    }
}

impl ReferenceSource for ReferenceCollection {
    fn observe(&self) -> UnboundedReceiver<ReferenceSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        if tx.send(state.snapshot()).is_ok() {
            state.observers.push(tx);
        }
        rx
    }
}
