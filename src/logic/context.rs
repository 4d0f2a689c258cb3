use log::{debug, warn};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::error::{ListError, Result};
use crate::logic::{FilterEngine, FilterProvider, SharedFilterEngine};
use crate::model::{Entity, ReferenceSnapshot};
use crate::store::{FilterStatePersister, FilterStateStore, ReferenceSource};

type EngineKey = (String, String);

/// Owns one filter engine per (entity type, storage key) pair.
///
/// All engines share one store and one persistence writer.
pub struct FilterContext {
    store: Arc<dyn FilterStateStore>,
    persister: FilterStatePersister,
    engines: Mutex<HashMap<EngineKey, Arc<dyn Any + Send + Sync>>>,
}

impl FilterContext {
    /// Must be called inside a tokio runtime; starts the persistence writer
    pub fn new(store: Arc<dyn FilterStateStore>) -> Self {
        let persister = FilterStatePersister::spawn(store.clone());
        Self {
            store,
            persister,
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// Engine for an entity type, created and restored on first request
    pub async fn engine<E>(
        &self,
        entity_type: &str,
        provider: &dyn FilterProvider,
    ) -> Result<SharedFilterEngine<E>>
    where
        E: Entity + Clone + Send + 'static,
    {
        let key = (entity_type.to_string(), provider.storage_key().to_string());
        let existing = {
            let engines = self.engines.lock();
            check_storage_key(&engines, &key)?;
            engines.get(&key).cloned()
        };
        let entry = match existing {
            Some(entry) => entry,
            None => {
                let engine: SharedFilterEngine<E> = Arc::new(Mutex::new(
                    FilterEngine::load(provider, self.store.as_ref(), self.persister.clone()).await,
                ));
                debug!("Created filter engine {:?}", key);
                // Another caller may have created it while we were loading
                let engine: Arc<dyn Any + Send + Sync> = engine;
                let mut engines = self.engines.lock();
                check_storage_key(&engines, &key)?;
                engines.entry(key.clone()).or_insert(engine).clone()
            }
        };
        entry
            .downcast::<Mutex<FilterEngine<E>>>()
            .map_err(|_| ListError::EngineTypeMismatch {
                storage_key: key.1,
            })
    }

    /// Wait for every queued filter state write
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    /// Keep a reference-driven definition in sync with a source
    pub fn bind_reference<E>(
        &self,
        engine: SharedFilterEngine<E>,
        property: &str,
        source: &dyn ReferenceSource,
    ) -> JoinHandle<()>
    where
        E: Entity + Clone + Send + 'static,
    {
        bind_reference(engine, property.to_string(), source.observe())
    }
}

/// A storage key may back engines of one entity type only
fn check_storage_key(
    engines: &HashMap<EngineKey, Arc<dyn Any + Send + Sync>>,
    key: &EngineKey,
) -> Result<()> {
    let (entity_type, storage_key) = key;
    match engines
        .keys()
        .find(|(other_type, other_key)| other_key == storage_key && other_type != entity_type)
    {
        Some((existing, _)) => Err(ListError::StorageKeyConflict {
            storage_key: storage_key.clone(),
            entity_type: entity_type.clone(),
            existing: existing.clone(),
        }),
        None => Ok(()),
    }
}

impl std::fmt::Debug for FilterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FilterContext")
            .field("engines", &self.engines.lock().len())
            .finish()
    }
}

/// Apply reference snapshots to an engine, one at a time, in delivery order.
///
/// Binding replaces any earlier source of the property: its revisions start
/// over and snapshots still arriving from the old source are ignored. The
/// task ends when the sending side is dropped.
pub fn bind_reference<E>(
    engine: SharedFilterEngine<E>,
    property: String,
    mut updates: UnboundedReceiver<ReferenceSnapshot>,
) -> JoinHandle<()>
where
    E: Entity + Clone + Send + 'static,
{
    let epoch = engine.lock().begin_reference_source(&property);
    tokio::spawn(async move {
        let Some(epoch) = epoch else {
            warn!("No reference-driven filter '{}' to bind", property);
            return;
        };
        while let Some(snapshot) = updates.recv().await {
            engine
                .lock()
                .rebuild_reference_from(&property, epoch, &snapshot);
        }
        debug!("Reference binding for '{}' closed", property);
    })
}
