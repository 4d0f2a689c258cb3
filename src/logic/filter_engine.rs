use itertools::Itertools;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{
    same_condition, ActiveFilterState, Entity, FilterDefinition, FilterOption, ReferenceRecord,
    ReferenceSnapshot,
};
use crate::store::{FilterStatePersister, FilterStateStore};

/// Engine shared between its owner and the tasks feeding it reference data
pub type SharedFilterEngine<E> = Arc<parking_lot::Mutex<FilterEngine<E>>>;

/// A definition whose options come from a reference collection
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicFilterSpec {
    pub property: String,
    /// Label of the option matching entities without any related id
    pub none_label: String,
}

impl DynamicFilterSpec {
    pub fn new(property: impl Into<String>, none_label: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            none_label: none_label.into(),
        }
    }
}

/// Describes the filters available for one entity type
pub trait FilterProvider: Send + Sync {
    /// Key the active selection is persisted under
    fn storage_key(&self) -> &str;

    /// All definitions in display order; dynamic ones start without options
    fn filter_definitions(&self) -> Vec<FilterDefinition>;

    /// Which of the definitions are rebuilt from reference data
    fn dynamic_filters(&self) -> Vec<DynamicFilterSpec> {
        Vec::new()
    }
}

/// Number of entities an option currently matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCount {
    pub property: String,
    pub condition: Value,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
struct DynamicFilter {
    none_label: String,
    /// Revision of the last applied snapshot, `None` until the first one of
    /// the current source
    revision: Option<u64>,
    /// Bumped whenever a new source is bound; revisions compare within one
    epoch: u64,
}

/// Build the options of a reference-driven definition: one per related
/// entity, in the order delivered, plus a single trailing "none" sentinel.
pub fn reference_options(records: &[ReferenceRecord], none_label: &str) -> Vec<FilterOption> {
    records
        .iter()
        .unique_by(|record| record.id)
        .map(|record| FilterOption::new(Value::from(record.id), record.name.clone()))
        .chain(std::iter::once(FilterOption::new(Value::Null, none_label)))
        .collect()
}

/// Whether an entity field satisfies one condition.
///
/// Collection fields match by membership and match the `null` sentinel when
/// empty. A missing field behaves like `null` and only matches the sentinel.
pub fn condition_matches(field: Option<&Value>, condition: &Value) -> bool {
    match field {
        Some(Value::Array(items)) => {
            if condition.is_null() {
                items.is_empty()
            } else {
                items.iter().any(|item| same_condition(item, condition))
            }
        }
        None | Some(Value::Null) => condition.is_null(),
        Some(value) => same_condition(value, condition),
    }
}

/// Whether an entity passes every active property of a selection
pub fn entity_matches<E: Entity>(entity: &E, active: &ActiveFilterState) -> bool {
    active.active_properties().all(|(property, conditions)| {
        let field = entity.field(property);
        conditions
            .iter()
            .any(|condition| condition_matches(field.as_ref(), condition))
    })
}

/// Active filter selections for one list plus the filtered view of it
pub struct FilterEngine<E> {
    storage_key: String,
    definitions: Vec<FilterDefinition>,
    dynamic: HashMap<String, DynamicFilter>,
    active: ActiveFilterState,
    source: Vec<E>,
    filtered: Vec<E>,
    persister: FilterStatePersister,
}

impl<E: Entity + Clone> FilterEngine<E> {
    /// Create an engine and restore its persisted selection.
    ///
    /// A store error or malformed entries degrade to "no filter" for the
    /// affected properties and are logged.
    pub async fn load(
        provider: &dyn FilterProvider,
        store: &dyn FilterStateStore,
        persister: FilterStatePersister,
    ) -> Self {
        let mut engine = Self::new(provider, persister);
        match store.load(&engine.storage_key).await {
            Ok(Some(stored)) => engine.restore(&stored),
            Ok(None) => {}
            Err(e) => warn!(
                "Could not load filter state '{}', starting unfiltered: {}",
                engine.storage_key, e
            ),
        }
        engine
    }

    /// Create an engine with no active filters
    pub fn new(provider: &dyn FilterProvider, persister: FilterStatePersister) -> Self {
        let dynamic = provider
            .dynamic_filters()
            .into_iter()
            .map(|spec| {
                (
                    spec.property,
                    DynamicFilter {
                        none_label: spec.none_label,
                        revision: None,
                        epoch: 0,
                    },
                )
            })
            .collect();
        Self {
            storage_key: provider.storage_key().to_string(),
            definitions: provider.filter_definitions(),
            dynamic,
            active: ActiveFilterState::new(),
            source: Vec::new(),
            filtered: Vec::new(),
            persister,
        }
    }

    fn restore(&mut self, stored: &Value) {
        let (restored, malformed) = ActiveFilterState::from_persisted(stored);
        for property in malformed {
            warn!(
                "Dropping malformed filter state '{}' in '{}'",
                property, self.storage_key
            );
        }

        for (property, conditions) in restored.active_properties() {
            let Some(definition) = self.definition(property) else {
                warn!(
                    "Dropping filter state for unknown property '{}' in '{}'",
                    property, self.storage_key
                );
                continue;
            };
            // Dynamic options are unknown until the first snapshot; that rebuild prunes
            let awaiting_options = self
                .dynamic
                .get(property)
                .map(|dynamic| dynamic.revision.is_none())
                .unwrap_or(false);
            if !awaiting_options && !conditions.iter().all(|c| definition.has_condition(c)) {
                warn!(
                    "Dropping filter state for '{}' in '{}': unknown condition",
                    property, self.storage_key
                );
                continue;
            }
            self.active.set(property, conditions.clone());
        }
        self.refresh();
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Static and reference-driven definitions in display order
    pub fn filter_definitions(&self) -> &[FilterDefinition] {
        &self.definitions
    }

    pub fn definition(&self, property: &str) -> Option<&FilterDefinition> {
        self.definitions.iter().find(|d| d.property == property)
    }

    pub fn active_state(&self) -> &ActiveFilterState {
        &self.active
    }

    pub fn is_active(&self, property: &str, condition: &Value) -> bool {
        self.active.contains(property, condition)
    }

    pub fn has_active_filters(&self) -> bool {
        !self.active.is_empty()
    }

    /// Number of selected conditions across all properties
    pub fn active_count(&self) -> usize {
        self.active.condition_count()
    }

    /// Select the condition if it is not selected, otherwise deselect it
    pub fn toggle_filter(&mut self, property: &str, condition: Value) {
        if self.definition(property).is_none() {
            debug!("Toggling filter on undeclared property '{}'", property);
        }
        self.active.toggle(property, condition);
        self.on_state_changed();
    }

    /// Replace the selection of one property; an empty list clears it
    pub fn set_filter(&mut self, property: &str, conditions: Vec<Value>) {
        self.active.set(property, conditions);
        self.on_state_changed();
    }

    /// Deactivate every property
    pub fn clear_all(&mut self) {
        self.active.clear();
        self.on_state_changed();
    }

    /// Entities passing every active property, in input order
    pub fn filter(&self, entities: &[E]) -> Vec<E> {
        entities
            .iter()
            .filter(|entity| entity_matches(*entity, &self.active))
            .cloned()
            .collect()
    }

    /// Replace the input list and recompute the view
    pub fn set_source(&mut self, entities: Vec<E>) {
        self.source = entities;
        self.refresh();
    }

    pub fn source(&self) -> &[E] {
        &self.source
    }

    /// Filtered view of the current input list
    pub fn filtered(&self) -> &[E] {
        &self.filtered
    }

    /// How many of the given entities each option would match on its own
    pub fn option_counts(&self, entities: &[E]) -> Vec<OptionCount> {
        let mut counts = Vec::new();
        for definition in &self.definitions {
            let fields: Vec<Option<Value>> = entities
                .iter()
                .map(|entity| entity.field(&definition.property))
                .collect();
            for option in &definition.options {
                let count = fields
                    .iter()
                    .filter(|field| condition_matches(field.as_ref(), &option.condition))
                    .count();
                counts.push(OptionCount {
                    property: definition.property.clone(),
                    condition: option.condition.clone(),
                    label: option.label.resolve(count),
                    count,
                });
            }
        }
        counts
    }

    /// Start a new source for a reference-driven definition.
    ///
    /// Each source numbers its revisions on its own, so the applied revision
    /// is forgotten. Returns the epoch snapshots of that source must carry,
    /// or `None` for a property that is not reference-driven.
    pub fn begin_reference_source(&mut self, property: &str) -> Option<u64> {
        let dynamic = self.dynamic.get_mut(property)?;
        dynamic.epoch += 1;
        dynamic.revision = None;
        debug!(
            "New reference source for '{}' in '{}' (epoch {})",
            property, self.storage_key, dynamic.epoch
        );
        Some(dynamic.epoch)
    }

    /// Rebuild from a snapshot of the source started at `epoch`; snapshots
    /// of a replaced source are ignored
    pub fn rebuild_reference_from(
        &mut self,
        property: &str,
        epoch: u64,
        snapshot: &ReferenceSnapshot,
    ) -> bool {
        let replaced = self
            .dynamic
            .get(property)
            .map(|dynamic| dynamic.epoch != epoch)
            .unwrap_or(false);
        if replaced {
            debug!(
                "Ignoring snapshot {} of replaced source for '{}'",
                snapshot.revision, property
            );
            return false;
        }
        self.rebuild_reference(property, snapshot)
    }

    /// Rebuild a reference-driven definition from a snapshot.
    ///
    /// Options are replaced, never merged. Snapshots not newer than the
    /// last applied one are ignored. Selected ids that disappeared are
    /// deselected. Returns whether the snapshot was applied.
    pub fn rebuild_reference(&mut self, property: &str, snapshot: &ReferenceSnapshot) -> bool {
        let Some(dynamic) = self.dynamic.get_mut(property) else {
            warn!(
                "No reference-driven filter '{}' in '{}'",
                property, self.storage_key
            );
            return false;
        };
        if let Some(applied) = dynamic.revision {
            if snapshot.revision <= applied {
                debug!(
                    "Ignoring stale snapshot {} for '{}' (applied {})",
                    snapshot.revision, property, applied
                );
                return false;
            }
        }
        dynamic.revision = Some(snapshot.revision);
        let options = reference_options(&snapshot.records, &dynamic.none_label);

        let Some(definition) = self.definitions.iter_mut().find(|d| d.property == property) else {
            return false;
        };
        definition.options = options;
        debug!(
            "Rebuilt filter '{}' in '{}' with {} options (revision {})",
            property,
            self.storage_key,
            definition.options.len(),
            snapshot.revision
        );

        let selected = self.active.conditions(property).to_vec();
        let kept: Vec<Value> = selected
            .iter()
            .filter(|condition| definition.has_condition(condition))
            .cloned()
            .collect();
        if kept.len() != selected.len() {
            debug!(
                "Deselecting {} stale condition(s) of '{}'",
                selected.len() - kept.len(),
                property
            );
            self.active.set(property, kept);
            self.on_state_changed();
        } else {
            self.refresh();
        }
        true
    }

    /// Handle to the writer this engine persists through
    pub fn persister(&self) -> FilterStatePersister {
        self.persister.clone()
    }

    fn on_state_changed(&mut self) {
        self.refresh();
        self.persister
            .save(&self.storage_key, self.active.to_persisted());
    }

    fn refresh(&mut self) {
        self.filtered = self.filter(&self.source);
    }
}

impl<E> std::fmt::Debug for FilterEngine<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("storage_key", &self.storage_key)
            .field("active", &self.active)
            .field("source_len", &self.source.len())
            .field("filtered_len", &self.filtered.len())
            .finish()
    }
}
