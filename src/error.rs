use thiserror::Error;

/// Errors produced by the list and payload core
#[derive(Debug, Error)]
pub enum ListError {
    /// A filter state store could not read or write a key
    #[error("filter state store failed for key '{key}': {message}")]
    Store { key: String, message: String },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A meeting setting carried a value this crate does not understand
    #[error("invalid value '{value}' for setting '{setting}'")]
    InvalidSetting { setting: String, value: String },

    /// A payload was expected to serialize to a JSON object
    #[error("expected a JSON object for {0}")]
    NotAnObject(&'static str),

    /// An engine was registered for one entity type and requested as another
    #[error("filter engine '{storage_key}' holds a different entity type")]
    EngineTypeMismatch { storage_key: String },

    /// Persisted state is keyed by storage key alone, so one key serves one entity type
    #[error("storage key '{storage_key}' is used by '{existing}', cannot reuse it for '{entity_type}'")]
    StorageKeyConflict {
        storage_key: String,
        entity_type: String,
        existing: String,
    },
}

impl ListError {
    pub fn store(key: &str, err: impl std::fmt::Display) -> Self {
        ListError::Store {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ListError>;
