use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::Result;
use crate::model::ReferenceSnapshot;

/// Keyed persistence of active filter selections.
///
/// Values are stored as raw JSON so that a partially malformed entry can
/// still be restored property by property.
#[async_trait::async_trait]
pub trait FilterStateStore: Send + Sync {
    /// Stored state for a key, `None` if nothing was saved yet
    async fn load(&self, key: &str) -> Result<Option<Value>>;
    /// Replace the stored state for a key
    async fn save(&self, key: &str, state: &Value) -> Result<()>;
}

/// A collection of related entities (meetings, committees) that can be observed
pub trait ReferenceSource: Send + Sync {
    /// Start observing; the current contents are delivered first, followed
    /// by one snapshot per change, in order.
    fn observe(&self) -> UnboundedReceiver<ReferenceSnapshot>;
}
