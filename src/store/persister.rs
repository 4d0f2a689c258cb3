use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

use crate::store::FilterStateStore;

enum PersistCommand {
    Save { key: String, state: Value },
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget writer for filter state.
///
/// Saves are queued on an unbounded channel and applied by a single task in
/// the order they were queued, so the last queued state for a key wins.
/// A failed save is logged and never reported back to the caller.
#[derive(Clone)]
pub struct FilterStatePersister {
    tx: UnboundedSender<PersistCommand>,
}

impl FilterStatePersister {
    /// Start the writer task on the current tokio runtime
    pub fn spawn(store: Arc<dyn FilterStateStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(store, rx));
        Self { tx }
    }

    /// Queue a save; returns immediately
    pub fn save(&self, key: &str, state: Value) {
        let command = PersistCommand::Save {
            key: key.to_string(),
            state,
        };
        if self.tx.send(command).is_err() {
            warn!("Filter state writer has stopped, state for '{}' not saved", key);
        }
    }

    /// Wait until every save queued before this call has been attempted
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PersistCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

impl std::fmt::Debug for FilterStatePersister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FilterStatePersister")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

async fn run_writer(store: Arc<dyn FilterStateStore>, mut rx: UnboundedReceiver<PersistCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            PersistCommand::Save { key, state } => {
                if let Err(e) = store.save(&key, &state).await {
                    warn!("Failed to persist filter state '{}': {}", key, e);
                }
            }
            PersistCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Filter state writer stopped");
}
