use std::sync::Arc;

use log::warn;
use thiserror::Error;

use crate::db::KeyValueStore;
use crate::models::SessionRecord;

pub const HISTORY_KEY: &str = "jwalk_history";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history unreadable: {0:#}")]
    Unreadable(anyhow::Error),

    #[error("history write failed: {0:#}")]
    WriteFailed(anyhow::Error),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Append-only, newest-first log of past walks. The whole list is rewritten on
/// every append.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, HISTORY_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn list_all(&self) -> HistoryResult<Vec<SessionRecord>> {
        let raw = self
            .store
            .get(&self.key)
            .map_err(HistoryError::Unreadable)?;

        match raw {
            Some(data) => serde_json::from_str(&data)
                .map_err(|err| HistoryError::Unreadable(anyhow::Error::new(err))),
            None => Ok(Vec::new()),
        }
    }

    /// Like [`list_all`](Self::list_all) but treats unreadable history as empty.
    pub fn list_or_empty(&self) -> Vec<SessionRecord> {
        self.list_all().unwrap_or_else(|err| {
            warn!("{err}; showing empty history");
            Vec::new()
        })
    }

    pub fn append(&self, record: SessionRecord) -> HistoryResult<()> {
        // Existing unreadable data is left untouched rather than overwritten.
        let mut history = self.list_all()?;
        history.insert(0, record);

        let serialized = serde_json::to_string(&history)
            .map_err(|err| HistoryError::WriteFailed(anyhow::Error::new(err)))?;
        self.store
            .set(&self.key, &serialized)
            .map_err(HistoryError::WriteFailed)
    }
}
