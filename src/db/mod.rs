use anyhow::Result;

mod connection;
mod memory;
mod migrations;

pub use connection::SqliteStore;
pub use memory::MemoryStore;

/// Minimal string key/value persistence used by the history store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}
