pub mod error;
pub mod memory;
pub mod sqlite;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use types::{KvEntry, KvWrite};

/// String-keyed durable store, the local-storage equivalent for this app.
///
/// `apply_batch` is all-or-nothing on every backend, so callers that keep
/// related records under separate keys can update them together.
pub trait KeyValueStore: Send + Sync {
    fn get_entry(&self, key: &str) -> StorageResult<Option<KvEntry>>;
    fn apply_batch(&self, writes: Vec<KvWrite>) -> StorageResult<()>;
    fn keys(&self) -> StorageResult<Vec<String>>;

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.get_entry(key)?.map(|entry| entry.value))
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        self.apply_batch(vec![KvWrite::put(key, value)])
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.apply_batch(vec![KvWrite::delete(key)])
    }
}
