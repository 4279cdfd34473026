use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;

use super::KeyValueStore;
use super::error::StorageResult;
use super::types::{KvEntry, KvWrite, ensure_valid_batch, ensure_valid_key};

/// Process-local store. Batches swap in a whole new map, so readers never
/// observe half of a batch.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: ArcSwap<BTreeMap<String, KvEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_entry(&self, key: &str) -> StorageResult<Option<KvEntry>> {
        ensure_valid_key(key, "memory-get")?;
        Ok(self.entries.load().get(key).cloned())
    }

    fn apply_batch(&self, writes: Vec<KvWrite>) -> StorageResult<()> {
        ensure_valid_batch(&writes, "memory-apply-batch")?;
        if writes.is_empty() {
            return Ok(());
        }

        let now = unix_timestamp_seconds();
        self.entries.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            for write in &writes {
                match write {
                    KvWrite::Put { key, value } => {
                        next.insert(
                            key.clone(),
                            KvEntry {
                                key: key.clone(),
                                value: value.clone(),
                                updated_at_unix_seconds: now,
                            },
                        );
                    }
                    KvWrite::Delete { key } => {
                        next.remove(key);
                    }
                }
            }
            Arc::new(next)
        });

        tracing::trace!(write_count = writes.len(), "memory storage batch applied");
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.load().keys().cloned().collect())
    }
}

fn unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}
