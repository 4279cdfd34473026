use snafu::ensure;

use super::error::{EmptyKeySnafu, StorageResult};

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Put { key: String, value: String },
    Delete { key: String },
}

impl KvWrite {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Stored value plus the time it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub updated_at_unix_seconds: u64,
}

pub(crate) fn ensure_valid_key(key: &str, stage: &'static str) -> StorageResult<()> {
    ensure!(!key.trim().is_empty(), EmptyKeySnafu { stage });
    Ok(())
}

pub(crate) fn ensure_valid_batch(writes: &[KvWrite], stage: &'static str) -> StorageResult<()> {
    for write in writes {
        ensure_valid_key(write.key(), stage)?;
    }
    Ok(())
}
