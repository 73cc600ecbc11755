use crate::record::types::Record;
use crate::store::storage::{Storage, StorageError};

/// Keeps the serialized snapshot in memory. Goes through the same JSON encoding as the file
/// backend, which makes it usable as a test double for corrupt or foreign snapshots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    snapshot: Option<String>,
    saves: usize,
}

impl MemoryStorage {
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            snapshot: None,
            saves: 0,
        }
    }

    /// Starts from a raw snapshot, which does not have to be valid.
    #[must_use]
    #[inline]
    pub fn with_snapshot(raw: &str) -> Self {
        Self {
            snapshot: Some(raw.to_owned()),
            saves: 0,
        }
    }

    #[must_use]
    #[inline]
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Number of successful saves so far.
    #[must_use]
    #[inline]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl Storage for MemoryStorage {
    #[inline]
    fn load(&self) -> Result<Option<Vec<Record>>, StorageError> {
        self.snapshot
            .as_deref()
            .map(serde_json::from_str::<Vec<Record>>)
            .transpose()
            .map_err(StorageError::from)
    }

    #[inline]
    fn save(&mut self, records: &[Record]) -> Result<(), StorageError> {
        self.snapshot = Some(serde_json::to_string(records)?);
        self.saves = self.saves.saturating_add(1);
        Ok(())
    }
}
