use crate::record::types::Record;

/// Durable backend of the record store: one snapshot holding the whole collection.
pub trait Storage {
    /// Reads the persisted snapshot. `Ok(None)` means nothing has been saved yet.
    /// # Errors
    /// Fails if the snapshot cannot be read or parsed.
    fn load(&self) -> Result<Option<Vec<Record>>, StorageError>;

    /// Replaces the persisted snapshot with `records`.
    /// # Errors
    /// Fails if the snapshot cannot be serialized or written.
    fn save(&mut self, records: &[Record]) -> Result<(), StorageError>;
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot has an unexpected shape: {0}")]
    Shape(String),
}
