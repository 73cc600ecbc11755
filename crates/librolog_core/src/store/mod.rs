//! Record store
//!
//! `RecordStore` owns the authoritative collection and writes the whole collection through to its
//! [`Storage`] after every mutation. Storage backends are injected, see [`JsonFileStorage`] and
//! [`MemoryStorage`].
//!
//! A snapshot that cannot be read or parsed is treated as an empty collection. The next mutation
//! then overwrites it, so a corrupt file loses its data at that point.
pub mod json_file;
pub mod memory;
pub mod storage;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use storage::{Storage, StorageError};

use crate::record::types::Record;
use crate::summary::Summary;
use log::{info, warn};
use std::collections::HashSet;
use uuid::Uuid;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The in-memory collection was changed, but persisting it failed.
    #[error("failed to persist records: {0}")]
    Storage(#[from] StorageError),

    #[error("record with id {0} already exists")]
    DuplicateId(String),
}

pub struct RecordStore<S: Storage> {
    storage: S,
    records: Vec<Record>,
}

impl<S: Storage> RecordStore<S> {
    /// Opens the store and loads the persisted collection, falling back to an empty one.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once at start of program"
    )]
    pub fn open(storage: S) -> Self {
        let records = load_or_empty(&storage);
        Self { storage, records }
    }

    /// Re-reads the persisted snapshot, discarding the in-memory collection.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn reload(&mut self) -> &[Record] {
        self.records = load_or_empty(&self.storage);
        &self.records
    }

    /// Current collection in insertion order.
    #[must_use]
    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    #[inline]
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    #[must_use]
    #[inline]
    pub fn summary(&self) -> Summary {
        Summary::of(&self.records)
    }

    #[must_use]
    #[inline]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes the current collection to storage, replacing whatever was there.
    /// # Errors
    /// Fails if the storage backend fails.
    #[inline]
    pub fn save(&mut self) -> Result<(), StoreError> {
        self.storage.save(&self.records)?;
        Ok(())
    }

    /// Appends a record and returns its id. A record without id gets a fresh one.
    ///
    /// The title is not validated here, that is the job of the editor (see
    /// [`crate::record::draft::RecordDraft::into_record`]).
    /// # Errors
    /// Fails if the given id is already taken, or if persisting fails. In the latter case the
    /// record stays in the in-memory collection.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per write"
    )]
    pub fn create(&mut self, record: Record) -> Result<String, StoreError> {
        let mut record = record.normalized();
        if record.id.is_empty() {
            record.id = self.fresh_id();
        } else if self.get(&record.id).is_some() {
            return Err(StoreError::DuplicateId(record.id));
        }
        if record.has_inverted_period() {
            warn!("Record {} ends before it starts", record.id);
        }

        let id = record.id.clone();
        info!("Creating record {id}");
        self.records.push(record);
        self.save()?;
        Ok(id)
    }

    /// Replaces the record with the same id wholesale. Returns `false`, without touching storage,
    /// if no such record exists.
    /// # Errors
    /// Fails if persisting fails.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per write"
    )]
    pub fn update(&mut self, record: Record) -> Result<bool, StoreError> {
        let Some(slot) = self.records.iter_mut().find(|slot| slot.id == record.id) else {
            info!("Ignoring update of unknown record {}", record.id);
            return Ok(false);
        };
        *slot = record.normalized();
        if slot.has_inverted_period() {
            warn!("Record {} ends before it starts", slot.id);
        }

        info!("Updated record {}", slot.id);
        self.save()?;
        Ok(true)
    }

    /// Removes the record with `id`. Unknown ids are ignored.
    /// # Errors
    /// Fails if persisting fails.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per write"
    )]
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        if self.records.len() == before {
            return Ok(false);
        }

        info!("Deleted record {id}");
        self.save()?;
        Ok(true)
    }

    /// Removes every record whose id is in `ids` and returns how many were removed.
    /// # Errors
    /// Fails if persisting fails.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per write"
    )]
    pub fn delete_many(&mut self, ids: &HashSet<String>) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records.retain(|record| !ids.contains(&record.id));
        let removed = before.saturating_sub(self.records.len());
        if removed == 0 {
            return Ok(0);
        }

        info!("Deleted {removed} records");
        self.save()?;
        Ok(removed)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

fn load_or_empty<S: Storage>(storage: &S) -> Vec<Record> {
    match storage.load() {
        Ok(Some(records)) => {
            info!("Loaded {} records", records.len());
            sanitize(records)
        }
        Ok(None) => {
            info!("No saved records yet, starting empty");
            Vec::new()
        }
        Err(err) => {
            warn!("Saved records are unreadable, starting empty; next save overwrites them: {err}");
            Vec::new()
        }
    }
}

/// Applies the record invariants to a loaded collection. Blank or repeated ids get a fresh id so
/// no record shadows another; the first record keeps a contested id.
fn sanitize(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .map(|record| {
            let mut record = record.normalized();
            if record.id.is_empty() || seen.contains(&record.id) {
                let fresh = loop {
                    let id = Uuid::new_v4().simple().to_string();
                    if !seen.contains(&id) {
                        break id;
                    }
                };
                warn!(
                    "Record {:?} has a blank or repeated id, renamed to {fresh}",
                    record.id
                );
                record.id = fresh;
            }
            seen.insert(record.id.clone());
            record
        })
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::record::rating::Rating;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record(id: &str, title: &str) -> Record {
        Record::new(id.into(), title.into(), date(2024, 3, 5), date(2024, 3, 1))
    }

    fn ids(store: &RecordStore<MemoryStorage>) -> Vec<&str> {
        store
            .records()
            .iter()
            .map(|stored| stored.id.as_str())
            .collect()
    }

    #[test]
    fn empty_storage_opens_empty() {
        let store = RecordStore::open(MemoryStorage::new());
        assert!(store.records().is_empty());
    }

    #[test]
    fn corrupt_snapshot_degrades_to_empty_collection() {
        let store = RecordStore::open(MemoryStorage::with_snapshot("{\"oops\":"));
        assert!(store.records().is_empty());
    }

    #[test]
    fn corrupt_snapshot_is_lost_on_next_write() {
        let mut store = RecordStore::open(MemoryStorage::with_snapshot("not json"));

        store.create(record("a", "Dune")).unwrap();

        let persisted: Vec<Record> =
            serde_json::from_str(store.storage().snapshot().unwrap()).unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[test]
    fn loaded_snapshot_is_normalized_and_ids_made_unique() {
        let snapshot = r#"[
            {"id":"a","title":"Dune","startDate":"2024-03-01","logDate":"2024-03-05",
             "endDate":null,"rating":5,"quotes":["", "  "]},
            {"id":"a","title":"Emma","startDate":"2024-03-02","logDate":"2024-03-05","quotes":[]},
            {"id":"","title":"Persuasion","startDate":"2024-03-03","logDate":"2024-03-05","quotes":[]}
        ]"#;
        let mut store = RecordStore::open(MemoryStorage::with_snapshot(snapshot));

        let unique = store
            .records()
            .iter()
            .map(|stored| stored.id.clone())
            .collect::<HashSet<String>>();
        let dune = store.get("a").unwrap();
        assert_eq!(unique.len(), 3);
        assert!(!unique.contains(""));
        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.rating, None);
        assert!(dune.quotes.is_empty());

        let mut emma = store.records().get(1).unwrap().clone();
        emma.title = "Emma (edited)".to_owned();
        assert!(store.update(emma).unwrap());

        let titles = store
            .records()
            .iter()
            .map(|stored| stored.title.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(titles, vec!["Dune", "Emma (edited)", "Persuasion"]);
    }

    #[test]
    fn create_assigns_missing_id_and_persists() {
        let mut store = RecordStore::open(MemoryStorage::new());

        let id = store.create(record("", "Dune")).unwrap();

        assert!(!id.is_empty());
        assert_eq!(
            store.get(&id).map(|stored| stored.title.as_str()),
            Some("Dune")
        );
        assert_eq!(store.storage().saves(), 1);
        assert_eq!(store.storage().load().unwrap().unwrap(), store.records());
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut store = RecordStore::open(MemoryStorage::new());
        let generated = (0..50)
            .map(|_| store.create(record("", "Dune")).unwrap())
            .collect::<HashSet<String>>();

        assert_eq!(generated.len(), 50);
    }

    #[test]
    fn create_keeps_given_id_and_rejects_duplicates() {
        let mut store = RecordStore::open(MemoryStorage::new());
        store.create(record("a", "Dune")).unwrap();

        let duplicate = store.create(record("a", "Dune Messiah"));

        assert!(matches!(duplicate, Err(StoreError::DuplicateId(id)) if id == "a"));
        assert_eq!(ids(&store), vec!["a"]);
    }

    #[test]
    fn create_enforces_rating_rule() {
        let mut store = RecordStore::open(MemoryStorage::new());

        store
            .create(record("a", "Dune").with_rating(Rating::new(5).unwrap()))
            .unwrap();

        assert_eq!(store.get("a").unwrap().rating, None);
    }

    #[test]
    fn update_replaces_wholesale() {
        let mut store = RecordStore::open(MemoryStorage::new());
        store
            .create(record("a", "Dune").with_review("slow start"))
            .unwrap();

        let replaced = store
            .update(
                record("a", "Dune")
                    .with_end_date(date(2024, 3, 10))
                    .with_rating(Rating::new(4).unwrap()),
            )
            .unwrap();

        let stored = store.get("a").unwrap();
        assert!(replaced);
        assert_eq!(stored.review, None);
        assert_eq!(stored.rating, Rating::new(4));
        assert_eq!(store.storage().saves(), 2);
    }

    #[test]
    fn update_of_unknown_id_is_a_silent_no_op() {
        let mut store = RecordStore::open(MemoryStorage::new());
        store.create(record("a", "Dune")).unwrap();
        let before = store.records().to_vec();

        let replaced = store.update(record("zzz", "Ghost")).unwrap();

        assert!(!replaced);
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(store.storage().saves(), 1);
    }

    #[test]
    fn delete_by_id() {
        let mut store = RecordStore::open(MemoryStorage::new());
        store.create(record("a", "Dune")).unwrap();
        store.create(record("b", "Emma")).unwrap();

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert_eq!(ids(&store), vec!["b"]);
    }

    #[test]
    fn delete_many_equals_repeated_delete() {
        let mut bulk = RecordStore::open(MemoryStorage::new());
        let mut single = RecordStore::open(MemoryStorage::new());
        for id in ["a", "b", "c", "d"] {
            bulk.create(record(id, "Dune")).unwrap();
            single.create(record(id, "Dune")).unwrap();
        }
        let doomed = ["b", "d", "x"]
            .into_iter()
            .map(String::from)
            .collect::<HashSet<String>>();

        let removed = bulk.delete_many(&doomed).unwrap();
        for id in &doomed {
            single.delete(id).unwrap();
        }

        assert_eq!(removed, 2);
        assert_eq!(ids(&bulk), vec!["a", "c"]);
        assert_eq!(bulk.records(), single.records());
    }

    #[test]
    fn reopen_sees_persisted_collection() {
        let mut store = RecordStore::open(MemoryStorage::new());
        store.create(record("a", "Dune")).unwrap();
        store.create(record("b", "Emma")).unwrap();

        let reopened = RecordStore::open(store.storage().clone());

        assert_eq!(reopened.records(), store.records());
    }

    #[test]
    fn reload_discards_unsaved_state() {
        let mut store = RecordStore::open(MemoryStorage::with_snapshot("[]"));
        store.create(record("a", "Dune")).unwrap();

        assert_eq!(store.reload().len(), 1);
    }

    #[test]
    fn summary_counts() {
        let mut store = RecordStore::open(MemoryStorage::new());
        store.create(record("a", "Dune")).unwrap();
        store
            .create(record("b", "Emma").with_end_date(date(2024, 3, 9)))
            .unwrap();

        let summary = store.summary();
        assert_eq!(
            (summary.total, summary.completed, summary.in_progress),
            (2, 1, 1)
        );
    }
}
