use crate::record::types::Record;
use crate::store::storage::{Storage, StorageError};
use log::{info, warn};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Key under which the collection is stored unless configured otherwise.
pub const DEFAULT_STORE_KEY: &str = "librolog_books";

/// Key-value JSON file, the collection living under a single key.
///
/// Other keys in the same file are left untouched when the collection is saved. Writes go to a
/// sibling temporary file first and are then renamed over the original.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    key: String,
}

impl JsonFileStorage {
    #[must_use]
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, DEFAULT_STORE_KEY)
    }

    #[must_use]
    #[inline]
    pub fn with_key(path: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            path: path.into(),
            key: key.to_owned(),
        }
    }

    #[must_use]
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Option<Map<String, Value>>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(entries) => Ok(Some(entries)),
            _ => Err(StorageError::Shape(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn temporary_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonFileStorage {
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per load"
    )]
    fn load(&self) -> Result<Option<Vec<Record>>, StorageError> {
        let Some(mut entries) = self.read_entries()? else {
            info!("No store file at {}", self.path.display());
            return Ok(None);
        };
        entries
            .remove(&self.key)
            .map(serde_json::from_value::<Vec<Record>>)
            .transpose()
            .map_err(StorageError::from)
    }

    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per write"
    )]
    fn save(&mut self, records: &[Record]) -> Result<(), StorageError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => {
                warn!(
                    "Overwriting unreadable store file {}: {err}",
                    self.path.display()
                );
                Map::new()
            }
        };
        entries.insert(self.key.clone(), serde_json::to_value(records)?);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temporary = self.temporary_path();
        let contents = serde_json::to_vec_pretty(&Value::Object(entries))?;
        fs::write(&temporary, contents)?;
        fs::rename(&temporary, &self.path)?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::record::rating::Rating;
    use chrono::{Days, NaiveDate};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn book(id: &str, title: &str, started: NaiveDate) -> Record {
        Record::new(id.into(), title.into(), started, started)
    }

    fn sample() -> Vec<Record> {
        let mut dune = book("a", "Dune", date(2024, 3, 1))
            .with_end_date(date(2024, 3, 10))
            .with_rating(Rating::new(4).unwrap())
            .with_quotes(vec!["Fear is the mind-killer.".into()])
            .with_image_url("https://covers.example/dune.jpg");
        dune.description = Some("Politics and ecology on a desert planet.".into());
        dune.category = Some("Science Fiction".into());

        vec![
            dune,
            book("b", "Piranesi", date(2024, 3, 6)).with_review("Strange and lovely"),
        ]
    }

    fn well_formed_record() -> impl Strategy<Value = Record> {
        let text = || proptest::option::of("[A-Za-z][A-Za-z ]{0,15}");
        (
            "[A-Za-z][A-Za-z ]{0,15}",
            0_u64..3000,
            0_u64..60,
            proptest::option::of((0_u64..60, proptest::option::of(1_u8..=5))),
            (text(), text(), text(), text()),
            proptest::collection::vec("[A-Za-z][A-Za-z .]{0,20}", 0..3),
        )
            .prop_map(|(title, start, logged, end, annotations, quotes)| {
                let base = date(2020, 1, 1);
                let start_date = base + Days::new(start);
                let mut record = Record::new(
                    String::new(),
                    title,
                    start_date + Days::new(logged),
                    start_date,
                )
                .with_quotes(quotes);
                if let Some((length, rating)) = end {
                    record.end_date = Some(start_date + Days::new(length));
                    record.rating = rating.and_then(Rating::new);
                }
                let (image_url, review, description, category) = annotations;
                record.image_url = image_url;
                record.review = review;
                record.description = description;
                record.category = category;
                record
            })
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("librolog.json"));

        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonFileStorage::new(dir.path().join("nested").join("librolog.json"));

        storage.save(&sample()).unwrap();

        assert_eq!(storage.load().unwrap(), Some(sample()));
        assert!(!storage.temporary_path().exists());
    }

    #[test]
    fn other_keys_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("librolog.json");
        fs::write(&path, r#"{"theme": "dark", "librolog_books": []}"#).unwrap();
        let mut storage = JsonFileStorage::new(&path);

        storage.save(&sample()).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["theme"], Value::from("dark"));
        assert_eq!(written["librolog_books"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn absent_key_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("librolog.json");
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        assert!(JsonFileStorage::new(&path).load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("librolog.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFileStorage::new(&path).load(),
            Err(StorageError::Json(_))
        ));
    }

    #[test]
    fn corrupt_file_is_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("librolog.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let mut storage = JsonFileStorage::with_key(&path, "books");

        assert!(matches!(storage.load(), Err(StorageError::Shape(_))));
        storage.save(&sample()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample()));
    }

    proptest! {
        #[test]
        fn any_collection_survives_save_and_load(records in proptest::collection::vec(well_formed_record(), 0..8)) {
            let records = records
                .into_iter()
                .enumerate()
                .map(|(index, mut record)| {
                    record.id = format!("r{index}");
                    record
                })
                .collect::<Vec<Record>>();
            let dir = tempfile::tempdir().unwrap();
            let mut storage = JsonFileStorage::new(dir.path().join("librolog.json"));

            storage.save(&records).unwrap();

            prop_assert_eq!(storage.load().unwrap(), Some(records));
        }
    }
}
