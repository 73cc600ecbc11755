//! Runtime configuration, read from the environment (optionally populated from `.env`).
use librolog_core::enrichment::gemini::{DEFAULT_LANGUAGE, DEFAULT_MODEL};
use librolog_core::enrichment::{EnrichmentError, GeminiClient};
use librolog_core::store::JsonFileStorage;
use librolog_core::store::json_file::DEFAULT_STORE_KEY;
use std::path::PathBuf;

pub const DATA_FILE_VAR: &str = "LIBROLOG_DATA_FILE";
pub const STORE_KEY_VAR: &str = "LIBROLOG_STORE_KEY";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "LIBROLOG_GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "LIBROLOG_GEMINI_BASE_URL";
pub const LANGUAGE_VAR: &str = "LIBROLOG_RESPONSE_LANGUAGE";

pub const DEFAULT_DATA_FILE: &str = "librolog.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_file: PathBuf,
    pub store_key: String,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            store_key: DEFAULT_STORE_KEY.to_owned(),
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            base_url: None,
            language: DEFAULT_LANGUAGE.to_owned(),
        }
    }
}

impl Config {
    /// Reads the process environment. Unset or blank variables fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            data_file: get(DATA_FILE_VAR).map_or(defaults.data_file, PathBuf::from),
            store_key: get(STORE_KEY_VAR).unwrap_or(defaults.store_key),
            api_key: get(API_KEY_VAR),
            model: get(MODEL_VAR).unwrap_or(defaults.model),
            base_url: get(BASE_URL_VAR),
            language: get(LANGUAGE_VAR).unwrap_or(defaults.language),
        }
    }

    /// Replaces the data file, used for the `--data-file` flag.
    #[must_use]
    pub fn with_data_file(mut self, data_file: Option<PathBuf>) -> Self {
        if let Some(path) = data_file {
            self.data_file = path;
        }
        self
    }

    #[must_use]
    pub fn storage(&self) -> JsonFileStorage {
        JsonFileStorage::with_key(&self.data_file, &self.store_key)
    }

    /// The configured enrichment client, or `None` when no API key is set.
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn enricher(&self) -> Result<Option<GeminiClient>, EnrichmentError> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };

        let mut client = GeminiClient::new(api_key)?
            .with_model(&self.model)
            .with_language(&self.language);
        if let Some(base_url) = &self.base_url {
            client = client.with_base_url(base_url);
        }
        Ok(Some(client))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use librolog_core::record::types::Record;
    use librolog_core::store::RecordStore;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars = vars
            .iter()
            .map(|&(name, value)| (name.to_owned(), value.to_owned()))
            .collect::<HashMap<String, String>>();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]);

        assert_eq!(config, Config::default());
        assert_eq!(config.store_key, "librolog_books");
        assert!(config.enricher().unwrap().is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let config = config_from(&[
            (DATA_FILE_VAR, "/tmp/books.json"),
            (STORE_KEY_VAR, "books"),
            (API_KEY_VAR, "secret"),
            (MODEL_VAR, "gemini-test"),
            (LANGUAGE_VAR, "Korean"),
        ]);

        assert_eq!(config.data_file, PathBuf::from("/tmp/books.json"));
        assert_eq!(config.store_key, "books");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.enricher().unwrap().unwrap().model(), "gemini-test");
        assert_eq!(config.language, "Korean");
    }

    #[test]
    fn blank_api_key_disables_enrichment() {
        let config = config_from(&[(API_KEY_VAR, "  ")]);
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn storage_uses_configured_file_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        let config = Config::default().with_data_file(Some(path.clone()));
        let config = Config {
            store_key: "shelf".to_owned(),
            ..config
        };

        let mut store = RecordStore::open(config.storage());
        store
            .create(Record::new(
                String::new(),
                "Dune".to_owned(),
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["shelf"][0]["title"], "Dune");
        assert_eq!(RecordStore::open(config.storage()).records().len(), 1);
    }

    #[test]
    fn flag_wins_over_environment() {
        let config = config_from(&[(DATA_FILE_VAR, "env.json")])
            .with_data_file(Some(PathBuf::from("flag.json")));
        assert_eq!(config.data_file, PathBuf::from("flag.json"));

        let untouched = config_from(&[(DATA_FILE_VAR, "env.json")]).with_data_file(None);
        assert_eq!(untouched.data_file, PathBuf::from("env.json"));
    }
}
