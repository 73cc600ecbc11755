//! Command handlers. Each handler works on an open [`RecordStore`] and returns the text to print.
mod browse;
mod insights;
mod records;

use crate::cli::Command;
use crate::errors::Error;
use chrono::NaiveDate;
use librolog_core::enrichment::Enricher;
use librolog_core::record::types::Record;
use librolog_core::store::{RecordStore, Storage};
use std::io;

/// Asks the user a yes/no question.
pub type Confirm<'a> = dyn FnMut(&str) -> io::Result<bool> + 'a;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub const fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

fn encode_records(records: &[&Record]) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub async fn execute<S: Storage, E: Enricher + Sync>(
    command: Command,
    store: &mut RecordStore<S>,
    enricher: &E,
    today: NaiveDate,
    format: Format,
    confirm: &mut Confirm<'_>,
) -> Result<String, Error> {
    match command {
        Command::Add(args) => records::add(store, enricher, args, today, format).await,
        Command::Edit(args) => records::edit(store, enricher, args, format).await,
        Command::Show { id } => records::show(store, &id, format),
        Command::Delete { id } => records::delete(store, &id),
        Command::Day { date } => records::day(store, date, format),
        Command::List(args) => browse::list(store, &args, format, confirm),
        Command::Calendar(args) => Ok(browse::calendar(store, &args, today)),
        Command::Summary => insights::summary(store, format),
        Command::Recommend => Ok(insights::recommend(store, enricher).await),
        Command::Enrich => insights::enrich(store, enricher).await,
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
pub mod testing {
    use core::future::Future;
    use librolog_core::enrichment::{BookDetails, Enricher, Recommendation};
    use librolog_core::record::types::Record;
    use librolog_core::store::{MemoryStorage, RecordStore};

    pub fn date(year: i32, month: u32, day: u32) -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn book(title: &str, logged: chrono::NaiveDate, started: chrono::NaiveDate) -> Record {
        Record::new(String::new(), title.to_owned(), logged, started)
    }

    /// Dune (finished), Emma and Persuasion (both in progress), logged in March 2024.
    pub fn seeded_store() -> RecordStore<MemoryStorage> {
        let mut store = RecordStore::open(MemoryStorage::new());
        let records = [
            book("Dune", date(2024, 3, 5), date(2024, 3, 1)).with_end_date(date(2024, 3, 10)),
            book("Emma", date(2024, 3, 6), date(2024, 3, 2)),
            book("Persuasion", date(2024, 3, 7), date(2024, 3, 3)),
        ];
        for record in records {
            store.create(record).unwrap();
        }
        store
    }

    /// Answers every lookup from the title alone.
    pub struct CannedEnricher;

    impl Enricher for CannedEnricher {
        fn lookup_book_details(
            &self,
            title: &str,
        ) -> impl Future<Output = Option<BookDetails>> + Send {
            let details = BookDetails::new(
                format!("About {}", title.trim()),
                "Fiction".to_owned(),
                Some(format!("https://covers.example/{}.jpg", title.trim().to_lowercase())),
            );
            async move { Some(details) }
        }

        fn daily_recommendation(
            &self,
            in_progress_titles: &[String],
        ) -> impl Future<Output = Option<Recommendation>> + Send {
            let seed = in_progress_titles.join(", ");
            async move {
                Some(Recommendation::new(
                    "Hyperion".to_owned(),
                    "Dan Simmons".to_owned(),
                    format!("Because you read {seed}"),
                    "Science Fiction".to_owned(),
                ))
            }
        }
    }
}
