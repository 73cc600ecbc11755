//! Status counters over a record collection.
use crate::record::types::Record;
use serde::Serialize;

/// Number of books the sidebar lists as currently being read.
pub const CURRENTLY_READING_LIMIT: usize = 3;

/// Aggregate counts. `completed + in_progress == total` always holds.
#[non_exhaustive]
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

impl Summary {
    #[must_use]
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per render"
    )]
    pub fn of(records: &[Record]) -> Self {
        let completed = records.iter().filter(|record| record.is_finished()).count();
        Self {
            total: records.len(),
            completed,
            in_progress: records.len().saturating_sub(completed),
        }
    }
}

/// First `limit` in-progress records, in collection order.
#[must_use]
#[allow(
    clippy::missing_inline_in_public_items,
    reason = "Called once per render"
)]
pub fn currently_reading(records: &[Record], limit: usize) -> Vec<&Record> {
    records
        .iter()
        .filter(|record| !record.is_finished())
        .take(limit)
        .collect()
}

/// Titles of every in-progress record, used to seed recommendations.
#[must_use]
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn in_progress_titles(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter(|record| !record.is_finished())
        .map(|record| record.title.clone())
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn collection(finished: &[bool]) -> Vec<Record> {
        finished
            .iter()
            .enumerate()
            .map(|(index, &done)| {
                let record = Record::new(
                    index.to_string(),
                    format!("Book {index}"),
                    date(2024, 3, 5),
                    date(2024, 3, 1),
                );
                if done {
                    record.with_end_date(date(2024, 3, 1) + Days::new(3))
                } else {
                    record
                }
            })
            .collect()
    }

    #[test]
    fn empty_collection() {
        assert_eq!(Summary::of(&[]), Summary::default());
    }

    #[test]
    fn counts_by_status() {
        let records = collection(&[true, false, false, true, false]);
        assert_eq!(
            Summary::of(&records),
            Summary {
                total: 5,
                completed: 2,
                in_progress: 3
            }
        );
    }

    #[test]
    fn currently_reading_is_capped_and_ordered() {
        let records = collection(&[false, true, false, false, false]);

        let titles = currently_reading(&records, CURRENTLY_READING_LIMIT)
            .into_iter()
            .map(|record| record.title.as_str())
            .collect::<Vec<&str>>();

        assert_eq!(titles, vec!["Book 0", "Book 2", "Book 3"]);
    }

    #[test]
    fn in_progress_titles_skip_finished() {
        let records = collection(&[true, false]);
        assert_eq!(in_progress_titles(&records), vec![String::from("Book 1")]);
    }

    proptest! {
        #[test]
        fn counts_partition_the_collection(finished in proptest::collection::vec(any::<bool>(), 0..64)) {
            let summary = Summary::of(&collection(&finished));
            prop_assert_eq!(summary.completed + summary.in_progress, summary.total);
            prop_assert_eq!(summary.total, finished.len());
            prop_assert_eq!(summary.completed, finished.iter().filter(|&&done| done).count());
        }
    }
}
