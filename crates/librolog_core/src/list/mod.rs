//! List view
//!
//! Filters the collection by reading status and a free-text query, and keeps the multi-select
//! state used for bulk deletion. Filtering never reorders: the result follows store order.
//!
//! Changing the filter or the query clears the selection, so a bulk action can only ever hit
//! records that are currently visible.
use crate::record::types::{ReadingStatus, Record};
use crate::store::{RecordStore, Storage, StoreError};
use core::fmt;
use core::str::FromStr;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Finished,
    Reading,
}

impl StatusFilter {
    #[must_use]
    #[inline]
    pub fn accepts(self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Finished => record.status() == ReadingStatus::Finished,
            Self::Reading => record.status() == ReadingStatus::Reading,
        }
    }

    #[must_use]
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Finished => "finished",
            Self::Reading => "reading",
        }
    }
}

impl fmt::Display for StatusFilter {
    #[inline]
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status filter {0:?}, expected all, finished or reading")]
pub struct ParseStatusFilterError(pub String);

impl FromStr for StatusFilter {
    type Err = ParseStatusFilterError;

    #[inline]
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "finished" => Ok(Self::Finished),
            "reading" => Ok(Self::Reading),
            _ => Err(ParseStatusFilterError(raw.to_owned())),
        }
    }
}

/// Case-insensitive substring match on title and review. An empty query matches everything.
#[must_use]
#[allow(clippy::missing_inline_in_public_items, reason = "Called per record")]
pub fn matches_query(record: &Record, query: &str) -> bool {
    let needle = query.to_lowercase();
    record.title.to_lowercase().contains(&needle)
        || record
            .review
            .as_deref()
            .is_some_and(|review| review.to_lowercase().contains(&needle))
}

/// Records passing both the status filter and the query, in collection order.
#[must_use]
#[allow(
    clippy::missing_inline_in_public_items,
    reason = "Called once per render"
)]
pub fn filter_records<'a>(
    records: &'a [Record],
    filter: StatusFilter,
    query: &str,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| filter.accepts(record) && matches_query(record, query))
        .collect()
}

/// Ids marked for a bulk action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `id`, leaving every other id alone.
    #[inline]
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_owned());
        }
    }

    /// Clears the selection if it is exactly the (non-empty) visible set, otherwise selects
    /// exactly the visible set.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn toggle_all(&mut self, visible: &[&Record]) {
        if self.covers_exactly(visible) {
            self.ids.clear();
        } else {
            self.ids = visible.iter().map(|record| record.id.clone()).collect();
        }
    }

    /// `true` when the selection equals the visible set and that set is not empty. Drives the
    /// "select all" checkbox.
    #[must_use]
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per render"
    )]
    pub fn covers_exactly(&self, visible: &[&Record]) -> bool {
        !visible.is_empty()
            && self.ids.len() == visible.len()
            && visible.iter().all(|record| self.ids.contains(&record.id))
    }

    #[must_use]
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    #[inline]
    pub const fn ids(&self) -> &HashSet<String> {
        &self.ids
    }
}

/// State of the list screen: active filter, query and selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListView {
    filter: StatusFilter,
    query: String,
    selection: Selection,
}

impl ListView {
    #[must_use]
    #[inline]
    pub fn new(filter: StatusFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    #[must_use]
    #[inline]
    pub const fn filter(&self) -> StatusFilter {
        self.filter
    }

    #[must_use]
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    #[inline]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Switches the status filter. Clears the selection if the filter actually changes.
    #[inline]
    pub fn set_filter(&mut self, filter: StatusFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.selection.clear();
        }
    }

    /// Replaces the search query. Clears the selection if the query actually changes.
    #[inline]
    pub fn set_query(&mut self, query: &str) {
        if self.query != query {
            query.clone_into(&mut self.query);
            self.selection.clear();
        }
    }

    #[must_use]
    #[inline]
    pub fn visible<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        filter_records(records, self.filter, &self.query)
    }

    #[inline]
    pub fn toggle(&mut self, id: &str) {
        self.selection.toggle(id);
    }

    #[inline]
    pub fn toggle_all(&mut self, records: &[Record]) {
        let visible = self.visible(records);
        self.selection.toggle_all(&visible);
    }

    #[must_use]
    #[inline]
    pub fn is_all_selected(&self, records: &[Record]) -> bool {
        self.selection.covers_exactly(&self.visible(records))
    }

    /// Deletes every selected record from `store` and clears the selection.
    /// # Errors
    /// Fails if the store cannot persist the deletion. The selection is cleared either way.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn delete_selected<S: Storage>(
        &mut self,
        store: &mut RecordStore<S>,
    ) -> Result<usize, StoreError> {
        let selected = core::mem::take(&mut self.selection);
        info!("Deleting {} selected records", selected.len());
        store.delete_many(selected.ids())
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
    use crate::store::MemoryStorage;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn entry(id: &str, title: &str, logged: NaiveDate, started: NaiveDate) -> Record {
        Record::new(id.into(), title.into(), logged, started)
    }

    fn library() -> Vec<Record> {
        vec![
            entry("1", "Dune", date(2024, 3, 5), date(2024, 3, 1))
                .with_end_date(date(2024, 3, 10))
                .with_rating(Rating::new(5).unwrap()),
            entry("2", "Dune Messiah", date(2024, 3, 12), date(2024, 3, 12)),
            entry("3", "Children of Time", date(2024, 3, 14), date(2024, 3, 2))
                .with_end_date(date(2024, 3, 14))
                .with_review("Better than DUNE, honestly"),
            entry("4", "Emma", date(2024, 3, 20), date(2024, 3, 18))
                .with_end_date(date(2024, 3, 25)),
        ]
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|record| record.id.clone()).collect()
    }

    #[test]
    fn empty_query_matches_all() {
        let records = library();
        assert_eq!(filter_records(&records, StatusFilter::All, "").len(), 4);
    }

    #[test]
    fn status_filters() {
        let records = library();
        assert_eq!(
            ids(&filter_records(&records, StatusFilter::Finished, "")),
            vec!["1", "3", "4"]
        );
        assert_eq!(
            ids(&filter_records(&records, StatusFilter::Reading, "")),
            vec!["2"]
        );
    }

    #[test]
    fn query_is_case_insensitive_over_title_and_review() {
        let records = library();
        assert_eq!(
            ids(&filter_records(&records, StatusFilter::All, "dUnE")),
            vec!["1", "2", "3"]
        );
        assert_eq!(
            ids(&filter_records(&records, StatusFilter::Finished, "dune")),
            vec!["1", "3"]
        );
        assert!(filter_records(&records, StatusFilter::All, "tolkien").is_empty());
    }

    #[test]
    fn parses_filter_names() {
        assert_eq!(
            "Finished".parse::<StatusFilter>(),
            Ok(StatusFilter::Finished)
        );
        assert_eq!(
            " reading ".parse::<StatusFilter>(),
            Ok(StatusFilter::Reading)
        );
        assert!("done".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn toggle_touches_only_one_id() {
        let mut selection = Selection::new();
        selection.toggle("1");
        selection.toggle("2");
        selection.toggle("1");

        assert!(!selection.contains("1"));
        assert!(selection.contains("2"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn toggle_all_selects_visible_then_clears() {
        let records = library();
        let mut view = ListView::new(StatusFilter::Finished);

        view.toggle_all(&records);
        assert!(view.is_all_selected(&records));
        assert_eq!(view.selection().len(), 3);

        view.toggle_all(&records);
        assert!(view.selection().is_empty());
    }

    #[test]
    fn toggle_all_replaces_partial_selection() {
        let records = library();
        let mut view = ListView::new(StatusFilter::All);
        view.toggle("2");

        view.toggle_all(&records);

        assert_eq!(view.selection().len(), 4);
    }

    #[test]
    fn toggle_all_on_empty_view_selects_nothing() {
        let records = library();
        let mut view = ListView::new(StatusFilter::All);
        view.set_query("no such book");

        view.toggle_all(&records);
        view.toggle_all(&records);

        assert!(view.selection().is_empty());
        assert!(!view.is_all_selected(&records));
    }

    #[test]
    fn changing_filter_or_query_clears_selection() {
        let records = library();
        let mut view = ListView::new(StatusFilter::All);
        view.toggle_all(&records);

        view.set_filter(StatusFilter::All);
        assert_eq!(view.selection().len(), 4);

        view.set_filter(StatusFilter::Reading);
        assert!(view.selection().is_empty());

        view.toggle("2");
        view.set_query("messiah");
        assert!(view.selection().is_empty());
    }

    #[test]
    fn delete_selected_removes_exactly_the_match() {
        let mut store = RecordStore::open(MemoryStorage::new());
        for record in library() {
            store.create(record).unwrap();
        }
        let mut view = ListView::new(StatusFilter::Finished);
        view.set_query("dune");
        assert_eq!(ids(&view.visible(store.records())), vec!["1", "3"]);

        view.toggle("3");
        let removed = view.delete_selected(&mut store).unwrap();

        assert_eq!(removed, 1);
        assert!(store.get("3").is_none());
        assert_eq!(store.records().len(), 3);
        assert!(view.selection().is_empty());
    }

    proptest! {
        #[test]
        fn filtering_is_deterministic(query in "[a-zA-Z ]{0,6}", finished_only in any::<bool>()) {
            let records = library();
            let filter = if finished_only { StatusFilter::Finished } else { StatusFilter::All };

            let first = ids(&filter_records(&records, filter, &query));
            let second = ids(&filter_records(&records, filter, &query));

            prop_assert_eq!(first, second);
        }

        #[test]
        fn toggle_all_twice_restores_empty_or_full_selection(start_full in any::<bool>(), reading in any::<bool>()) {
            let records = library();
            let filter = if reading { StatusFilter::Reading } else { StatusFilter::All };
            let mut view = ListView::new(filter);
            if start_full {
                view.toggle_all(&records);
            }
            let before = view.selection().clone();

            view.toggle_all(&records);
            view.toggle_all(&records);

            prop_assert_eq!(view.selection(), &before);
        }
    }
}
