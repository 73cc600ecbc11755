use crate::enrichment::BookDetails;
use crate::record::rating::{Rating, RatingError};
use crate::record::types::Record;
use chrono::NaiveDate;

/// Editable form state of a record, before it is handed to the store.
///
/// Text fields are plain strings here (an empty string means "not filled in") and `quotes` keeps
/// blank slots the user has not typed into yet. [`RecordDraft::into_record`] turns the draft into
/// a [`Record`] and applies the write-time rules.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    /// `Some` when editing an existing record, `None` for a new one.
    pub id: Option<String>,
    pub title: String,
    pub image_url: String,
    pub rating: Option<Rating>,
    pub log_date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub review: String,
    pub quotes: Vec<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("a record needs a title")]
    EmptyTitle,

    #[error(transparent)]
    Rating(#[from] RatingError),
}

impl RecordDraft {
    /// A blank draft anchored on `date`: logged and started on that day, one empty quote slot.
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            id: None,
            title: String::new(),
            image_url: String::new(),
            rating: None,
            log_date: date,
            start_date: date,
            end_date: None,
            review: String::new(),
            quotes: vec![String::new()],
            description: None,
            category: None,
        }
    }

    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn from_record(record: &Record) -> Self {
        let quotes = if record.quotes.is_empty() {
            vec![String::new()]
        } else {
            record.quotes.clone()
        };

        Self {
            id: Some(record.id.clone()),
            title: record.title.clone(),
            image_url: record.image_url.clone().unwrap_or_default(),
            rating: record.rating,
            log_date: record.log_date,
            start_date: record.start_date,
            end_date: record.end_date,
            review: record.review.clone().unwrap_or_default(),
            quotes,
            description: record.description.clone(),
            category: record.category.clone(),
        }
    }

    /// Sets the rating from a raw star count, `None` clears it.
    /// # Errors
    /// Fails if the value is outside of `1..=5`.
    #[inline]
    pub fn set_rating(&mut self, stars: Option<u8>) -> Result<(), DraftError> {
        self.rating = stars.map(Rating::try_from).transpose()?;
        Ok(())
    }

    #[inline]
    pub fn add_quote(&mut self) {
        self.quotes.push(String::new());
    }

    /// Overwrites the quote slot at `index`. Out-of-range indices are ignored.
    #[inline]
    pub fn set_quote(&mut self, index: usize, text: &str) {
        if let Some(slot) = self.quotes.get_mut(index) {
            text.clone_into(slot);
        }
    }

    /// Removes the quote slot at `index`, but never the last remaining slot.
    #[inline]
    pub fn remove_quote(&mut self, index: usize) {
        if self.quotes.len() > 1 && index < self.quotes.len() {
            self.quotes.remove(index);
        }
    }

    /// Copies looked-up details into the draft. The cover is only replaced when the lookup
    /// returned one.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub fn apply_details(&mut self, details: BookDetails) {
        if let Some(image_url) = details.image_url.filter(|url| !url.trim().is_empty()) {
            self.image_url = image_url;
        }
        self.description = Some(details.description);
        self.category = Some(details.category);
    }

    /// Converts the draft into a record ready to be stored.
    ///
    /// The id of an edited record is carried over; new records get an empty id which the store
    /// replaces on create.
    /// # Errors
    /// Returns [`DraftError::EmptyTitle`] if the title is blank.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per save"
    )]
    pub fn into_record(self) -> Result<Record, DraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DraftError::EmptyTitle);
        }

        let mut record = Record::new(
            self.id.unwrap_or_default(),
            title.to_owned(),
            self.log_date,
            self.start_date,
        );
        record.image_url = Some(self.image_url);
        record.rating = self.rating;
        record.end_date = self.end_date;
        record.review = Some(self.review);
        record.quotes = self.quotes;
        record.description = self.description;
        record.category = self.category;

        Ok(record.normalized())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn new_draft_is_anchored_on_date() {
        let draft = RecordDraft::for_date(date(2024, 3, 5));

        assert_eq!(draft.log_date, date(2024, 3, 5));
        assert_eq!(draft.start_date, date(2024, 3, 5));
        assert_eq!(draft.quotes, vec![String::new()]);
        assert_eq!(draft.id, None);
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut draft = RecordDraft::for_date(date(2024, 3, 5));
        draft.title = "   ".to_owned();

        assert_eq!(draft.into_record(), Err(DraftError::EmptyTitle));
    }

    #[test]
    fn rating_is_dropped_while_reading() {
        let mut draft = RecordDraft::for_date(date(2024, 3, 5));
        draft.title = "Dune".to_owned();
        draft.set_rating(Some(5)).unwrap();

        let record = draft.into_record().unwrap();

        assert_eq!(record.rating, None);
        assert_eq!(record.id, "");
    }

    #[test]
    fn rating_is_kept_when_finished() {
        let mut draft = RecordDraft::for_date(date(2024, 3, 5));
        draft.title = "Dune".to_owned();
        draft.end_date = Some(date(2024, 3, 20));
        draft.set_rating(Some(4)).unwrap();

        let record = draft.into_record().unwrap();

        assert_eq!(record.rating.map(Rating::get), Some(4));
    }

    #[test]
    fn invalid_rating_is_an_error() {
        let mut draft = RecordDraft::for_date(date(2024, 3, 5));

        assert_eq!(
            draft.set_rating(Some(9)),
            Err(DraftError::Rating(RatingError::OutOfRange(9)))
        );
    }

    #[test]
    fn quote_slots() {
        let mut draft = RecordDraft::for_date(date(2024, 3, 5));
        draft.title = "Dune".to_owned();
        draft.set_quote(0, "I must not fear.");
        draft.add_quote();
        draft.add_quote();
        draft.set_quote(2, "Fear is the mind-killer.");
        draft.remove_quote(7);

        assert_eq!(draft.quotes.len(), 3);

        let record = draft.into_record().unwrap();
        assert_eq!(
            record.quotes,
            vec![
                String::from("I must not fear."),
                String::from("Fear is the mind-killer.")
            ]
        );
    }

    #[test]
    fn last_quote_slot_is_never_removed() {
        let mut draft = RecordDraft::for_date(date(2024, 3, 5));
        draft.remove_quote(0);

        assert_eq!(draft.quotes, vec![String::new()]);
    }

    #[test]
    fn edit_round_trip_keeps_id_and_details() {
        let mut record = Record::new(
            "abc".into(),
            "Dune".into(),
            date(2024, 3, 5),
            date(2024, 3, 1),
        )
        .with_end_date(date(2024, 3, 10))
        .with_rating(Rating::new(5).unwrap());
        record.category = Some("Science Fiction".to_owned());

        let draft = RecordDraft::from_record(&record);
        assert_eq!(draft.quotes, vec![String::new()]);

        assert_eq!(draft.into_record().unwrap(), record);
    }

    #[test]
    fn details_fill_cover_only_when_present() {
        let mut draft = RecordDraft::for_date(date(2024, 3, 5));
        draft.image_url = "https://covers.example/dune.jpg".to_owned();

        draft.apply_details(BookDetails::new(
            "A desert planet.".to_owned(),
            "Science Fiction".to_owned(),
            None,
        ));

        assert_eq!(draft.image_url, "https://covers.example/dune.jpg");
        assert_eq!(draft.description.as_deref(), Some("A desert planet."));
        assert_eq!(draft.category.as_deref(), Some("Science Fiction"));
    }
}
