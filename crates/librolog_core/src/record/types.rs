use crate::record::rating::Rating;
use chrono::NaiveDate;
use core::fmt;
use serde::{Deserialize, Deserializer, Serialize};

/// One reading-log entry: a book, the period it was read in and the reader's annotations.
///
/// Dates are day-granular and serialize as `yyyy-MM-dd`. Field names on disk are camelCase
/// (`imageUrl`, `logDate`, ...).
#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Opaque identifier. An empty id means "not assigned yet"; the store fills it in on create.
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub image_url: Option<String>,
    /// Only ever set on finished records.
    #[serde(default)]
    pub rating: Option<Rating>,
    /// The day the entry is shown on in the calendar, independent of start and end.
    pub log_date: NaiveDate,
    pub start_date: NaiveDate,
    /// `None` while the book is still being read.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub review: Option<String>,
    #[serde(default)]
    pub quotes: Vec<String>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
}

impl Record {
    /// Creates an in-progress record without annotations.
    #[must_use]
    #[inline]
    pub const fn new(
        id: String,
        title: String,
        log_date: NaiveDate,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            title,
            image_url: None,
            rating: None,
            log_date,
            start_date,
            end_date: None,
            review: None,
            quotes: Vec::new(),
            description: None,
            category: None,
        }
    }

    #[must_use]
    #[inline]
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    #[inline]
    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    #[must_use]
    #[inline]
    pub fn with_review(mut self, review: &str) -> Self {
        self.review = Some(review.to_owned());
        self
    }

    #[must_use]
    #[inline]
    pub fn with_quotes(mut self, quotes: Vec<String>) -> Self {
        self.quotes = quotes;
        self
    }

    #[must_use]
    #[inline]
    pub fn with_image_url(mut self, image_url: &str) -> Self {
        self.image_url = Some(image_url.to_owned());
        self
    }

    /// A record is finished iff it has an end date. This is the only place the status is decided.
    #[must_use]
    #[inline]
    pub const fn is_finished(&self) -> bool {
        self.end_date.is_some()
    }

    #[must_use]
    #[inline]
    pub const fn status(&self) -> ReadingStatus {
        if self.is_finished() {
            ReadingStatus::Finished
        } else {
            ReadingStatus::Reading
        }
    }

    /// Applies the write-time rules: no rating without an end date, no blank quotes, blank
    /// optional text becomes `None`.
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "Called once per write"
    )]
    pub fn normalize(&mut self) {
        if self.end_date.is_none() {
            self.rating = None;
        }
        self.quotes.retain(|quote| !quote.trim().is_empty());
        for field in [
            &mut self.image_url,
            &mut self.review,
            &mut self.description,
            &mut self.category,
        ] {
            if field.as_deref().is_some_and(|text| text.trim().is_empty()) {
                *field = None;
            }
        }
    }

    #[must_use]
    #[inline]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// `true` if the end date lies before the start date. Such records are kept as they are, this
    /// only serves diagnostics.
    #[must_use]
    #[inline]
    pub fn has_inverted_period(&self) -> bool {
        self.end_date.is_some_and(|end| end < self.start_date)
    }
}

/// Reading state derived from [`Record::end_date`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingStatus {
    Finished,
    Reading,
}

impl ReadingStatus {
    #[must_use]
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Reading => "reading",
        }
    }
}

impl fmt::Display for ReadingStatus {
    #[inline]
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Older snapshots store missing text as `""`; treat it like an absent value.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.trim().is_empty()))
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

    fn dune(id: &str) -> Record {
        Record::new(id.into(), "Dune".into(), date(2024, 3, 5), date(2024, 3, 1))
    }

    #[test]
    fn status_follows_end_date() {
        let reading = dune("a");
        let finished = reading.clone().with_end_date(date(2024, 3, 10));

        assert_eq!(reading.status(), ReadingStatus::Reading);
        assert_eq!(finished.status(), ReadingStatus::Finished);
        assert_eq!(finished.status().to_string(), "finished");
    }

    #[test]
    fn normalize_clears_rating_without_end_date() {
        let record = dune("a").with_rating(Rating::new(5).unwrap()).normalized();

        assert_eq!(record.rating, None);
    }

    #[test]
    fn normalize_keeps_rating_on_finished_record() {
        let record = dune("a")
            .with_end_date(date(2024, 3, 9))
            .with_rating(Rating::new(4).unwrap())
            .normalized();

        assert_eq!(record.rating, Rating::new(4));
    }

    #[test]
    fn normalize_drops_blank_text() {
        let record = dune("a")
            .with_quotes(vec![
                "Fear is the mind-killer.".into(),
                String::new(),
                "   ".into(),
            ])
            .with_review("  ")
            .with_image_url("")
            .normalized();

        assert_eq!(
            record.quotes,
            vec![String::from("Fear is the mind-killer.")]
        );
        assert_eq!(record.review, None);
        assert_eq!(record.image_url, None);
    }

    #[test]
    fn serializes_with_camel_case_and_iso_dates() {
        let record = dune("x1")
            .with_end_date(date(2024, 3, 10))
            .with_rating(Rating::new(4).unwrap());

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "id": "x1",
                "title": "Dune",
                "imageUrl": null,
                "rating": 4,
                "logDate": "2024-03-05",
                "startDate": "2024-03-01",
                "endDate": "2024-03-10",
                "quotes": []
            })
        );
    }

    #[test]
    fn deserializes_snapshot_with_empty_strings() {
        let raw = r#"{
            "id": "k2j3h4",
            "title": "Project Hail Mary",
            "imageUrl": "",
            "rating": null,
            "logDate": "2024-03-05",
            "startDate": "2024-03-05",
            "endDate": null,
            "review": ""
        }"#;

        let record: Record = serde_json::from_str(raw).unwrap();

        assert_eq!(record.image_url, None);
        assert_eq!(record.review, None);
        assert!(record.quotes.is_empty());
        assert_eq!(record.status(), ReadingStatus::Reading);
    }

    #[test]
    fn inverted_period_is_reported_not_rejected() {
        let record = dune("a").with_end_date(date(2024, 2, 28)).normalized();

        assert!(record.has_inverted_period());
        assert!(record.is_finished());
    }
}
