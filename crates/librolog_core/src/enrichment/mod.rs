//! Book enrichment
//!
//! Optional, best-effort lookups of book details and reading recommendations. Implementations of
//! [`Enricher`] swallow every failure and answer `None`; nothing in the store waits on them.
//! `Option<E>` is an enricher too, `None` standing for "enrichment disabled" (no API key).
pub mod errors;
pub mod gemini;

pub use errors::EnrichmentError;
pub use gemini::GeminiClient;

use core::future::Future;
use serde::{Deserialize, Serialize};

/// Details looked up for a title.
#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl BookDetails {
    #[must_use]
    #[inline]
    pub const fn new(description: String, category: String, image_url: Option<String>) -> Self {
        Self {
            description,
            category,
            image_url,
        }
    }
}

/// A book suggested to the reader.
#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub title: String,
    pub author: String,
    pub description: String,
    pub category: String,
}

impl Recommendation {
    #[must_use]
    #[inline]
    pub const fn new(title: String, author: String, description: String, category: String) -> Self {
        Self {
            title,
            author,
            description,
            category,
        }
    }
}

pub trait Enricher {
    /// Looks up description, category and possibly a cover for `title`.
    fn lookup_book_details(&self, title: &str) -> impl Future<Output = Option<BookDetails>> + Send;

    /// Suggests one book, seeded with the titles currently being read.
    fn daily_recommendation(
        &self,
        in_progress_titles: &[String],
    ) -> impl Future<Output = Option<Recommendation>> + Send;
}

impl<E: Enricher + Sync> Enricher for Option<E> {
    #[inline]
    fn lookup_book_details(&self, title: &str) -> impl Future<Output = Option<BookDetails>> + Send {
        async move {
            match self {
                Some(enricher) => enricher.lookup_book_details(title).await,
                None => None,
            }
        }
    }

    #[inline]
    fn daily_recommendation(
        &self,
        in_progress_titles: &[String],
    ) -> impl Future<Output = Option<Recommendation>> + Send {
        async move {
            match self {
                Some(enricher) => enricher.daily_recommendation(in_progress_titles).await,
                None => None,
            }
        }
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

    struct Canned;

    impl Enricher for Canned {
        fn lookup_book_details(
            &self,
            title: &str,
        ) -> impl Future<Output = Option<BookDetails>> + Send {
            let details = BookDetails::new(format!("About {title}"), "Fiction".to_owned(), None);
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

    #[tokio::test]
    async fn disabled_enricher_answers_none() {
        let disabled: Option<Canned> = None;

        assert_eq!(disabled.lookup_book_details("Dune").await, None);
        assert_eq!(disabled.daily_recommendation(&[]).await, None);
    }

    #[tokio::test]
    async fn enabled_option_delegates() {
        let enabled = Some(Canned);

        let details = enabled.lookup_book_details("Dune").await;
        let recommendation = enabled.daily_recommendation(&["Dune".to_owned()]).await;

        assert_eq!(
            details.map(|found| found.description),
            Some("About Dune".to_owned())
        );
        assert_eq!(
            recommendation.map(|found| found.description),
            Some("Because you read Dune".to_owned())
        );
    }

    #[test]
    fn details_deserialize_with_optional_cover() {
        let details: BookDetails =
            serde_json::from_str(r#"{"description": "Spice.", "category": "SF"}"#).unwrap();

        assert_eq!(
            details,
            BookDetails::new("Spice.".to_owned(), "SF".to_owned(), None)
        );
    }
}
