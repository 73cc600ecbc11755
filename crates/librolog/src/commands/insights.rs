use crate::commands::Format;
use crate::errors::Error;
use crate::render;
use core::iter::zip;
use futures::future::join_all;
use librolog_core::enrichment::Enricher;
use librolog_core::record::types::Record;
use librolog_core::store::{RecordStore, Storage};
use librolog_core::summary::{CURRENTLY_READING_LIMIT, currently_reading, in_progress_titles};
use serde_json::json;
use std::time::Instant;
use tracing::{Instrument as _, info, info_span};

pub fn summary<S: Storage>(store: &RecordStore<S>, format: Format) -> Result<String, Error> {
    let counts = store.summary();
    let reading = currently_reading(store.records(), CURRENTLY_READING_LIMIT);
    match format {
        Format::Text => Ok(render::summary(&counts, &reading)),
        Format::Json => Ok(serde_json::to_string_pretty(&json!({
            "summary": counts,
            "currentlyReading": reading,
        }))?),
    }
}

pub async fn recommend<S: Storage, E: Enricher + Sync>(
    store: &RecordStore<S>,
    enricher: &E,
) -> String {
    let titles = in_progress_titles(store.records());
    let span = info_span!("enrichment.recommend", seeds = titles.len());

    let recommendation = async {
        let started = Instant::now();
        let recommendation = enricher.daily_recommendation(&titles).await;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis(),
            found = recommendation.is_some(),
            "recommendation done"
        );
        recommendation
    }
    .instrument(span)
    .await;

    recommendation.map_or_else(
        || "No recommendation available right now.".to_owned(),
        |found| render::recommendation(&found),
    )
}

/// Looks up details for every titled record without a description, concurrently, and writes the
/// answers back one record at a time.
pub async fn enrich<S: Storage, E: Enricher + Sync>(
    store: &mut RecordStore<S>,
    enricher: &E,
) -> Result<String, Error> {
    let pending = store
        .records()
        .iter()
        .filter(|record| record.description.is_none() && !record.title.trim().is_empty())
        .cloned()
        .collect::<Vec<Record>>();
    if pending.is_empty() {
        return Ok("Every record already has details.".to_owned());
    }
    let total = pending.len();

    let span = info_span!("enrichment.bulk", pending = total);
    let lookups = join_all(
        pending
            .iter()
            .map(|record| enricher.lookup_book_details(&record.title)),
    )
    .instrument(span)
    .await;

    let mut enriched = 0_usize;
    for (mut record, details) in zip(pending, lookups) {
        let Some(details) = details else {
            continue;
        };
        if let Some(image_url) = details.image_url.filter(|url| !url.trim().is_empty()) {
            record.image_url = Some(image_url);
        }
        record.description = Some(details.description);
        record.category = Some(details.category);
        if store.update(record)? {
            enriched = enriched.saturating_add(1);
        }
    }

    info!(enriched, pending = total, "bulk enrichment done");
    Ok(format!("Enriched {enriched} of {total} record(s)."))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::commands::testing::{CannedEnricher, date, seeded_store};
    use pretty_assertions::assert_eq;

    fn titled(id: &str, title: &str) -> Record {
        let day = date(2024, 3, 8);
        Record::new(id.to_owned(), title.to_owned(), day, day)
    }

    #[test]
    fn summary_counts_and_lists_reading() {
        let store = seeded_store();

        assert_eq!(
            summary(&store, Format::Text).unwrap(),
            "Total: 3  Completed: 1  In progress: 2\n\nCurrently reading:\n  Emma (since 2024-03-02)\n  Persuasion (since 2024-03-03)"
        );
    }

    #[tokio::test]
    async fn recommendation_is_seeded_with_reading_titles() {
        let store = seeded_store();

        let output = recommend(&store, &CannedEnricher).await;

        assert!(output.starts_with("Hyperion by Dan Simmons [Science Fiction]"));
        assert!(output.ends_with("Because you read Emma, Persuasion"));
    }

    #[tokio::test]
    async fn missing_recommendation_has_fallback_text() {
        let store = seeded_store();

        let output = recommend(&store, &None::<CannedEnricher>).await;

        assert_eq!(output, "No recommendation available right now.");
    }

    #[tokio::test]
    async fn enrich_fills_only_missing_details() {
        let mut store = seeded_store();

        let first = enrich(&mut store, &CannedEnricher).await.unwrap();
        let second = enrich(&mut store, &CannedEnricher).await.unwrap();

        assert_eq!(first, "Enriched 3 of 3 record(s).");
        assert_eq!(second, "Every record already has details.");
        assert!(
            store
                .records()
                .iter()
                .all(|record| record.description == Some(format!("About {}", record.title)))
        );
    }

    #[tokio::test]
    async fn failed_lookups_change_nothing() {
        let mut store = seeded_store();
        let saves = store.storage().saves();

        let output = enrich(&mut store, &None::<CannedEnricher>).await.unwrap();

        assert_eq!(output, "Enriched 0 of 3 record(s).");
        assert_eq!(store.storage().saves(), saves);
    }

    #[tokio::test]
    async fn enrich_skips_blank_titles_and_keeps_stored_titles() {
        let mut store = seeded_store();
        store.create(titled("blank", "   ")).unwrap();
        store.create(titled("padded", " Middlemarch ")).unwrap();

        let output = enrich(&mut store, &CannedEnricher).await.unwrap();

        let blank = store.get("blank").unwrap();
        let padded = store.get("padded").unwrap();
        assert_eq!(output, "Enriched 4 of 4 record(s).");
        assert_eq!(blank.description, None);
        assert_eq!(padded.title, " Middlemarch ");
        assert_eq!(padded.description.as_deref(), Some("About Middlemarch"));
    }
}
