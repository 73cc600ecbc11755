use crate::cli::{AddArgs, EditArgs, RecordFields};
use crate::commands::{Format, encode_records};
use crate::errors::Error;
use crate::render;
use chrono::NaiveDate;
use librolog_core::calendar::records_on;
use librolog_core::enrichment::Enricher;
use librolog_core::record::draft::RecordDraft;
use librolog_core::store::{RecordStore, Storage};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Fills description, category and maybe the cover from the enrichment service. A failed lookup
/// leaves the draft untouched.
#[instrument(name = "enrichment.lookup", skip_all, fields(title = %draft.title))]
async fn lookup_details<E: Enricher + Sync>(draft: &mut RecordDraft, enricher: &E) {
    let started = Instant::now();
    let details = enricher.lookup_book_details(&draft.title).await;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis(),
        found = details.is_some(),
        "book details lookup done"
    );

    match details {
        Some(details) => draft.apply_details(details),
        None => warn!("No details found, saving without them"),
    }
}

async fn apply_fields<E: Enricher + Sync>(
    draft: &mut RecordDraft,
    fields: RecordFields,
    enricher: &E,
) -> Result<(), Error> {
    if let Some(date) = fields.date {
        draft.log_date = date;
    }
    if let Some(start) = fields.start {
        draft.start_date = start;
    }
    if let Some(end) = fields.end {
        draft.end_date = Some(end);
    }
    if fields.rating.is_some() {
        draft.set_rating(fields.rating)?;
    }
    if let Some(review) = fields.review {
        draft.review = review;
    }
    if !fields.quotes.is_empty() {
        draft.quotes = vec![String::new()];
        for (index, quote) in fields.quotes.iter().enumerate() {
            if index > 0 {
                draft.add_quote();
            }
            draft.set_quote(index, quote);
        }
    }
    if let Some(image) = fields.image {
        draft.image_url = image;
    }
    if fields.lookup {
        lookup_details(draft, enricher).await;
    }
    Ok(())
}

pub async fn add<S: Storage, E: Enricher + Sync>(
    store: &mut RecordStore<S>,
    enricher: &E,
    args: AddArgs,
    today: NaiveDate,
    format: Format,
) -> Result<String, Error> {
    let mut draft = RecordDraft::for_date(args.fields.date.unwrap_or(today));
    draft.title = args.title;
    apply_fields(&mut draft, args.fields, enricher).await?;

    let id = store.create(draft.into_record()?)?;
    info!(%id, "Logged new book");
    show(store, &id, format)
}

pub async fn edit<S: Storage, E: Enricher + Sync>(
    store: &mut RecordStore<S>,
    enricher: &E,
    args: EditArgs,
    format: Format,
) -> Result<String, Error> {
    let record = store
        .get(&args.id)
        .ok_or_else(|| Error::NotFound(args.id.clone()))?;
    let mut draft = RecordDraft::from_record(record);

    if let Some(title) = args.title {
        draft.title = title;
    }
    if args.clear_end {
        draft.end_date = None;
    }
    if args.clear_rating {
        draft.rating = None;
    }
    if let Some(index) = args.remove_quote.and_then(|nth| nth.checked_sub(1)) {
        draft.remove_quote(index);
    }
    apply_fields(&mut draft, args.fields, enricher).await?;

    if !store.update(draft.into_record()?)? {
        return Err(Error::NotFound(args.id));
    }
    info!(id = %args.id, "Updated book");
    show(store, &args.id, format)
}

pub fn show<S: Storage>(store: &RecordStore<S>, id: &str, format: Format) -> Result<String, Error> {
    let record = store
        .get(id)
        .ok_or_else(|| Error::NotFound(id.to_owned()))?;
    match format {
        Format::Text => Ok(render::record_detail(record)),
        Format::Json => Ok(serde_json::to_string_pretty(record)?),
    }
}

pub fn delete<S: Storage>(store: &mut RecordStore<S>, id: &str) -> Result<String, Error> {
    if store.delete(id)? {
        Ok(format!("Deleted {id}"))
    } else {
        Err(Error::NotFound(id.to_owned()))
    }
}

/// Everything logged on `date`, not capped like the calendar cell.
pub fn day<S: Storage>(
    store: &RecordStore<S>,
    date: NaiveDate,
    format: Format,
) -> Result<String, Error> {
    let records = records_on(date, store.records());
    match format {
        Format::Text => Ok(render::day(date, &records)),
        Format::Json => encode_records(&records),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::commands::testing::{CannedEnricher, date};
    use librolog_core::record::draft::DraftError;
    use librolog_core::store::MemoryStorage;
    use pretty_assertions::assert_eq;

    fn add_args(title: &str, fields: RecordFields) -> AddArgs {
        AddArgs {
            title: title.to_owned(),
            fields,
        }
    }

    type Store = RecordStore<MemoryStorage>;

    async fn log(store: &mut Store, title: &str, fields: RecordFields) -> Result<String, Error> {
        let args = add_args(title, fields);
        add(store, &CannedEnricher, args, date(2024, 3, 5), Format::Text).await
    }

    fn edit_args(id: &str, fields: RecordFields) -> EditArgs {
        EditArgs {
            id: id.to_owned(),
            title: None,
            fields,
            clear_end: false,
            clear_rating: false,
            remove_quote: None,
        }
    }

    #[tokio::test]
    async fn add_defaults_dates_to_today() {
        let mut store = RecordStore::open(MemoryStorage::new());

        log(&mut store, "  Dune ", RecordFields::default())
            .await
            .unwrap();

        let record = store.records().first().unwrap();
        assert_eq!(record.title, "Dune");
        assert_eq!(record.log_date, date(2024, 3, 5));
        assert_eq!(record.start_date, date(2024, 3, 5));
        assert_eq!(record.end_date, None);
        assert!(record.quotes.is_empty());
        assert_eq!(store.storage().saves(), 1);
    }

    #[tokio::test]
    async fn add_rejects_blank_title_without_saving() {
        let mut store = RecordStore::open(MemoryStorage::new());

        let result = log(&mut store, "   ", RecordFields::default()).await;

        assert!(matches!(result, Err(Error::Draft(DraftError::EmptyTitle))));
        assert_eq!(store.storage().saves(), 0);
    }

    #[tokio::test]
    async fn rating_without_end_date_is_dropped() {
        let mut store = RecordStore::open(MemoryStorage::new());
        let fields = RecordFields {
            rating: Some(5),
            quotes: vec!["  ".to_owned(), "The spice must flow.".to_owned()],
            ..RecordFields::default()
        };

        log(&mut store, "Dune", fields).await.unwrap();

        let record = store.records().first().unwrap();
        assert_eq!(record.rating, None);
        assert_eq!(record.quotes, vec!["The spice must flow.".to_owned()]);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let mut store = RecordStore::open(MemoryStorage::new());
        let fields = RecordFields {
            end: Some(date(2024, 3, 9)),
            rating: Some(6),
            ..RecordFields::default()
        };

        let result = log(&mut store, "Dune", fields).await;

        assert!(matches!(result, Err(Error::Draft(DraftError::Rating(_)))));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn lookup_fills_details() {
        let mut store = RecordStore::open(MemoryStorage::new());
        let fields = RecordFields {
            lookup: true,
            ..RecordFields::default()
        };

        log(&mut store, "Dune", fields).await.unwrap();

        let record = store.records().first().unwrap();
        assert_eq!(record.description.as_deref(), Some("About Dune"));
        assert_eq!(record.category.as_deref(), Some("Fiction"));
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://covers.example/dune.jpg")
        );
    }

    #[tokio::test]
    async fn failed_lookup_still_saves() {
        let mut store = RecordStore::open(MemoryStorage::new());
        let fields = RecordFields {
            lookup: true,
            ..RecordFields::default()
        };

        let offline = None::<CannedEnricher>;
        let args = add_args("Dune", fields);

        add(&mut store, &offline, args, date(2024, 3, 5), Format::Text)
            .await
            .unwrap();

        assert_eq!(store.records().first().unwrap().description, None);
    }

    #[tokio::test]
    async fn edit_finishes_and_rates() {
        let mut store = RecordStore::open(MemoryStorage::new());
        log(&mut store, "Dune", RecordFields::default())
            .await
            .unwrap();
        let id = store.records().first().unwrap().id.clone();
        let fields = RecordFields {
            end: Some(date(2024, 3, 20)),
            rating: Some(4),
            ..RecordFields::default()
        };

        let args = edit_args(&id, fields);

        let output = edit(&mut store, &CannedEnricher, args, Format::Text)
            .await
            .unwrap();

        let record = store.get(&id).unwrap();
        assert!(record.is_finished());
        assert_eq!(record.rating.map(|rating| rating.get()), Some(4));
        assert!(output.contains("★★★★☆"));
    }

    #[tokio::test]
    async fn clearing_end_date_drops_rating() {
        let mut store = RecordStore::open(MemoryStorage::new());
        let fields = RecordFields {
            end: Some(date(2024, 3, 20)),
            rating: Some(4),
            ..RecordFields::default()
        };
        log(&mut store, "Dune", fields).await.unwrap();
        let id = store.records().first().unwrap().id.clone();

        let mut args = edit_args(&id, RecordFields::default());
        args.clear_end = true;
        edit(&mut store, &CannedEnricher, args, Format::Text)
            .await
            .unwrap();

        let record = store.get(&id).unwrap();
        assert_eq!(record.end_date, None);
        assert_eq!(record.rating, None);
    }

    #[tokio::test]
    async fn edit_unknown_id_is_not_found() {
        let mut store = RecordStore::open(MemoryStorage::new());

        let args = edit_args("missing", RecordFields::default());

        let result = edit(&mut store, &CannedEnricher, args, Format::Text).await;

        assert!(matches!(result, Err(Error::NotFound(id)) if id == "missing"));
        assert_eq!(store.storage().saves(), 0);
    }

    #[tokio::test]
    async fn delete_and_day_listing() {
        let mut store = RecordStore::open(MemoryStorage::new());
        for title in ["Dune", "Emma"] {
            log(&mut store, title, RecordFields::default())
                .await
                .unwrap();
        }
        let id = store.records().first().unwrap().id.clone();

        assert_eq!(delete(&mut store, &id).unwrap(), format!("Deleted {id}"));
        assert!(matches!(delete(&mut store, &id), Err(Error::NotFound(_))));

        let listing = day(&store, date(2024, 3, 5), Format::Text).unwrap();
        assert!(listing.starts_with("Tuesday, March 5 2024\n"));
        assert!(listing.contains("Emma"));
        assert!(!listing.contains("Dune"));
    }
}
