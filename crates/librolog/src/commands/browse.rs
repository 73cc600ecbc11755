use crate::cli::{CalendarArgs, ListArgs};
use crate::commands::{Confirm, Format, encode_records};
use crate::errors::Error;
use crate::render;
use chrono::NaiveDate;
use librolog_core::calendar::MonthCursor;
use librolog_core::list::ListView;
use librolog_core::store::{RecordStore, Storage};

/// Prints the filtered list, or with `--delete-all` removes every listed record after confirmation.
pub fn list<S: Storage>(
    store: &mut RecordStore<S>,
    args: &ListArgs,
    format: Format,
    confirm: &mut Confirm<'_>,
) -> Result<String, Error> {
    let mut view = ListView::new(args.filter);
    view.set_query(&args.query);

    if !args.delete_all {
        let visible = view.visible(store.records());
        return match format {
            Format::Text => Ok(render::record_list(&visible)),
            Format::Json => encode_records(&visible),
        };
    }

    let count = view.visible(store.records()).len();
    if count == 0 {
        return Ok("Nothing to delete.".to_owned());
    }
    if !args.yes && !confirm(&format!("Delete {count} record(s)?"))? {
        return Ok("Cancelled.".to_owned());
    }

    view.toggle_all(store.records());
    let deleted = view.delete_selected(store)?;
    Ok(format!("Deleted {deleted} record(s)."))
}

pub fn calendar<S: Storage>(
    store: &RecordStore<S>,
    args: &CalendarArgs,
    today: NaiveDate,
) -> String {
    let mut cursor = MonthCursor::new(args.month.unwrap_or(today));
    for _ in 0..args.next {
        cursor.next();
    }
    for _ in 0..args.previous {
        cursor.previous();
    }
    render::calendar(&cursor.title(), &cursor.grid(store.records(), today))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use crate::commands::testing::{date, seeded_store};
    use librolog_core::list::StatusFilter;
    use librolog_core::record::types::Record;
    use pretty_assertions::assert_eq;

    fn list_args(filter: StatusFilter, query: &str, delete_all: bool, yes: bool) -> ListArgs {
        ListArgs {
            filter,
            query: query.to_owned(),
            delete_all,
            yes,
        }
    }

    fn refuse(_question: &str) -> std::io::Result<bool> {
        Ok(false)
    }

    #[test]
    fn lists_filtered_records_in_store_order() {
        let mut store = seeded_store();

        let args = list_args(StatusFilter::Reading, "", false, false);
        let output = list(&mut store, &args, Format::Text, &mut refuse).unwrap();

        let titles = output
            .lines()
            .map(|line| line.split_once("] ").unwrap().1.split("  ").next().unwrap())
            .collect::<Vec<&str>>();
        assert_eq!(titles, vec!["Emma", "Persuasion"]);
    }

    #[test]
    fn json_listing_round_trips_records() {
        let mut store = seeded_store();

        let args = list_args(StatusFilter::All, "", false, false);
        let output = list(&mut store, &args, Format::Json, &mut refuse).unwrap();

        let listed: Vec<Record> = serde_json::from_str(&output).unwrap();
        assert_eq!(listed, store.records().to_vec());
    }

    #[test]
    fn declined_confirmation_keeps_everything() {
        let mut store = seeded_store();
        let saves = store.storage().saves();
        let mut asked = Vec::new();
        let mut record_question = |question: &str| -> std::io::Result<bool> {
            asked.push(question.to_owned());
            Ok(false)
        };

        let args = list_args(StatusFilter::All, "e", true, false);
        let output = list(&mut store, &args, Format::Text, &mut record_question).unwrap();

        assert_eq!(output, "Cancelled.");
        assert_eq!(asked, vec!["Delete 3 record(s)?".to_owned()]);
        assert_eq!(store.records().len(), 3);
        assert_eq!(store.storage().saves(), saves);
    }

    #[test]
    fn delete_all_only_hits_visible_records() {
        let mut store = seeded_store();

        let args = list_args(StatusFilter::Finished, "", true, true);
        let output = list(&mut store, &args, Format::Text, &mut refuse).unwrap();

        assert_eq!(output, "Deleted 1 record(s).");
        let remaining = store
            .records()
            .iter()
            .map(|record| record.title.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(remaining, vec!["Emma", "Persuasion"]);
    }

    #[test]
    fn nothing_visible_nothing_deleted() {
        let mut store = seeded_store();
        let saves = store.storage().saves();

        let args = list_args(StatusFilter::All, "zzz", true, true);
        let output = list(&mut store, &args, Format::Text, &mut refuse).unwrap();

        assert_eq!(output, "Nothing to delete.");
        assert_eq!(store.storage().saves(), saves);
    }

    #[test]
    fn calendar_navigates_from_month() {
        let store = seeded_store();
        let args = CalendarArgs {
            month: Some(date(2024, 3, 1)),
            next: 2,
            previous: 1,
        };

        let output = calendar(&store, &args, date(2024, 1, 1));

        assert!(output.starts_with("April 2024\n"));
    }

    #[test]
    fn calendar_defaults_to_current_month() {
        let store = seeded_store();
        let args = CalendarArgs {
            month: None,
            next: 0,
            previous: 0,
        };

        let output = calendar(&store, &args, date(2024, 3, 12));

        assert!(output.starts_with("March 2024\n"));
        assert!(output.contains("[12]"));
        assert!(output.contains(" Dune"));
    }
}
