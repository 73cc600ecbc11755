//! Plain-text rendering of records, lists, calendar grids and counters.
use librolog_core::calendar::{CalendarGrid, DayCell, VISIBLE_RECORDS_PER_DAY, WEEKDAY_LABELS};
use librolog_core::enrichment::Recommendation;
use librolog_core::record::rating::Rating;
use librolog_core::record::types::Record;
use librolog_core::summary::Summary;

/// Width of one calendar column, including the separating space.
const CELL_WIDTH: usize = 14;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut shortened = text
        .chars()
        .take(width.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

fn period(record: &Record) -> String {
    record.end_date.map_or_else(
        || format!("{} ~", record.start_date),
        |end| format!("{} ~ {end}", record.start_date),
    )
}

/// One-line summary used by lists.
pub fn record_line(record: &Record) -> String {
    let stars = record.rating.map(Rating::stars).unwrap_or_default();
    format!(
        "{}  [{}] {}  {}  {}",
        record.id, record.status(), record.title, period(record), stars
    )
    .trim_end()
    .to_owned()
}

/// Every field of a record.
pub fn record_detail(record: &Record) -> String {
    let mut lines = vec![
        record.title.clone(),
        format!("  id:       {}", record.id),
        format!("  status:   {}", record.status()),
        format!("  logged:   {}", record.log_date),
        format!("  period:   {}", period(record)),
    ];
    if let Some(rating) = record.rating {
        lines.push(format!("  rating:   {}", rating.stars()));
    }
    if let Some(category) = &record.category {
        lines.push(format!("  category: {category}"));
    }
    if let Some(image_url) = &record.image_url {
        lines.push(format!("  cover:    {image_url}"));
    }
    if let Some(description) = &record.description {
        lines.push(format!("\n{description}"));
    }
    if let Some(review) = &record.review {
        lines.push(format!("\nReview:\n{review}"));
    }
    if !record.quotes.is_empty() {
        lines.push("\nQuotes:".to_owned());
        lines.extend(record.quotes.iter().map(|quote| format!("  \"{quote}\"")));
    }
    lines.join("\n")
}

pub fn record_list(records: &[&Record]) -> String {
    if records.is_empty() {
        return "No records.".to_owned();
    }
    records
        .iter()
        .map(|record| record_line(record))
        .collect::<Vec<String>>()
        .join("\n")
}

fn day_label(cell: &DayCell<'_>) -> String {
    let day = cell.date.format("%d").to_string();
    if cell.is_today {
        format!("[{day}]")
    } else if cell.is_in_current_month {
        format!(" {day}")
    } else {
        format!(" ({day})")
    }
}

fn calendar_row<'r>(week: &[DayCell<'r>], cell_text: impl Fn(&DayCell<'r>) -> String) -> String {
    week.iter()
        .map(|cell| {
            format!(
                "{:<width$}",
                truncate(&cell_text(cell), CELL_WIDTH - 1), width = CELL_WIDTH
            )
        })
        .collect::<String>()
        .trim_end()
        .to_owned()
}

/// Month grid: a weekday header, then per week a line of day numbers, up to
/// [`VISIBLE_RECORDS_PER_DAY`] lines of titles and a `+N` line when a day overflows.
pub fn calendar(title: &str, grid: &CalendarGrid<'_>) -> String {
    let mut lines = vec![
        title.to_owned(),
        WEEKDAY_LABELS
            .iter()
            .map(|label| format!(" {label:<width$}", width = CELL_WIDTH - 1))
            .collect::<String>()
            .trim_end()
            .to_owned(),
    ];

    for week in grid.weeks() {
        lines.push(calendar_row(week, day_label));
        for slot in 0..VISIBLE_RECORDS_PER_DAY {
            if week.iter().any(|cell| cell.records.len() > slot) {
                lines.push(calendar_row(week, |cell| {
                    cell.records
                        .get(slot)
                        .map(|record| format!(" {}", record.title))
                        .unwrap_or_default()
                }));
            }
        }
        if week.iter().any(|cell| cell.overflow_count > 0) {
            lines.push(calendar_row(week, |cell| {
                if cell.overflow_count > 0 {
                    format!(" +{}", cell.overflow_count)
                } else {
                    String::new()
                }
            }));
        }
    }
    lines.join("\n")
}

pub fn day(date: chrono::NaiveDate, records: &[&Record]) -> String {
    format!("{}\n{}", date.format("%A, %B %-d %Y"), record_list(records))
}

pub fn summary(summary: &Summary, currently_reading: &[&Record]) -> String {
    let mut lines = vec![format!(
        "Total: {}  Completed: {}  In progress: {}",
        summary.total, summary.completed, summary.in_progress
    )];
    if !currently_reading.is_empty() {
        lines.push("\nCurrently reading:".to_owned());
        lines.extend(
            currently_reading
                .iter()
                .map(|record| format!("  {} (since {})", record.title, record.start_date)),
        );
    }
    lines.join("\n")
}

pub fn recommendation(recommendation: &Recommendation) -> String {
    format!(
        "{} by {} [{}]\n\n{}",
        recommendation.title,
        recommendation.author,
        recommendation.category,
        recommendation.description
    )
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use librolog_core::calendar::build_grid;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record(id: &str, title: &str, logged: NaiveDate, started: NaiveDate) -> Record {
        Record::new(id.to_owned(), title.to_owned(), logged, started)
    }

    fn dune() -> Record {
        record("a1", "Dune", date(2024, 3, 5), date(2024, 3, 1))
            .with_end_date(date(2024, 3, 20))
            .with_rating(Rating::new(4).unwrap())
    }

    #[test]
    fn line_shows_status_period_and_stars() {
        assert_eq!(
            record_line(&dune()),
            "a1  [finished] Dune  2024-03-01 ~ 2024-03-20  ★★★★☆"
        );
    }

    #[test]
    fn in_progress_line_has_open_period() {
        let emma = record("b2", "Emma", date(2024, 3, 5), date(2024, 3, 2));
        assert_eq!(record_line(&emma), "b2  [reading] Emma  2024-03-02 ~");
    }

    #[test]
    fn detail_lists_quotes() {
        let quoted = dune().with_quotes(vec!["Fear is the mind-killer.".to_owned()]);
        let detail = record_detail(&quoted);

        assert!(detail.starts_with("Dune\n  id:       a1"));
        assert!(detail.ends_with("Quotes:\n  \"Fear is the mind-killer.\""));
    }

    #[test]
    fn empty_list() {
        assert_eq!(record_list(&[]), "No records.");
    }

    #[test]
    fn calendar_marks_today_and_overflow() {
        let records = (0..5)
            .map(|index| {
                Record::new(
                    index.to_string(),
                    format!("Book {index}"),
                    date(2024, 3, 5),
                    date(2024, 3, 1),
                )
            })
            .collect::<Vec<Record>>();
        let grid = build_grid(date(2024, 3, 10), &records, date(2024, 3, 5));
        let text = calendar("March 2024", &grid);

        assert!(text.starts_with("March 2024\n Sun"));
        assert!(text.contains("[05]"));
        assert!(text.contains(" Book 2"));
        assert!(!text.contains("Book 3"));
        assert!(text.contains(" +2"));
        // March 2024 starts on a Friday, so the first row leads with February days.
        assert!(text.contains(" (25)"));
    }

    #[test]
    fn summary_lists_currently_reading() {
        let reading = record("c3", "Emma", date(2024, 3, 5), date(2024, 3, 2));
        let text = summary(&Summary::of(&[dune(), reading.clone()]), &[&reading]);

        assert_eq!(
            text,
            "Total: 2  Completed: 1  In progress: 1\n\nCurrently reading:\n  Emma (since 2024-03-02)"
        );
    }

    #[test]
    fn long_titles_are_truncated() {
        assert_eq!(truncate("The Left Hand of Darkness", 8), "The Lef…");
        assert_eq!(truncate("Emma", 8), "Emma");
    }
}
