//! Calendar grid
//!
//! Projects the record collection onto a month view made of whole weeks, Sunday first. Every day
//! cell holds the records whose `log_date` is that day, capped at
//! [`VISIBLE_RECORDS_PER_DAY`] with the remainder reported as an overflow count.
//!
//! All functions here are total: dates at the very edge of chrono's range clamp instead of
//! failing.
use crate::record::types::Record;
use chrono::{Datelike as _, Days, Local, Months, NaiveDate};
use std::collections::HashMap;

/// Records shown per cell before the rest collapses into "+ n more".
pub const VISIBLE_RECORDS_PER_DAY: usize = 3;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// One square of the grid.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub is_in_current_month: bool,
    pub is_today: bool,
    /// At most [`VISIBLE_RECORDS_PER_DAY`] records, in collection order.
    pub records: Vec<&'a Record>,
    /// Records logged on this day that did not fit into `records`.
    pub overflow_count: usize,
}

impl DayCell<'_> {
    /// Total number of records logged on this day.
    #[must_use]
    #[inline]
    pub fn bucket_size(&self) -> usize {
        self.records.len().saturating_add(self.overflow_count)
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid<'a> {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    /// Whole weeks in chronological order; the length is always a multiple of seven.
    pub cells: Vec<DayCell<'a>>,
}

impl<'a> CalendarGrid<'a> {
    /// Rows of seven cells, Sunday to Saturday.
    #[inline]
    pub fn weeks(&self) -> core::slice::Chunks<'_, DayCell<'a>> {
        self.cells.chunks(WEEKDAY_LABELS.len())
    }

    #[must_use]
    #[inline]
    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell<'a>> {
        self.cells.iter().find(|cell| cell.date == date)
    }
}

/// First and last day of the month containing `reference`.
#[must_use]
#[allow(
    clippy::missing_inline_in_public_items,
    reason = "Called once per render"
)]
pub fn month_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = reference.with_day(1).unwrap_or(reference);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next_month| next_month.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (start, end)
}

/// Builds the grid for the month containing `reference`. `today` marks the highlighted cell.
#[must_use]
#[allow(
    clippy::missing_inline_in_public_items,
    reason = "Called once per render"
)]
pub fn build_grid(reference: NaiveDate, records: &[Record], today: NaiveDate) -> CalendarGrid<'_> {
    let (month_start, month_end) = month_bounds(reference);

    let lead = u64::from(month_start.weekday().num_days_from_sunday());
    let trail = 6_u64.saturating_sub(u64::from(month_end.weekday().num_days_from_sunday()));
    let grid_start = month_start
        .checked_sub_days(Days::new(lead))
        .unwrap_or(NaiveDate::MIN);
    let grid_end = month_end
        .checked_add_days(Days::new(trail))
        .unwrap_or(NaiveDate::MAX);

    let mut buckets: HashMap<NaiveDate, Vec<&Record>> = HashMap::new();
    for record in records
        .iter()
        .filter(|record| (grid_start..=grid_end).contains(&record.log_date))
    {
        buckets.entry(record.log_date).or_default().push(record);
    }

    let cells = grid_start
        .iter_days()
        .take_while(|date| *date <= grid_end)
        .map(|date| {
            let mut bucket = buckets.remove(&date).unwrap_or_default();
            let overflow_count = bucket.len().saturating_sub(VISIBLE_RECORDS_PER_DAY);
            bucket.truncate(VISIBLE_RECORDS_PER_DAY);
            DayCell {
                date,
                is_in_current_month: (month_start..=month_end).contains(&date),
                is_today: date == today,
                records: bucket,
                overflow_count,
            }
        })
        .collect();

    CalendarGrid {
        month_start,
        month_end,
        cells,
    }
}

/// Every record logged on `date`, uncapped, in collection order.
#[must_use]
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn records_on(date: NaiveDate, records: &[Record]) -> Vec<&Record> {
    records
        .iter()
        .filter(|record| record.log_date == date)
        .collect()
}

/// Moves `reference` by whole calendar months, clamping the day to the target month's length
/// (Jan 31 + 1 month = Feb 28/29).
#[must_use]
#[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
pub fn shift_month(reference: NaiveDate, months: i32) -> NaiveDate {
    let amount = Months::new(months.unsigned_abs());
    let shifted = if months.is_negative() {
        reference.checked_sub_months(amount)
    } else {
        reference.checked_add_months(amount)
    };
    shifted.unwrap_or(reference)
}

/// The month currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    reference: NaiveDate,
}

impl MonthCursor {
    #[must_use]
    #[inline]
    pub const fn new(reference: NaiveDate) -> Self {
        Self { reference }
    }

    /// Cursor on the current local month.
    #[must_use]
    #[inline]
    pub fn current() -> Self {
        Self::new(today())
    }

    #[must_use]
    #[inline]
    pub const fn reference(&self) -> NaiveDate {
        self.reference
    }

    #[inline]
    pub fn next(&mut self) {
        self.reference = shift_month(self.reference, 1);
    }

    #[inline]
    pub fn previous(&mut self) {
        self.reference = shift_month(self.reference, -1);
    }

    /// Heading such as `March 2024`.
    #[must_use]
    #[inline]
    pub fn title(&self) -> String {
        self.reference.format("%B %Y").to_string()
    }

    #[must_use]
    #[inline]
    pub fn grid<'a>(&self, records: &'a [Record], today: NaiveDate) -> CalendarGrid<'a> {
        build_grid(self.reference, records, today)
    }
}

/// Current local date.
#[must_use]
#[inline]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn logged(id: &str, log_date: NaiveDate) -> Record {
        Record::new(id.into(), format!("Book {id}"), log_date, log_date)
    }

    fn ids<'a>(cell: &DayCell<'a>) -> Vec<&'a str> {
        cell.records
            .iter()
            .copied()
            .map(|record| record.id.as_str())
            .collect()
    }

    #[test]
    fn march_2024_spans_six_weeks() {
        let grid = build_grid(date(2024, 3, 15), &[], date(2024, 3, 10));

        assert_eq!(grid.cells.len(), 42);
        assert_eq!(grid.cells.first().unwrap().date, date(2024, 2, 25));
        assert_eq!(grid.cells.last().unwrap().date, date(2024, 4, 6));
        assert_eq!(grid.month_start, date(2024, 3, 1));
        assert_eq!(grid.month_end, date(2024, 3, 31));
        assert_eq!(grid.weeks().count(), 6);
    }

    #[test]
    fn february_2015_fits_four_weeks() {
        let grid = build_grid(date(2015, 2, 1), &[], date(2015, 2, 1));

        assert_eq!(grid.cells.len(), 28);
        assert!(grid.cells.iter().all(|cell| cell.is_in_current_month));
    }

    #[test]
    fn marks_month_membership_and_today() {
        let grid = build_grid(date(2024, 3, 1), &[], date(2024, 3, 10));

        let leading = grid.cell(date(2024, 2, 29)).unwrap();
        let today = grid.cell(date(2024, 3, 10)).unwrap();
        let trailing = grid.cell(date(2024, 4, 1)).unwrap();

        assert!(!leading.is_in_current_month);
        assert!(today.is_in_current_month && today.is_today);
        assert!(!trailing.is_in_current_month);
        assert_eq!(grid.cells.iter().filter(|cell| cell.is_today).count(), 1);
    }

    #[test]
    fn today_outside_grid_marks_nothing() {
        let grid = build_grid(date(2024, 3, 1), &[], date(2030, 1, 1));
        assert!(grid.cells.iter().all(|cell| !cell.is_today));
    }

    #[test]
    fn crowded_day_shows_first_three_and_overflow() {
        let day = date(2024, 3, 5);
        let records = vec![
            logged("A", day),
            logged("B", day)
                .with_end_date(date(2024, 3, 10))
                .with_rating(crate::record::rating::Rating::new(4).unwrap()),
            logged("C", day),
            logged("D", day),
        ];

        let grid = build_grid(day, &records, day);
        let cell = grid.cell(day).unwrap();

        assert_eq!(ids(cell), vec!["A", "B", "C"]);
        assert_eq!(cell.overflow_count, 1);
        assert_eq!(cell.bucket_size(), 4);
    }

    #[test]
    fn buckets_by_exact_log_date_only() {
        let records = vec![
            Record::new(
                "long".into(),
                "Long read".into(),
                date(2024, 3, 20),
                date(2024, 3, 1),
            )
            .with_end_date(date(2024, 3, 25)),
            logged("prev", date(2024, 2, 26)),
            logged("far", date(2023, 3, 5)),
        ];

        let grid = build_grid(date(2024, 3, 1), &records, date(2024, 3, 1));

        assert_eq!(ids(grid.cell(date(2024, 3, 20)).unwrap()), vec!["long"]);
        assert!(grid.cell(date(2024, 3, 1)).unwrap().records.is_empty());
        assert!(grid.cell(date(2024, 3, 25)).unwrap().records.is_empty());
        assert_eq!(ids(grid.cell(date(2024, 2, 26)).unwrap()), vec!["prev"]);
        let placed = grid.cells.iter().map(DayCell::bucket_size).sum::<usize>();
        assert_eq!(placed, 2);
    }

    #[test]
    fn day_detail_is_uncapped() {
        let day = date(2024, 3, 5);
        let records = ["A", "B", "C", "D", "E"]
            .into_iter()
            .map(|id| logged(id, day))
            .chain([logged("other", date(2024, 3, 6))])
            .collect::<Vec<Record>>();

        assert_eq!(records_on(day, &records).len(), 5);
    }

    #[test]
    fn month_navigation_clamps_day() {
        assert_eq!(shift_month(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(shift_month(date(2023, 1, 31), 1), date(2023, 2, 28));
        assert_eq!(shift_month(date(2024, 3, 31), -1), date(2024, 2, 29));
        assert_eq!(shift_month(date(2024, 12, 15), 1), date(2025, 1, 15));
        assert_eq!(shift_month(date(2024, 1, 15), -1), date(2023, 12, 15));
    }

    #[test]
    fn cursor_moves_by_month() {
        let mut cursor = MonthCursor::new(date(2024, 1, 31));
        cursor.next();
        assert_eq!(cursor.title(), "February 2024");
        cursor.previous();
        cursor.previous();
        assert_eq!(cursor.reference(), date(2023, 12, 29));
        assert_eq!(cursor.title(), "December 2023");
    }

    proptest! {
        #[test]
        fn grid_is_whole_weeks_around_month(year in 1900_i32..2200, month in 1_u32..=12, day in 1_u32..=28) {
            let reference = date(year, month, day);
            let grid = build_grid(reference, &[], reference);
            let (start, end) = month_bounds(reference);

            prop_assert_eq!(grid.cells.len() % 7, 0);
            prop_assert!((28..=42).contains(&grid.cells.len()));
            prop_assert_eq!(grid.cells.first().map(|cell| cell.date.weekday()), Some(Weekday::Sun));
            prop_assert_eq!(grid.cells.last().map(|cell| cell.date.weekday()), Some(Weekday::Sat));
            prop_assert!(grid.cell(start).is_some_and(|cell| cell.is_in_current_month));
            prop_assert!(grid.cell(end).is_some_and(|cell| cell.is_in_current_month));
            let in_month = grid.cells.iter().filter(|cell| cell.is_in_current_month).count();
            prop_assert_eq!(in_month, usize::try_from(end.day()).unwrap());
        }

        #[test]
        fn overflow_matches_bucket_size(size in 0_usize..12) {
            let day = date(2024, 3, 5);
            let records = (0..size).map(|index| logged(&index.to_string(), day)).collect::<Vec<Record>>();

            let grid = build_grid(day, &records, day);
            let cell = grid.cell(day).unwrap();

            prop_assert_eq!(cell.overflow_count, size.saturating_sub(VISIBLE_RECORDS_PER_DAY));
            prop_assert_eq!(cell.records.len(), size.min(VISIBLE_RECORDS_PER_DAY));
        }
    }
}
