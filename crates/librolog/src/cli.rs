//! Command-line surface.
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use librolog_core::list::StatusFilter;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "librolog", version, about = "A personal reading log")]
pub struct Cli {
    /// JSON file holding the reading log, overrides `LIBROLOG_DATA_FILE`
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Print records and counters as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log a new book
    Add(AddArgs),
    /// Change an existing entry
    Edit(EditArgs),
    /// Show every field of one entry
    Show { id: String },
    /// Delete one entry
    Delete { id: String },
    /// List entries, optionally filtered and searched
    List(ListArgs),
    /// Show a month as a calendar grid
    Calendar(CalendarArgs),
    /// Show every entry logged on one day
    Day { date: NaiveDate },
    /// Show status counters and the books currently being read
    Summary,
    /// Ask for a book recommendation based on what is being read
    Recommend,
    /// Look up description and category for entries that have none
    Enrich,
}

impl Command {
    /// Whether the command cannot do anything useful without the enrichment service.
    pub const fn needs_enrichment(&self) -> bool {
        match self {
            Self::Recommend | Self::Enrich => true,
            Self::Add(AddArgs { fields, .. }) | Self::Edit(EditArgs { fields, .. }) => {
                fields.lookup
            }
            Self::Show { .. }
            | Self::Delete { .. }
            | Self::List(_)
            | Self::Calendar(_)
            | Self::Day { .. }
            | Self::Summary => false,
        }
    }
}

/// Fields shared by `add` and `edit`.
#[derive(Debug, Args, Default)]
pub struct RecordFields {
    /// Day the entry is shown on in the calendar
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Finishing date, marks the book as finished
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Star rating from 1 to 5, only kept for finished books
    #[arg(long)]
    pub rating: Option<u8>,
    #[arg(long)]
    pub review: Option<String>,
    /// A memorable passage, may be repeated
    #[arg(long = "quote")]
    pub quotes: Vec<String>,
    /// Cover image URL
    #[arg(long)]
    pub image: Option<String>,
    /// Fill description and category through the enrichment service
    #[arg(long)]
    pub lookup: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub title: String,
    #[command(flatten)]
    pub fields: RecordFields,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[command(flatten)]
    pub fields: RecordFields,
    /// Mark the book as still being read
    #[arg(long, conflicts_with = "end")]
    pub clear_end: bool,
    #[arg(long, conflicts_with = "rating")]
    pub clear_rating: bool,
    /// Remove the quote at this position (starting at 1)
    #[arg(long)]
    pub remove_quote: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = StatusFilter::All)]
    pub filter: StatusFilter,
    /// Case-insensitive search over titles and reviews
    #[arg(long, default_value = "")]
    pub query: String,
    /// Delete every listed entry
    #[arg(long)]
    pub delete_all: bool,
    /// Skip the confirmation prompt of `--delete-all`
    #[arg(long, short = 'y', requires = "delete_all")]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct CalendarArgs {
    /// Month to show as yyyy-mm, defaults to the current month
    #[arg(long, value_parser = parse_month)]
    pub month: Option<NaiveDate>,
    /// Move this many months forward
    #[arg(long, default_value_t = 0)]
    pub next: u32,
    /// Move this many months back
    #[arg(long, default_value_t = 0)]
    pub previous: u32,
}

/// Parses `yyyy-mm` into the first day of that month.
pub fn parse_month(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|err| format!("expected a month as yyyy-mm: {err}"))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn month_parses_to_first_day() {
        assert_eq!(
            parse_month("2024-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("February").is_err());
    }

    #[test]
    fn add_collects_repeated_quotes() {
        let cli = Cli::try_parse_from([
            "librolog",
            "add",
            "Dune",
            "--start",
            "2024-03-01",
            "--quote",
            "Fear is the mind-killer.",
            "--quote",
            "The spice must flow.",
        ])
        .unwrap();

        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.title, "Dune");
        assert_eq!(args.fields.quotes.len(), 2);
        assert_eq!(args.fields.start, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn list_filter_and_global_data_file() {
        let cli = Cli::try_parse_from([
            "librolog",
            "list",
            "--filter",
            "finished",
            "--data-file",
            "books.json",
        ])
        .unwrap();

        assert_eq!(cli.data_file, Some(PathBuf::from("books.json")));
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.filter, StatusFilter::Finished);
        assert!(!args.delete_all);
    }

    #[test]
    fn yes_requires_delete_all() {
        assert!(Cli::try_parse_from(["librolog", "list", "--yes"]).is_err());
    }
}
