//! Reading records
//!
//! The `Record` type is the single persisted entity of the reading log. Everything else in this
//! crate (calendar grid, list view, summary counters) is derived from a slice of records.
pub mod draft;
pub mod rating;
pub mod types;
