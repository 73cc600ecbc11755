//! `librolog_core`
//!
//! Platform-independent logic of LibroLog: the reading record model, its persistence, the monthly
//! calendar and list projections, status counters, and the optional enrichment client. The
//! command-line front end in `librolog` only renders what this crate computes.

pub mod calendar;

pub mod enrichment;

pub mod list;

pub mod record;

pub mod store;

pub mod summary;
