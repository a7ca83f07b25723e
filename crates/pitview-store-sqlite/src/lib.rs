//! SQLite backend for the pitview statistics service.
//!
//! Two halves, one file format:
//!
//! - [`builder`] — the offline aggregation builder. Reads the
//!   manually-curated raw CSVs plus the external budget cross-reference and
//!   rebuilds the aggregated SQLite file wholesale (write temp, rename).
//! - [`SqliteStore`] — the query layer. Implements
//!   [`pitview_core::StatStore`] with a fresh read-only connection per
//!   operation via [`tokio_rusqlite`], so database access never blocks the
//!   async runtime and a builder re-run is picked up by the next request.

pub mod builder;
mod parse;
mod schema;
mod store;

pub mod error;

pub use builder::{BuildSummary, RawSources, build};
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
