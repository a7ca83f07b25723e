//! Core types and trait definitions for the pitview statistics service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod query;
pub mod records;
pub mod store;
pub mod validate;

pub use query::{FiscalYearRange, YearRange};
pub use records::{
  FilterOptions, GeographyRecord, Overview, SpendingRecord,
  SubpopulationRecord, TrendRecord,
};
pub use store::StatStore;
