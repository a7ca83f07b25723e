//! The `StatStore` trait — the query contract every front end consumes.
//!
//! The trait is implemented by storage backends (e.g.
//! `pitview-store-sqlite`). Higher layers (HTTP API, tool dispatch, CLI)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  query::{FiscalYearRange, YearRange},
  records::{
    FilterOptions, GeographyRecord, Overview, SpendingRecord,
    SubpopulationRecord, TrendRecord,
  },
};

/// Abstraction over the derived homelessness datasets.
///
/// All six operations are pure reads over data that is immutable for the
/// lifetime of the serving process (the only writer is the offline
/// aggregation builder). They are side-effect-free, independent of call
/// order, and safe to invoke concurrently.
///
/// A dataset that was never produced is "no data": operations return empty
/// collections or the zero-filled [`Overview`] sentinel, never an error.
/// The only errors implementations may surface are infrastructure-level
/// (I/O) failures.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StatStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Distinct years in the trend dataset and distinct regions in the
  /// geography dataset, both ascending.
  fn filter_options(
    &self,
  ) -> impl Future<Output = Result<FilterOptions, Self::Error>> + Send + '_;

  /// Headline figures for `year` (default: the most recent year present)
  /// with a comparison against `year - 1` when that year exists.
  fn overview(
    &self,
    year: Option<i32>,
  ) -> impl Future<Output = Result<Overview, Self::Error>> + Send + '_;

  /// Trend rows within the inclusive `range`, ascending by year.
  fn trends(
    &self,
    range: YearRange,
  ) -> impl Future<Output = Result<Vec<TrendRecord>, Self::Error>> + Send + '_;

  /// Subgroup rows within `range`, optionally restricted to an exact
  /// `group` name, ordered by (year, group_name). An unknown group yields
  /// an empty collection.
  fn subpopulations(
    &self,
    range: YearRange,
    group: Option<String>,
  ) -> impl Future<Output = Result<Vec<SubpopulationRecord>, Self::Error>>
  + Send
  + '_;

  /// Subregional rows for `year` (default: the most recent year present in
  /// the geography dataset), optionally restricted to an exact `region`,
  /// ordered by total descending.
  fn geography(
    &self,
    year:   Option<i32>,
    region: Option<String>,
  ) -> impl Future<Output = Result<Vec<GeographyRecord>, Self::Error>>
  + Send
  + '_;

  /// Spending rows within the inclusive fiscal-year `range`, ascending.
  /// Empty when the spending dataset was never produced.
  fn spending(
    &self,
    range: FiscalYearRange,
  ) -> impl Future<Output = Result<Vec<SpendingRecord>, Self::Error>>
  + Send
  + '_;
}
