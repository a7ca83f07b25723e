//! Handlers for the series endpoints: `/trends`, `/subpopulations`,
//! `/geography`, `/spending`.
//!
//! Query params map directly onto the query-layer parameter types; omitted
//! bounds fall back to the defaults those types define (2011–2024 for PIT
//! years, FY2021–FY2026 for spending).

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use pitview_core::{
  query::{FiscalYearRange, YearRange},
  records::{GeographyRecord, SpendingRecord, SubpopulationRecord, TrendRecord},
  store::StatStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Param types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct YearRangeParams {
  pub year_min: Option<i32>,
  pub year_max: Option<i32>,
}

impl YearRangeParams {
  fn into_range(self) -> YearRange {
    let defaults = YearRange::default();
    YearRange {
      year_min: self.year_min.unwrap_or(defaults.year_min),
      year_max: self.year_max.unwrap_or(defaults.year_max),
    }
  }
}

#[derive(Debug, Deserialize, Default)]
pub struct SubpopulationParams {
  pub year_min: Option<i32>,
  pub year_max: Option<i32>,
  /// Exact group name, e.g. `Veterans` or `Chronically Homeless`.
  pub group:    Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GeographyParams {
  /// Defaults to the most recent year in the geography dataset.
  pub year:   Option<i32>,
  /// Exact region name, e.g. `City of San Diego`.
  pub region: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SpendingParams {
  pub fy_min: Option<i32>,
  pub fy_max: Option<i32>,
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /trends[?year_min=...][&year_max=...]`
pub async fn trends<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<YearRangeParams>,
) -> Result<Json<Vec<TrendRecord>>, ApiError>
where
  S: StatStore,
{
  let rows = store
    .trends(params.into_range())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /subpopulations[?year_min=...][&year_max=...][&group=...]`
pub async fn subpopulations<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SubpopulationParams>,
) -> Result<Json<Vec<SubpopulationRecord>>, ApiError>
where
  S: StatStore,
{
  let range = YearRangeParams {
    year_min: params.year_min,
    year_max: params.year_max,
  }
  .into_range();

  let rows = store
    .subpopulations(range, params.group)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /geography[?year=...][&region=...]`
pub async fn geography<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<GeographyParams>,
) -> Result<Json<Vec<GeographyRecord>>, ApiError>
where
  S: StatStore,
{
  let rows = store
    .geography(params.year, params.region)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /spending[?fy_min=...][&fy_max=...]`
pub async fn spending<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SpendingParams>,
) -> Result<Json<Vec<SpendingRecord>>, ApiError>
where
  S: StatStore,
{
  let defaults = FiscalYearRange::default();
  let range = FiscalYearRange {
    fy_min: params.fy_min.unwrap_or(defaults.fy_min),
    fy_max: params.fy_max.unwrap_or(defaults.fy_max),
  };

  let rows = store.spending(range).await.map_err(ApiError::store)?;
  Ok(Json(rows))
}
