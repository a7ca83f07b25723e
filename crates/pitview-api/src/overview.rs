//! Handler for `GET /overview`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use pitview_core::{records::Overview, store::StatStore};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct OverviewParams {
  /// PIT count year; defaults to the most recent year present.
  pub year: Option<i32>,
}

/// `GET /overview[?year=<year>]` — headline figures with year-over-year
/// change. A year with no data returns the zero-filled record, not an
/// error.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<OverviewParams>,
) -> Result<Json<Overview>, ApiError>
where
  S: StatStore,
{
  let overview =
    store.overview(params.year).await.map_err(ApiError::store)?;
  Ok(Json(overview))
}
