//! Handler for `GET /filters`.

use std::sync::Arc;

use axum::{Json, extract::State};
use pitview_core::{records::FilterOptions, store::StatStore};

use crate::error::ApiError;

/// `GET /filters` — available years and regions for the other endpoints.
///
/// Call this first to see what values are valid elsewhere. Regions are
/// empty when the geography dataset is absent.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<FilterOptions>, ApiError>
where
  S: StatStore,
{
  let options = store.filter_options().await.map_err(ApiError::store)?;
  Ok(Json(options))
}
