//! JSON REST API for pitview.
//!
//! Exposes an axum [`Router`] backed by any [`pitview_core::StatStore`].
//! Transport concerns (bind address, tracing layers, health endpoints) are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(pitview_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod filters;
pub mod overview;
pub mod series;
pub mod tools;

use std::sync::Arc;

use axum::{Router, routing::get};
use pitview_core::store::StatStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// One route per query operation; every route is a pure read with the
/// defaults defined by the query layer.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: StatStore + 'static,
{
  Router::new()
    .route("/filters", get(filters::handler::<S>))
    .route("/overview", get(overview::handler::<S>))
    .route("/trends", get(series::trends::<S>))
    .route("/subpopulations", get(series::subpopulations::<S>))
    .route("/geography", get(series::geography::<S>))
    .route("/spending", get(series::spending::<S>))
    .with_state(store)
}
