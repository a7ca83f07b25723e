//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Missing datasets and missing years are not errors — the query layer
//! answers those with empty collections or sentinels. What remains is
//! infrastructure failure (store I/O) plus tool-dispatch misuse.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler or the tool dispatcher.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unknown tool: {0}")]
  UnknownTool(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl ApiError {
  /// Wrap a backend error from any [`pitview_core::StatStore`] impl.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::UnknownTool(m) => {
        (StatusCode::NOT_FOUND, format!("unknown tool: {m}"))
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      ApiError::Serialization(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
