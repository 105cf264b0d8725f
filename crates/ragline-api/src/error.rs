//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Callers only ever see a generic message for server-side failures; the
//! detail goes to the log.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request could not be parsed (body, path or query string).
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Exchange(#[from] ragline_core::Error),

  /// The detached exchange task panicked or was cancelled.
  #[error("exchange task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use ragline_core::Error as Core;

    let (status, message) = match &self {
      ApiError::BadRequest(m) | ApiError::Exchange(Core::InvalidInput(m)) => {
        (StatusCode::BAD_REQUEST, m.clone())
      }
      ApiError::Exchange(Core::BackendUnavailable(_)) => {
        tracing::error!(error = %self, "answer backend unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, "service unavailable".to_string())
      }
      ApiError::Exchange(Core::Store(_)) | ApiError::Task(_) => {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
