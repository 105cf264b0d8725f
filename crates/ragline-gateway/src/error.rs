//! Error type for `ragline-gateway`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid backend endpoint {endpoint:?}: {reason}")]
  Endpoint { endpoint: String, reason: String },

  #[error("request to backend failed: {0}")]
  Transport(#[from] reqwest::Error),

  /// The backend answered with a non-success status. The body is logged,
  /// not carried.
  #[error("backend returned {0}")]
  Status(StatusCode),

  #[error("backend returned an empty body")]
  EmptyBody,

  #[error("malformed backend payload: {0}")]
  Malformed(#[from] serde_json::Error),

  #[error("invalid backend payload: {0}")]
  Invalid(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
