//! Error taxonomy for `ragline-core`.
//!
//! Every failure of an orchestrated exchange maps to exactly one of these
//! variants. The boxed sources carry full diagnostic detail for logging; the
//! inbound layer is expected to show callers only a generic message.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The request was rejected before any storage was touched.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// The answer-generation backend failed, timed out, or returned a payload
  /// that could not be used.
  #[error("answer backend unavailable: {0}")]
  BackendUnavailable(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn backend<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::BackendUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
