//! Error type for `ragline-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A username insert conflicted, yet no row was found on re-lookup.
  #[error("user {0:?} vanished while being resolved")]
  UserVanished(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
