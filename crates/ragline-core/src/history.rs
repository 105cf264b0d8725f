//! Read-only view over a user's past exchanges.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::{Error, Result, exchange::Exchange, store::ExchangeStore};

pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const MAX_HISTORY_LIMIT: usize = 200;

/// Bounds applied to caller-supplied history limits, deserialised from the
/// `[history]` table of `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryLimits {
  /// Used when the caller gives no limit.
  pub default_limit: usize,
  /// Upper clamp for any requested limit.
  pub max_limit:     usize,
}

impl Default for HistoryLimits {
  fn default() -> Self {
    Self { default_limit: DEFAULT_HISTORY_LIMIT, max_limit: MAX_HISTORY_LIMIT }
  }
}

impl HistoryLimits {
  pub fn resolve(&self, requested: Option<usize>) -> usize {
    requested.unwrap_or(self.default_limit).min(self.max_limit)
  }
}

/// Lists committed exchanges, newest first.
pub struct HistoryReader<S> {
  store:  Arc<S>,
  limits: HistoryLimits,
}

impl<S> Clone for HistoryReader<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), limits: self.limits }
  }
}

impl<S: ExchangeStore> HistoryReader<S> {
  pub fn new(store: Arc<S>, limits: HistoryLimits) -> Self { Self { store, limits } }

  /// An empty list means "no history", never an error.
  pub async fn list(&self, user_id: Uuid, limit: Option<usize>) -> Result<Vec<Exchange>> {
    let limit = self.limits.resolve(limit);
    if limit == 0 {
      return Ok(Vec::new());
    }

    self.store.get_history(user_id, limit).await.map_err(|e| {
      tracing::error!(%user_id, error = %e, "failed to read history");
      Error::store(e)
    })
  }
}
