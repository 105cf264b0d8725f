//! Exchange records: a query, its response, and the ordered sources that
//! support the answer.
//!
//! Queries, responses and sources are immutable once written. A query only
//! becomes part of a visible [`Exchange`] when its response is committed; until
//! then it is held by a [`PendingExchange`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provenance label recorded when the backend does not name a source.
pub const DEFAULT_PROVENANCE: &str = "Unknown";

// ─── Persisted records ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
  /// Store-assigned, monotonically increasing.
  pub query_id:       i64,
  pub user_id:        Uuid,
  pub question:       String,
  pub client_address: String,
  pub created_at:     DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
  pub response_id:        i64,
  pub query_id:           i64,
  pub answer:             String,
  pub processing_time_ms: i64,
  /// In `0.0..=1.0` when present.
  pub confidence:         Option<f64>,
  pub created_at:         DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
  pub source_id:   i64,
  pub response_id: i64,
  pub content:     String,
  pub provenance:  String,
  pub page:        i64,
}

/// A committed query/response/sources triple.
///
/// This is both the result of a successful submission and the unit returned
/// by history reads; the two compare equal for the same exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
  pub query:    Query,
  pub response: Response,
  /// In insertion order.
  pub sources:  Vec<Source>,
}

// ─── Write inputs ────────────────────────────────────────────────────────────

/// A source excerpt to be stored with a response.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSource {
  pub content:    String,
  pub provenance: String,
  pub page:       i64,
}

/// Everything needed to commit a response for a pending query.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResponse {
  pub answer:             String,
  pub processing_time_ms: i64,
  pub confidence:         Option<f64>,
  pub sources:            Vec<NewSource>,
}

// ─── Transaction handle ──────────────────────────────────────────────────────

/// Handle on a recorded query whose response has not been committed yet.
///
/// Returned by [`ExchangeStore::begin_exchange`] and threaded through the
/// rest of the exchange. It must end in either
/// [`ExchangeStore::complete_exchange`] or [`ExchangeStore::abort_exchange`];
/// a pending query is never visible in history.
///
/// [`ExchangeStore::begin_exchange`]: crate::store::ExchangeStore::begin_exchange
/// [`ExchangeStore::complete_exchange`]: crate::store::ExchangeStore::complete_exchange
/// [`ExchangeStore::abort_exchange`]: crate::store::ExchangeStore::abort_exchange
#[derive(Debug)]
#[must_use = "a pending exchange must be completed or aborted"]
pub struct PendingExchange {
  query: Query,
}

impl PendingExchange {
  pub fn new(query: Query) -> Self { Self { query } }

  pub fn query(&self) -> &Query { &self.query }

  pub fn query_id(&self) -> i64 { self.query.query_id }
}
