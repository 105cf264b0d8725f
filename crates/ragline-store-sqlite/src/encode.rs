//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed nine-digit fraction
//! and a `Z` suffix, so string order is time order and values round-trip
//! exactly. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use ragline_core::{
  exchange::{Exchange, Query, Response, Source},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `queries` row joined with its `responses` row.
pub struct RawExchangeRow {
  // queries columns
  pub query_id:            i64,
  pub user_id:             String,
  pub question:            String,
  pub client_address:      String,
  pub query_created_at:    String,
  // responses columns
  pub response_id:         i64,
  pub answer:              String,
  pub processing_time_ms:  i64,
  pub confidence:          Option<f64>,
  pub response_created_at: String,
}

impl RawExchangeRow {
  pub fn into_exchange(self, sources: Vec<Source>) -> Result<Exchange> {
    let query = Query {
      query_id:       self.query_id,
      user_id:        decode_uuid(&self.user_id)?,
      question:       self.question,
      client_address: self.client_address,
      created_at:     decode_dt(&self.query_created_at)?,
    };

    let response = Response {
      response_id:        self.response_id,
      query_id:           self.query_id,
      answer:             self.answer,
      processing_time_ms: self.processing_time_ms,
      confidence:         self.confidence,
      created_at:         decode_dt(&self.response_created_at)?,
    };

    Ok(Exchange { query, response, sources })
  }
}
