//! JSON shapes returned to API callers.
//!
//! A submission result and a history entry share one shape, so a client can
//! compare what it was told at submit time with what history reports later.

use chrono::{DateTime, Utc};
use ragline_core::exchange::{Exchange, Source};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeView {
  pub query_id:           i64,
  pub response_id:        i64,
  pub user_id:            Uuid,
  pub question:           String,
  pub answer:             String,
  pub processing_time_ms: i64,
  pub confidence:         Option<f64>,
  pub sources:            Vec<SourceView>,
  /// When the question was recorded.
  pub timestamp:          DateTime<Utc>,
  /// When the answer was committed.
  pub answered_at:        DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceView {
  pub content: String,
  /// Provenance label, e.g. a document name.
  pub source:  String,
  pub page:    i64,
}

impl From<Source> for SourceView {
  fn from(s: Source) -> Self {
    Self { content: s.content, source: s.provenance, page: s.page }
  }
}

impl From<Exchange> for ExchangeView {
  fn from(e: Exchange) -> Self {
    Self {
      query_id:           e.query.query_id,
      response_id:        e.response.response_id,
      user_id:            e.query.user_id,
      question:           e.query.question,
      answer:             e.response.answer,
      processing_time_ms: e.response.processing_time_ms,
      confidence:         e.response.confidence,
      sources:            e.sources.into_iter().map(SourceView::from).collect(),
      timestamp:          e.query.created_at,
      answered_at:        e.response.created_at,
    }
  }
}
