//! Wire shapes exchanged with the backend, and validation of what comes back.

use ragline_core::backend::{BackendAnswer, BackendSource};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Serialize)]
pub struct AskRequest<'a> {
  pub question: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAnswer {
  pub question:           Option<String>,
  pub answer:             Option<String>,
  pub processing_time_ms: Option<i64>,
  pub confidence:         Option<f64>,
  pub sources:            Option<Vec<WireSource>>,
}

#[derive(Debug, Deserialize)]
pub struct WireSource {
  pub content: Option<String>,
  pub source:  Option<String>,
  pub page:    Option<i64>,
}

/// Parse a response body into a validated answer. `elapsed_ms` stands in for
/// a processing time the backend did not report.
pub fn parse_answer(body: &[u8], elapsed_ms: i64) -> Result<BackendAnswer> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Err(Error::EmptyBody);
  }

  let wire: Option<WireAnswer> = serde_json::from_slice(body)?;
  let wire = wire.ok_or(Error::EmptyBody)?;

  if let Some(c) = wire.confidence
    && !(c.is_finite() && (0.0..=1.0).contains(&c))
  {
    return Err(Error::Invalid(format!("confidence {c} outside 0.0..=1.0")));
  }

  let processing_time_ms = match wire.processing_time_ms {
    Some(ms) if ms < 0 => {
      return Err(Error::Invalid(format!("negative processingTimeMs {ms}")));
    }
    Some(ms) => ms,
    None => elapsed_ms,
  };

  let sources = wire
    .sources
    .unwrap_or_default()
    .into_iter()
    .map(|s| {
      let page = s.page.unwrap_or(0);
      if page < 0 {
        return Err(Error::Invalid(format!("negative page {page}")));
      }
      Ok(BackendSource { content: s.content, source: s.source, page })
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(BackendAnswer {
    question: wire.question,
    answer: wire.answer,
    processing_time_ms,
    confidence: wire.confidence,
    sources,
  })
}
