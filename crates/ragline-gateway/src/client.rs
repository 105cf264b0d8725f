//! [`Gateway`], the `reqwest` implementation of [`AnswerBackend`].

use std::time::Instant;

use ragline_core::backend::{AnswerBackend, BackendAnswer};
use reqwest::{Client, Url};

use crate::{
  Error, GatewayConfig, Result,
  wire::{AskRequest, parse_answer},
};

/// How much of an error body is kept for the log line.
const LOGGED_BODY_LIMIT: usize = 512;

/// Async HTTP client for the answer-generation backend.
///
/// Owns a dedicated [`reqwest::Client`] carrying the long answer timeout, so
/// no other outbound traffic shares it. Cheap to clone.
#[derive(Clone)]
pub struct Gateway {
  client:         Client,
  endpoint:       Url,
  health:         Url,
  health_timeout: std::time::Duration,
}

impl Gateway {
  pub fn new(config: &GatewayConfig) -> Result<Self> {
    let endpoint = Url::parse(&config.endpoint).map_err(|e| Error::Endpoint {
      endpoint: config.endpoint.clone(),
      reason:   e.to_string(),
    })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
      return Err(Error::Endpoint {
        endpoint: config.endpoint.clone(),
        reason:   format!("unsupported scheme {:?}", endpoint.scheme()),
      });
    }
    let health = endpoint.join("/health").map_err(|e| Error::Endpoint {
      endpoint: config.endpoint.clone(),
      reason:   e.to_string(),
    })?;

    let client = Client::builder().timeout(config.timeout()).build()?;

    Ok(Self { client, endpoint, health, health_timeout: config.health_timeout() })
  }

  pub fn endpoint(&self) -> &Url { &self.endpoint }

  /// `POST <endpoint>` with `{"question": ...}`.
  pub async fn ask_question(&self, question: &str) -> Result<BackendAnswer> {
    let started = Instant::now();

    let resp = self
      .client
      .post(self.endpoint.clone())
      .json(&AskRequest { question })
      .send()
      .await?;

    let status = resp.status();
    let body = resp.bytes().await?;
    let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

    if !status.is_success() {
      let text = String::from_utf8_lossy(&body);
      let excerpt: String = text.chars().take(LOGGED_BODY_LIMIT).collect();
      tracing::error!(%status, body = %excerpt, elapsed_ms, "backend returned an error status");
      return Err(Error::Status(status));
    }

    let answer = parse_answer(&body, elapsed_ms).inspect_err(|e| {
      tracing::error!(error = %e, elapsed_ms, "backend returned an unusable payload");
    })?;

    tracing::debug!(
      elapsed_ms,
      sources = answer.sources.len(),
      "backend answered",
    );
    Ok(answer)
  }

  /// `GET /health` on the backend's origin. Any failure reads as unhealthy.
  pub async fn probe_health(&self) -> bool {
    match self
      .client
      .get(self.health.clone())
      .timeout(self.health_timeout)
      .send()
      .await
    {
      Ok(resp) => resp.status().is_success(),
      Err(e) => {
        tracing::debug!(error = %e, "backend health probe failed");
        false
      }
    }
  }
}

impl AnswerBackend for Gateway {
  type Error = Error;

  async fn ask(&self, question: String) -> Result<BackendAnswer> {
    self.ask_question(&question).await
  }

  async fn health(&self) -> bool { self.probe_health().await }
}
