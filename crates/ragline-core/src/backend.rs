//! The `AnswerBackend` trait and the answer shape it produces.

use std::future::Future;

/// One supporting excerpt as reported by the backend. Missing fields are
/// defaulted by the orchestrator, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSource {
  pub content: Option<String>,
  pub source:  Option<String>,
  pub page:    i64,
}

/// A structurally valid answer from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendAnswer {
  /// The question as echoed back by the backend, if it did.
  pub question:           Option<String>,
  pub answer:             Option<String>,
  pub processing_time_ms: i64,
  pub confidence:         Option<f64>,
  pub sources:            Vec<BackendSource>,
}

/// The external answer-generation service.
///
/// Implementations must not retry internally. Any failure, whether transport,
/// status or payload shape, is reported as `Err` and treated by the
/// orchestrator as "backend unavailable".
pub trait AnswerBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn ask(
    &self,
    question: String,
  ) -> impl Future<Output = Result<BackendAnswer, Self::Error>> + Send + '_;

  /// Whether the backend currently looks reachable. Backends without a probe
  /// report healthy.
  fn health(&self) -> impl Future<Output = bool> + Send + '_ { async { true } }
}
