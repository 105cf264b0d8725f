//! `GET /api/health`

use axum::{Json, extract::State, http::StatusCode};
use ragline_core::{backend::AnswerBackend, store::ExchangeStore};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
  /// `"ok"` when the store answers, `"unavailable"` otherwise.
  pub status:  String,
  /// Result of the backend's own health probe. Informational only.
  pub backend: bool,
}

pub async fn handler<S, B>(State(state): State<AppState<S, B>>) -> (StatusCode, Json<Health>)
where
  S: ExchangeStore + 'static,
  B: AnswerBackend + 'static,
{
  let (store, backend) = tokio::join!(
    state.orchestrator.store().ping(),
    state.orchestrator.backend().health(),
  );

  match store {
    Ok(()) => (StatusCode::OK, Json(Health { status: "ok".into(), backend })),
    Err(e) => {
      tracing::error!(error = %e, "store health check failed");
      (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(Health { status: "unavailable".into(), backend }),
      )
    }
  }
}
