//! `POST /api/rag/ask`

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use ragline_core::{backend::AnswerBackend, orchestrator::Submission, store::ExchangeStore};
use serde::Deserialize;

use crate::{AppState, error::ApiError, extract::ClientAddress, view::ExchangeView};

/// Missing and `null` fields read as empty and are rejected by validation.
#[derive(Debug, Deserialize)]
pub struct AskBody {
  pub username: Option<String>,
  pub question: Option<String>,
}

/// `POST /api/rag/ask`, body: `{"username":"alice","question":"…"}`
///
/// The exchange runs on its own task. If the client goes away mid-request the
/// backend call still finishes and the exchange is committed or rolled back.
pub async fn ask<S, B>(
  State(state): State<AppState<S, B>>,
  ClientAddress(client_address): ClientAddress,
  body: Result<Json<AskBody>, JsonRejection>,
) -> Result<Json<ExchangeView>, ApiError>
where
  S: ExchangeStore + 'static,
  B: AnswerBackend + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let submission = Submission {
    username: body.username.unwrap_or_default(),
    question: body.question.unwrap_or_default(),
    client_address,
  };

  let orchestrator = state.orchestrator.clone();
  let exchange = tokio::spawn(async move { orchestrator.submit(submission).await }).await??;

  Ok(Json(exchange.into()))
}
