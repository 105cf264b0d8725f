//! `GET /api/rag/history/{user_id}`

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
  },
};
use ragline_core::{backend::AnswerBackend, store::ExchangeStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, view::ExchangeView};

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /api/rag/history/{user_id}[?limit=N]`, newest first.
pub async fn list<S, B>(
  State(state): State<AppState<S, B>>,
  user_id: Result<Path<Uuid>, PathRejection>,
  params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<ExchangeView>>, ApiError>
where
  S: ExchangeStore + 'static,
  B: AnswerBackend + 'static,
{
  let Path(user_id) = user_id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

  let history = state.history.list(user_id, params.limit).await?;
  Ok(Json(history.into_iter().map(ExchangeView::from).collect()))
}
