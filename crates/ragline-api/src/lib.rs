//! JSON-over-HTTP front end for ragline.
//!
//! Exposes an axum [`Router`] backed by any [`ExchangeStore`] and
//! [`AnswerBackend`]. The `ragline-server` binary wires it to the SQLite store
//! and the HTTP gateway.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/rag/ask` | Body: `{"username":"…","question":"…"}` |
//! | `GET`  | `/api/rag/history/{userId}` | Optional `?limit=N` |
//! | `GET`  | `/api/health` | Store and backend reachability |

pub mod error;
pub mod exchange;
pub mod extract;
pub mod health;
pub mod history;
pub mod view;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use ragline_core::{
  backend::AnswerBackend,
  history::{HistoryLimits, HistoryReader},
  orchestrator::Orchestrator,
  store::ExchangeStore,
};
use ragline_gateway::GatewayConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RAGLINE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  pub backend:    GatewayConfig,
  #[serde(default)]
  pub history:    HistoryLimits,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("ragline.db") }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, B> {
  pub orchestrator: Orchestrator<S, B>,
  pub history:      HistoryReader<S>,
}

impl<S, B> Clone for AppState<S, B> {
  fn clone(&self) -> Self {
    Self { orchestrator: self.orchestrator.clone(), history: self.history.clone() }
  }
}

impl<S, B> AppState<S, B>
where
  S: ExchangeStore,
  B: AnswerBackend,
{
  pub fn new(store: Arc<S>, backend: Arc<B>, limits: HistoryLimits) -> Self {
    Self {
      history:      HistoryReader::new(Arc::clone(&store), limits),
      orchestrator: Orchestrator::new(store, backend),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router. Serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()` so client addresses
/// are recorded.
pub fn router<S, B>(state: AppState<S, B>) -> Router
where
  S: ExchangeStore + 'static,
  B: AnswerBackend + 'static,
{
  Router::new()
    .route("/api/rag/ask",               post(exchange::ask::<S, B>))
    .route("/api/rag/history/{user_id}", get(history::list::<S, B>))
    .route("/api/health",                get(health::handler::<S, B>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
