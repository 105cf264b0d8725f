//! The exchange orchestrator.
//!
//! One call to [`Orchestrator::submit`] walks a single question through the
//! states below. The store half of the exchange is all-or-nothing: once the
//! query is recorded, the only ways out are a committed response or a rollback
//! that removes the query again.
//!
//! ```text
//! Validating ─► ResolvingUser ─► RecordingQuery ─► CallingBackend ─► PersistingResult ─► Committed
//!     │               │                │                 │                  │
//!     ▼               └────────────────┴────────┬────────┴──────────────────┘
//!  Rejected                                     ▼
//!                                           RolledBack
//! ```

use std::sync::Arc;

use tracing::Span;

use crate::{
  Error, Result,
  backend::{AnswerBackend, BackendAnswer},
  exchange::{DEFAULT_PROVENANCE, Exchange, NewResponse, NewSource, PendingExchange},
  store::ExchangeStore,
  user::MAX_USERNAME_LEN,
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// An incoming question from an identified user.
#[derive(Debug, Clone)]
pub struct Submission {
  pub username:       String,
  pub question:       String,
  /// Network address the request originated from.
  pub client_address: String,
}

// ─── State machine ───────────────────────────────────────────────────────────

/// Where an exchange is in its lifecycle.
///
/// `RolledBack` is the single failure state once the store has been touched.
/// It is also reached from `ResolvingUser`: nothing has been recorded at that
/// point, so no store rollback is issued and the state only marks the
/// exchange as failed with a server error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
  Validating,
  ResolvingUser,
  RecordingQuery,
  CallingBackend,
  PersistingResult,
  Committed,
  RolledBack,
  Rejected,
}

impl ExchangeState {
  /// Whether `self -> next` is a legal transition.
  pub fn can_advance_to(self, next: Self) -> bool {
    use ExchangeState::*;
    matches!(
      (self, next),
      (Validating, ResolvingUser)
        | (Validating, Rejected)
        | (ResolvingUser, RecordingQuery)
        | (RecordingQuery, CallingBackend)
        | (CallingBackend, PersistingResult)
        | (PersistingResult, Committed)
        | (
          ResolvingUser | RecordingQuery | CallingBackend | PersistingResult,
          RolledBack
        )
    )
  }
}

/// Tracks the current state of one exchange and logs each transition.
#[derive(Debug)]
struct Progress {
  state: ExchangeState,
}

impl Progress {
  fn new() -> Self { Self { state: ExchangeState::Validating } }

  fn advance(&mut self, next: ExchangeState) {
    debug_assert!(
      self.state.can_advance_to(next),
      "illegal exchange transition {:?} -> {:?}",
      self.state,
      next,
    );
    tracing::debug!(from = ?self.state, to = ?next, "exchange transition");
    self.state = next;
  }
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Sequences identity resolution, query recording, the backend call and
/// result persistence for each submitted question.
///
/// Holds no per-request state, so a single instance is shared by all
/// concurrent requests.
pub struct Orchestrator<S, B> {
  store:   Arc<S>,
  backend: Arc<B>,
}

impl<S, B> Clone for Orchestrator<S, B> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), backend: Arc::clone(&self.backend) }
  }
}

impl<S, B> Orchestrator<S, B>
where
  S: ExchangeStore,
  B: AnswerBackend,
{
  pub fn new(store: Arc<S>, backend: Arc<B>) -> Self { Self { store, backend } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn backend(&self) -> &Arc<B> { &self.backend }

  /// Run one question through to a committed exchange, or fail leaving no
  /// trace of it in the store.
  #[tracing::instrument(
    name = "exchange",
    skip_all,
    fields(username = %submission.username, query_id = tracing::field::Empty),
  )]
  pub async fn submit(&self, submission: Submission) -> Result<Exchange> {
    let mut progress = Progress::new();

    if let Err(e) = validate(&submission) {
      progress.advance(ExchangeState::Rejected);
      tracing::info!("rejected submission: {e}");
      return Err(e);
    }

    progress.advance(ExchangeState::ResolvingUser);
    let user = match self.store.resolve_user(submission.username).await {
      Ok(user) => user,
      Err(e) => {
        progress.advance(ExchangeState::RolledBack);
        tracing::error!(error = %e, "failed to resolve user");
        return Err(Error::store(e));
      }
    };

    progress.advance(ExchangeState::RecordingQuery);
    let pending = match self
      .store
      .begin_exchange(user.user_id, submission.question.clone(), submission.client_address)
      .await
    {
      Ok(pending) => pending,
      Err(e) => {
        progress.advance(ExchangeState::RolledBack);
        tracing::error!(error = %e, "failed to record query");
        return Err(Error::store(e));
      }
    };
    Span::current().record("query_id", pending.query_id());

    progress.advance(ExchangeState::CallingBackend);
    let answer = match self.backend.ask(submission.question).await {
      Ok(answer) => answer,
      Err(e) => {
        tracing::warn!(error = %e, "answer backend failed");
        self.roll_back(pending, &mut progress).await;
        return Err(Error::backend(e));
      }
    };

    progress.advance(ExchangeState::PersistingResult);
    if let Some(echo) = answer.question.as_deref()
      && echo != pending.query().question
    {
      tracing::debug!(echo, "backend echoed a different question");
    }
    let response = into_new_response(answer);

    match self.store.complete_exchange(&pending, response).await {
      Ok(exchange) => {
        progress.advance(ExchangeState::Committed);
        tracing::info!(
          response_id = exchange.response.response_id,
          sources = exchange.sources.len(),
          "exchange committed",
        );
        Ok(exchange)
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to persist response");
        self.roll_back(pending, &mut progress).await;
        Err(Error::store(e))
      }
    }
  }

  /// Remove the pending query.
  ///
  /// A failed abort is logged and not retried, and the caller still gets the
  /// error that caused the rollback. The query then stays in the store with
  /// no response until the store is next opened, which purges it. It is never
  /// visible in history meanwhile, but it does count towards the user's
  /// recorded queries.
  async fn roll_back(&self, pending: PendingExchange, progress: &mut Progress) {
    let query_id = pending.query_id();
    if let Err(e) = self.store.abort_exchange(pending).await {
      tracing::error!(query_id, error = %e, "failed to roll back pending query");
    }
    progress.advance(ExchangeState::RolledBack);
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn validate(submission: &Submission) -> Result<()> {
  if submission.username.trim().is_empty() {
    return Err(Error::InvalidInput("username must not be empty".into()));
  }
  if submission.username.chars().count() > MAX_USERNAME_LEN {
    return Err(Error::InvalidInput(format!(
      "username must be at most {MAX_USERNAME_LEN} characters"
    )));
  }
  if submission.question.trim().is_empty() {
    return Err(Error::InvalidInput("question must not be empty".into()));
  }
  Ok(())
}

/// Apply the defaults for fields the backend left out.
fn into_new_response(answer: BackendAnswer) -> NewResponse {
  let sources = answer
    .sources
    .into_iter()
    .map(|s| NewSource {
      content:    s.content.unwrap_or_default(),
      provenance: s
        .source
        .filter(|label| !label.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROVENANCE.to_owned()),
      page:       s.page,
    })
    .collect();

  NewResponse {
    answer: answer.answer.unwrap_or_default(),
    processing_time_ms: answer.processing_time_ms,
    confidence: answer.confidence,
    sources,
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
