//! In-memory fakes for exercising the orchestrator and history reader.

use std::sync::{
  Mutex,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  backend::{AnswerBackend, BackendAnswer},
  exchange::{Exchange, NewResponse, PendingExchange, Query, Response, Source},
  store::ExchangeStore,
  user::User,
};

#[derive(Debug, Error)]
#[error("fake store failure")]
pub struct FakeStoreError;

#[derive(Default)]
struct Tables {
  users:     Vec<User>,
  queries:   Vec<Query>,
  responses: Vec<(Response, Vec<Source>)>,
  next_id:   i64,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

#[derive(Default)]
pub struct FakeStore {
  tables:           Mutex<Tables>,
  fail_resolves:    AtomicBool,
  fail_begins:      AtomicBool,
  fail_completions: AtomicBool,
  fail_aborts:      AtomicBool,
  fail_reads:       AtomicBool,
}

impl FakeStore {
  pub fn fail_resolves(&self) { self.fail_resolves.store(true, Ordering::SeqCst); }

  pub fn fail_begins(&self) { self.fail_begins.store(true, Ordering::SeqCst); }

  pub fn fail_completions(&self) { self.fail_completions.store(true, Ordering::SeqCst); }

  pub fn fail_aborts(&self) { self.fail_aborts.store(true, Ordering::SeqCst); }

  pub fn fail_reads(&self) { self.fail_reads.store(true, Ordering::SeqCst); }

  pub fn user_count(&self) -> usize { self.tables.lock().unwrap().users.len() }

  pub fn query_count(&self) -> usize { self.tables.lock().unwrap().queries.len() }

  pub fn response_count(&self) -> usize { self.tables.lock().unwrap().responses.len() }
}

impl ExchangeStore for FakeStore {
  type Error = FakeStoreError;

  async fn resolve_user(&self, username: String) -> Result<User, FakeStoreError> {
    if self.fail_resolves.load(Ordering::SeqCst) {
      return Err(FakeStoreError);
    }
    let mut t = self.tables.lock().unwrap();
    if let Some(user) = t.users.iter().find(|u| u.username == username) {
      return Ok(user.clone());
    }
    let user = User { user_id: Uuid::new_v4(), username, created_at: Utc::now() };
    t.users.push(user.clone());
    Ok(user)
  }

  async fn begin_exchange(
    &self,
    user_id: Uuid,
    question: String,
    client_address: String,
  ) -> Result<PendingExchange, FakeStoreError> {
    if self.fail_begins.load(Ordering::SeqCst) {
      return Err(FakeStoreError);
    }
    let mut t = self.tables.lock().unwrap();
    let query = Query {
      query_id: t.next_id(),
      user_id,
      question,
      client_address,
      created_at: Utc::now(),
    };
    t.queries.push(query.clone());
    Ok(PendingExchange::new(query))
  }

  async fn complete_exchange(
    &self,
    pending: &PendingExchange,
    input: NewResponse,
  ) -> Result<Exchange, FakeStoreError> {
    if self.fail_completions.load(Ordering::SeqCst) {
      return Err(FakeStoreError);
    }
    let mut t = self.tables.lock().unwrap();
    let response = Response {
      response_id:        t.next_id(),
      query_id:           pending.query_id(),
      answer:             input.answer,
      processing_time_ms: input.processing_time_ms,
      confidence:         input.confidence,
      created_at:         Utc::now(),
    };
    let sources: Vec<Source> = input
      .sources
      .into_iter()
      .map(|s| Source {
        source_id:   t.next_id(),
        response_id: response.response_id,
        content:     s.content,
        provenance:  s.provenance,
        page:        s.page,
      })
      .collect();
    t.responses.push((response.clone(), sources.clone()));
    Ok(Exchange { query: pending.query().clone(), response, sources })
  }

  async fn abort_exchange(&self, pending: PendingExchange) -> Result<(), FakeStoreError> {
    if self.fail_aborts.load(Ordering::SeqCst) {
      return Err(FakeStoreError);
    }
    let mut t = self.tables.lock().unwrap();
    let query_id = pending.query_id();
    t.queries.retain(|q| q.query_id != query_id);
    t.responses.retain(|(r, _)| r.query_id != query_id);
    Ok(())
  }

  async fn get_history(
    &self,
    user_id: Uuid,
    limit: usize,
  ) -> Result<Vec<Exchange>, FakeStoreError> {
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(FakeStoreError);
    }
    let t = self.tables.lock().unwrap();
    let mut history: Vec<Exchange> = t
      .queries
      .iter()
      .filter(|q| q.user_id == user_id)
      .filter_map(|q| {
        t.responses
          .iter()
          .find(|(r, _)| r.query_id == q.query_id)
          .map(|(r, s)| Exchange { query: q.clone(), response: r.clone(), sources: s.clone() })
      })
      .collect();
    history.sort_by(|a, b| b.query.query_id.cmp(&a.query.query_id));
    history.truncate(limit);
    Ok(history)
  }

  async fn ping(&self) -> Result<(), FakeStoreError> {
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(FakeStoreError);
    }
    Ok(())
  }
}

#[derive(Debug, Error)]
#[error("fake backend unavailable")]
pub struct FakeBackendError;

/// Replays a fixed outcome for every question.
pub struct FakeBackend {
  outcome: Option<BackendAnswer>,
  calls:   AtomicUsize,
}

impl FakeBackend {
  pub fn answering(answer: BackendAnswer) -> Self {
    Self { outcome: Some(answer), calls: AtomicUsize::new(0) }
  }

  pub fn failing() -> Self { Self { outcome: None, calls: AtomicUsize::new(0) } }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl AnswerBackend for FakeBackend {
  type Error = FakeBackendError;

  async fn ask(&self, _question: String) -> Result<BackendAnswer, FakeBackendError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.outcome.clone().ok_or(FakeBackendError)
  }
}

pub fn simple_answer(text: &str) -> BackendAnswer {
  BackendAnswer {
    question:           None,
    answer:             Some(text.into()),
    processing_time_ms: 10,
    confidence:         Some(0.5),
    sources:            Vec::new(),
  }
}
