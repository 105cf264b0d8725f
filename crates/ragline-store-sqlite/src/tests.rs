//! Integration tests for `SqliteStore` against an in-memory database.

use ragline_core::{
  exchange::{NewResponse, NewSource},
  store::ExchangeStore,
};
use uuid::Uuid;

use crate::{SqliteStore, store::UserInsert};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn response(answer: &str, sources: &[(&str, &str, i64)]) -> NewResponse {
  NewResponse {
    answer:             answer.into(),
    processing_time_ms: 1200,
    confidence:         Some(0.92),
    sources:            sources
      .iter()
      .map(|(content, provenance, page)| NewSource {
        content:    (*content).into(),
        provenance: (*provenance).into(),
        page:       *page,
      })
      .collect(),
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolve_user_creates_then_reuses() {
  let s = store().await;

  let first = s.resolve_user("alice".into()).await.unwrap();
  let again = s.resolve_user("alice".into()).await.unwrap();

  assert_eq!(first, again);
  assert_eq!(s.count_users("alice").await.unwrap(), 1);
}

#[tokio::test]
async fn usernames_are_exact() {
  let s = store().await;

  let lower = s.resolve_user("alice".into()).await.unwrap();
  let upper = s.resolve_user("Alice".into()).await.unwrap();

  assert_ne!(lower.user_id, upper.user_id);
}

#[tokio::test]
async fn duplicate_insert_reports_conflict() {
  let s = store().await;
  let existing = s.resolve_user("bob".into()).await.unwrap();

  let mut dup = existing.clone();
  dup.user_id = Uuid::new_v4();

  assert_eq!(s.insert_user(&dup).await.unwrap(), UserInsert::Conflict);
  assert_eq!(s.count_users("bob").await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_first_sightings_create_one_user() {
  let s = store().await;

  let (a, b, c) = tokio::join!(
    s.resolve_user("carol".into()),
    s.resolve_user("carol".into()),
    s.resolve_user("carol".into()),
  );
  let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

  assert_eq!(a.user_id, b.user_id);
  assert_eq!(b.user_id, c.user_id);
  assert_eq!(s.count_users("carol").await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_first_sightings_across_tasks() {
  let s = store().await;

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.resolve_user("dana".into()).await })
    })
    .collect();

  let mut ids = Vec::new();
  for h in handles {
    ids.push(h.await.unwrap().unwrap().user_id);
  }
  ids.dedup();

  assert_eq!(ids.len(), 1);
  assert_eq!(s.count_users("dana").await.unwrap(), 1);
}

// ─── Exchanges ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn complete_exchange_round_trips_through_history() {
  let s = store().await;
  let user = s.resolve_user("alice".into()).await.unwrap();

  let pending = s
    .begin_exchange(user.user_id, "What is the leave policy?".into(), "10.1.2.3".into())
    .await
    .unwrap();
  let committed = s
    .complete_exchange(
      &pending,
      response("Two days a month.", &[
        ("Leave accrues monthly.", "HR-Handbook.pdf", 12),
        ("Carry-over is capped.", "Leave-FAQ.pdf", 3),
        ("Ask your manager.", "Intranet", 0),
      ]),
    )
    .await
    .unwrap();

  assert_eq!(committed.query.query_id, pending.query_id());
  assert_eq!(committed.response.query_id, pending.query_id());

  let history = s.get_history(user.user_id, 20).await.unwrap();
  assert_eq!(history, vec![committed]);

  let provenance: Vec<_> =
    history[0].sources.iter().map(|s| s.provenance.as_str()).collect();
  assert_eq!(provenance, ["HR-Handbook.pdf", "Leave-FAQ.pdf", "Intranet"]);
}

#[tokio::test]
async fn absent_confidence_is_stored_as_null() {
  let s = store().await;
  let user = s.resolve_user("erin".into()).await.unwrap();

  let pending = s
    .begin_exchange(user.user_id, "q".into(), "127.0.0.1".into())
    .await
    .unwrap();
  let mut input = response("a", &[]);
  input.confidence = None;
  s.complete_exchange(&pending, input).await.unwrap();

  let history = s.get_history(user.user_id, 20).await.unwrap();
  assert_eq!(history[0].response.confidence, None);
  assert!(history[0].sources.is_empty());
}

#[tokio::test]
async fn pending_exchange_is_invisible() {
  let s = store().await;
  let user = s.resolve_user("frank".into()).await.unwrap();

  let _pending = s
    .begin_exchange(user.user_id, "still thinking".into(), "127.0.0.1".into())
    .await
    .unwrap();

  assert!(s.get_history(user.user_id, 20).await.unwrap().is_empty());
  assert_eq!(s.count_queries(user.user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn abort_removes_the_query() {
  let s = store().await;
  let user = s.resolve_user("gina".into()).await.unwrap();

  let pending = s
    .begin_exchange(user.user_id, "q".into(), "127.0.0.1".into())
    .await
    .unwrap();
  s.abort_exchange(pending).await.unwrap();

  assert_eq!(s.count_queries(user.user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn abort_never_removes_a_committed_exchange() {
  let s = store().await;
  let user = s.resolve_user("hank".into()).await.unwrap();

  let pending = s
    .begin_exchange(user.user_id, "q".into(), "127.0.0.1".into())
    .await
    .unwrap();
  s.complete_exchange(&pending, response("a", &[])).await.unwrap();
  s.abort_exchange(pending).await.unwrap();

  assert_eq!(s.get_history(user.user_id, 20).await.unwrap().len(), 1);
}

#[tokio::test]
async fn second_response_for_a_query_is_rejected_atomically() {
  let s = store().await;
  let user = s.resolve_user("ivan".into()).await.unwrap();

  let pending = s
    .begin_exchange(user.user_id, "q".into(), "127.0.0.1".into())
    .await
    .unwrap();
  s.complete_exchange(&pending, response("first", &[("a", "A", 1)]))
    .await
    .unwrap();
  let err = s
    .complete_exchange(&pending, response("second", &[("b", "B", 2)]))
    .await;
  assert!(err.is_err());

  let history = s.get_history(user.user_id, 20).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].response.answer, "first");
  assert_eq!(history[0].sources.len(), 1);
}

#[tokio::test]
async fn completing_an_aborted_exchange_fails() {
  let s = store().await;
  let user = s.resolve_user("jade".into()).await.unwrap();

  let pending = s
    .begin_exchange(user.user_id, "q".into(), "127.0.0.1".into())
    .await
    .unwrap();
  let query_id = pending.query_id();
  s.conn
    .call(move |conn| {
      conn.execute("DELETE FROM queries WHERE query_id = ?1", [query_id])?;
      Ok(())
    })
    .await
    .unwrap();

  assert!(s.complete_exchange(&pending, response("a", &[("x", "X", 1)])).await.is_err());
  let orphans: i64 = s
    .conn
    .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM sources", [], |r| r.get(0))?))
    .await
    .unwrap();
  assert_eq!(orphans, 0);
}

#[tokio::test]
async fn query_ids_increase_and_are_not_reused() {
  let s = store().await;
  let user = s.resolve_user("kim".into()).await.unwrap();

  let first = s
    .begin_exchange(user.user_id, "a".into(), "127.0.0.1".into())
    .await
    .unwrap();
  let first_id = first.query_id();
  s.abort_exchange(first).await.unwrap();

  let second = s
    .begin_exchange(user.user_id, "b".into(), "127.0.0.1".into())
    .await
    .unwrap();
  assert!(second.query_id() > first_id);
  s.abort_exchange(second).await.unwrap();
}

// ─── History ─────────────────────────────────────────────────────────────────

async fn seed(s: &SqliteStore, username: &str, count: usize) -> Uuid {
  let user = s.resolve_user(username.into()).await.unwrap();
  for i in 0..count {
    let pending = s
      .begin_exchange(user.user_id, format!("question {i}"), "127.0.0.1".into())
      .await
      .unwrap();
    s.complete_exchange(&pending, response(&format!("answer {i}"), &[]))
      .await
      .unwrap();
  }
  user.user_id
}

#[tokio::test]
async fn history_is_newest_first_and_limited() {
  let s = store().await;
  let user_id = seed(&s, "lena", 5).await;

  let history = s.get_history(user_id, 3).await.unwrap();
  let questions: Vec<_> = history.iter().map(|e| e.query.question.as_str()).collect();
  assert_eq!(questions, ["question 4", "question 3", "question 2"]);

  for pair in history.windows(2) {
    assert!(pair[0].query.created_at >= pair[1].query.created_at);
  }
}

#[tokio::test]
async fn history_is_scoped_to_the_user() {
  let s = store().await;
  let mia = seed(&s, "mia", 2).await;
  let ned = seed(&s, "ned", 3).await;

  assert_eq!(s.get_history(mia, 20).await.unwrap().len(), 2);
  assert_eq!(s.get_history(ned, 20).await.unwrap().len(), 3);
}

#[tokio::test]
async fn ping_succeeds_on_an_open_store() {
  store().await.ping().await.unwrap();
}

#[tokio::test]
async fn history_for_unknown_user_is_empty() {
  let s = store().await;
  assert!(s.get_history(Uuid::new_v4(), 20).await.unwrap().is_empty());
}

// ─── Referential integrity ───────────────────────────────────────────────────

#[tokio::test]
async fn deleting_a_user_cascades() {
  let s = store().await;
  let user = s.resolve_user("omar".into()).await.unwrap();
  let pending = s
    .begin_exchange(user.user_id, "q".into(), "127.0.0.1".into())
    .await
    .unwrap();
  s.complete_exchange(&pending, response("a", &[("x", "X", 1), ("y", "Y", 2)]))
    .await
    .unwrap();

  let id = user.user_id.hyphenated().to_string();
  let remaining: (i64, i64, i64) = s
    .conn
    .call(move |conn| {
      conn.execute("DELETE FROM users WHERE user_id = ?1", [&id])?;
      let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
      };
      Ok((count("queries")?, count("responses")?, count("sources")?))
    })
    .await
    .unwrap();

  assert_eq!(remaining, (0, 0, 0));
}

// ─── Recovery ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_purges_pending_queries() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("ragline.db");

  let user_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let user_id = seed(&s, "pia", 1).await;
    let _pending = s
      .begin_exchange(user_id, "interrupted".into(), "127.0.0.1".into())
      .await
      .unwrap();
    assert_eq!(s.count_queries(user_id).await.unwrap(), 2);
    user_id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.count_queries(user_id).await.unwrap(), 1);
  assert_eq!(s.get_history(user_id, 20).await.unwrap().len(), 1);
}
