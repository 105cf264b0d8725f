//! The `ExchangeStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `ragline-store-sqlite`).
//! The orchestrator and the history reader depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  exchange::{Exchange, NewResponse, PendingExchange},
  user::User,
};

/// Durable storage for users and their exchanges.
///
/// Writes for one exchange are split around the external backend call:
/// [`begin_exchange`](Self::begin_exchange) records the query and hands back a
/// [`PendingExchange`], which is then either committed with
/// [`complete_exchange`](Self::complete_exchange) or rolled back with
/// [`abort_exchange`](Self::abort_exchange). No lock may be held between the
/// two halves.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ExchangeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identity ──────────────────────────────────────────────────────────

  /// Return the user with exactly this username, creating it on first sight.
  ///
  /// Usernames are unique at the store. An insert that loses a race against
  /// a concurrent creation of the same username resolves to the winner's row.
  fn resolve_user(
    &self,
    username: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Exchange writes ───────────────────────────────────────────────────

  /// Record a query for `user_id`. The timestamp and identifier are assigned
  /// by the store.
  fn begin_exchange(
    &self,
    user_id: Uuid,
    question: String,
    client_address: String,
  ) -> impl Future<Output = Result<PendingExchange, Self::Error>> + Send + '_;

  /// Atomically write the response and its ordered sources for `pending`.
  ///
  /// Either everything is written or nothing is; on error the pending query
  /// is left as it was and must still be aborted by the caller.
  fn complete_exchange<'a>(
    &'a self,
    pending: &'a PendingExchange,
    response: NewResponse,
  ) -> impl Future<Output = Result<Exchange, Self::Error>> + Send + 'a;

  /// Roll back `pending`, removing the recorded query.
  fn abort_exchange(
    &self,
    pending: PendingExchange,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Committed exchanges for `user_id`, newest query first, at most `limit`.
  /// Returns an empty list for unknown users.
  fn get_history(
    &self,
    user_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Exchange>, Self::Error>> + Send + '_;

  /// Cheap round trip used by health checks.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
