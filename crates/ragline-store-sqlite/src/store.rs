//! [`SqliteStore`], the SQLite implementation of [`ExchangeStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension as _};
use uuid::Uuid;

use ragline_core::{
  exchange::{Exchange, NewResponse, NewSource, PendingExchange, Query, Response, Source},
  store::ExchangeStore,
  user::User,
};

use crate::{
  Error, Result,
  encode::{RawExchangeRow, RawUser, encode_dt, encode_uuid},
  schema::SCHEMA,
};

/// Outcome of inserting a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UserInsert {
  Inserted,
  /// The username already exists.
  Conflict,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ragline exchange store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every call
/// runs to completion on the connection thread before the next one starts, so
/// each closure passed to `call` sees a consistent database.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, run schema initialisation and purge
  /// queries left pending by a previous process.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    store.purge_pending().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Delete every query that never received a response.
  ///
  /// Only safe while no exchange is in flight, i.e. at startup.
  async fn purge_pending(&self) -> Result<usize> {
    let purged = self
      .conn
      .call(|conn| {
        Ok(conn.execute(
          "DELETE FROM queries
           WHERE query_id NOT IN (SELECT query_id FROM responses)",
          [],
        )?)
      })
      .await?;

    if purged > 0 {
      tracing::warn!(purged, "removed queries left pending by a previous run");
    }
    Ok(purged)
  }

  /// Number of queries recorded for `user_id`, pending ones included.
  pub async fn count_queries(&self, user_id: Uuid) -> Result<usize> {
    let id_str = encode_uuid(user_id);
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM queries WHERE user_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count as usize)
  }

  /// Number of users with exactly this username (0 or 1).
  pub async fn count_users(&self, username: &str) -> Result<usize> {
    let username = username.to_owned();
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM users WHERE username = ?1",
          rusqlite::params![username],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count as usize)
  }

  pub(crate) async fn find_user(&self, username: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, created_at FROM users WHERE username = ?1",
              rusqlite::params![username],
              |row| {
                Ok(RawUser {
                  user_id:    row.get(0)?,
                  username:   row.get(1)?,
                  created_at: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  /// Insert `user`, reporting a username uniqueness violation as
  /// [`UserInsert::Conflict`] rather than an error.
  pub(crate) async fn insert_user(&self, user: &User) -> Result<UserInsert> {
    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let at_str   = encode_dt(user.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO users (user_id, username, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, username, at_str],
        );
        match inserted {
          Ok(_) => Ok(UserInsert::Inserted),
          Err(e) if is_unique_violation(&e) => Ok(UserInsert::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;
    Ok(outcome)
  }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.code == ErrorCode::ConstraintViolation
        && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── ExchangeStore impl ──────────────────────────────────────────────────────

impl ExchangeStore for SqliteStore {
  type Error = Error;

  // ── Identity ──────────────────────────────────────────────────────────────

  async fn resolve_user(&self, username: String) -> Result<User> {
    if let Some(user) = self.find_user(username.clone()).await? {
      return Ok(user);
    }

    let candidate = User {
      user_id:    Uuid::new_v4(),
      username,
      created_at: Utc::now(),
    };

    match self.insert_user(&candidate).await? {
      UserInsert::Inserted => {
        tracing::info!(user_id = %candidate.user_id, "created user");
        Ok(candidate)
      }
      UserInsert::Conflict => {
        tracing::debug!("username created concurrently, re-resolving");
        self
          .find_user(candidate.username.clone())
          .await?
          .ok_or(Error::UserVanished(candidate.username))
      }
    }
  }

  // ── Exchange writes ───────────────────────────────────────────────────────

  async fn begin_exchange(
    &self,
    user_id:        Uuid,
    question:       String,
    client_address: String,
  ) -> Result<PendingExchange> {
    let created_at = Utc::now();

    let user_id_str = encode_uuid(user_id);
    let at_str      = encode_dt(created_at);
    let q           = question.clone();
    let addr        = client_address.clone();

    let query_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO queries (user_id, question, client_address, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id_str, q, addr, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(PendingExchange::new(Query {
      query_id,
      user_id,
      question,
      client_address,
      created_at,
    }))
  }

  async fn complete_exchange(
    &self,
    pending: &PendingExchange,
    input:   NewResponse,
  ) -> Result<Exchange> {
    let query      = pending.query().clone();
    let created_at = Utc::now();

    let query_id     = query.query_id;
    let at_str       = encode_dt(created_at);
    let answer       = input.answer.clone();
    let processing   = input.processing_time_ms;
    let confidence   = input.confidence;
    let new_sources  = input.sources;

    let (response_id, sources) = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without commit rolls everything back.
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO responses
             (query_id, answer, processing_time_ms, confidence, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![query_id, answer, processing, confidence, at_str],
        )?;
        let response_id = tx.last_insert_rowid();

        let mut sources = Vec::with_capacity(new_sources.len());
        {
          let mut stmt = tx.prepare(
            "INSERT INTO sources (response_id, content, provenance, page)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for NewSource { content, provenance, page } in new_sources {
            stmt.execute(rusqlite::params![response_id, content, provenance, page])?;
            sources.push(Source {
              source_id: tx.last_insert_rowid(),
              response_id,
              content,
              provenance,
              page,
            });
          }
        }

        tx.commit()?;
        Ok((response_id, sources))
      })
      .await?;

    Ok(Exchange {
      query,
      response: Response {
        response_id,
        query_id,
        answer: input.answer,
        processing_time_ms: input.processing_time_ms,
        confidence: input.confidence,
        created_at,
      },
      sources,
    })
  }

  async fn abort_exchange(&self, pending: PendingExchange) -> Result<()> {
    let query_id = pending.query_id();

    let removed = self
      .conn
      .call(move |conn| {
        // Never remove a query that already has its response.
        Ok(conn.execute(
          "DELETE FROM queries
           WHERE query_id = ?1
             AND NOT EXISTS (SELECT 1 FROM responses WHERE query_id = ?1)",
          rusqlite::params![query_id],
        )?)
      })
      .await?;

    tracing::debug!(query_id, removed, "aborted pending exchange");
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_history(&self, user_id: Uuid, limit: usize) -> Result<Vec<Exchange>> {
    let user_id_str = encode_uuid(user_id);
    let limit_val   = i64::try_from(limit).unwrap_or(i64::MAX);

    let rows: Vec<(RawExchangeRow, Vec<Source>)> = self
      .conn
      .call(move |conn| {
        // Inner join: pending queries have no response and stay hidden.
        let mut stmt = conn.prepare(
          "SELECT
             q.query_id, q.user_id, q.question, q.client_address, q.created_at,
             r.response_id, r.answer, r.processing_time_ms, r.confidence,
             r.created_at
           FROM queries q
           JOIN responses r ON r.query_id = q.query_id
           WHERE q.user_id = ?1
           ORDER BY q.created_at DESC, q.query_id DESC
           LIMIT ?2",
        )?;

        let raws = stmt
          .query_map(rusqlite::params![user_id_str, limit_val], |row| {
            Ok(RawExchangeRow {
              query_id:            row.get(0)?,
              user_id:             row.get(1)?,
              question:            row.get(2)?,
              client_address:      row.get(3)?,
              query_created_at:    row.get(4)?,
              response_id:         row.get(5)?,
              answer:              row.get(6)?,
              processing_time_ms:  row.get(7)?,
              confidence:          row.get(8)?,
              response_created_at: row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut sources_stmt = conn.prepare(
          "SELECT source_id, response_id, content, provenance, page
           FROM sources
           WHERE response_id = ?1
           ORDER BY source_id",
        )?;

        let mut rows = Vec::with_capacity(raws.len());
        for raw in raws {
          let sources = sources_stmt
            .query_map(rusqlite::params![raw.response_id], |row| {
              Ok(Source {
                source_id:   row.get(0)?,
                response_id: row.get(1)?,
                content:     row.get(2)?,
                provenance:  row.get(3)?,
                page:        row.get(4)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows.push((raw, sources));
        }

        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(raw, sources)| raw.into_exchange(sources))
      .collect()
  }

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?))
      .await?;
    Ok(())
  }
}
