//! SQL schema for the ragline SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE CHECK (length(username) BETWEEN 1 AND 50),
    created_at  TEXT NOT NULL
);

-- AUTOINCREMENT keeps ids of rolled-back queries from being reused.
CREATE TABLE IF NOT EXISTS queries (
    query_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    question        TEXT NOT NULL,
    client_address  TEXT NOT NULL,
    created_at      TEXT NOT NULL   -- RFC 3339 UTC, fixed nanosecond precision
);

-- At most one response per query. A query without one is pending.
CREATE TABLE IF NOT EXISTS responses (
    response_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    query_id            INTEGER NOT NULL UNIQUE
                          REFERENCES queries(query_id) ON DELETE CASCADE,
    answer              TEXT NOT NULL,
    processing_time_ms  INTEGER NOT NULL,
    confidence          REAL,
    created_at          TEXT NOT NULL
);

-- Read back in source_id order, which is insertion order.
CREATE TABLE IF NOT EXISTS sources (
    source_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    response_id  INTEGER NOT NULL REFERENCES responses(response_id) ON DELETE CASCADE,
    content      TEXT NOT NULL,
    provenance   TEXT NOT NULL,
    page         INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS queries_user_created_idx ON queries(user_id, created_at);
CREATE INDEX IF NOT EXISTS sources_response_idx     ON sources(response_id);

PRAGMA user_version = 1;
";
