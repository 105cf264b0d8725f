//! User identity.
//!
//! A user is nothing more than a stable UUID bound to a unique username. No
//! credentials are attached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest username accepted, counted in characters.
pub const MAX_USERNAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}
