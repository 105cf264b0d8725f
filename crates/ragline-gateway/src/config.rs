//! Gateway configuration.

use std::time::Duration;

use serde::Deserialize;

/// Answer generation is slow; the default allows twenty minutes per question.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20 * 60;
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the answer-generation backend, deserialised from
/// the `[backend]` table of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
  /// Full URL questions are POSTed to, e.g. `http://127.0.0.1:8000/query`.
  pub endpoint:            String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:        u64,
  #[serde(default = "default_health_timeout_secs")]
  pub health_timeout_secs: u64,
}

impl GatewayConfig {
  pub fn new(endpoint: impl Into<String>) -> Self {
    Self {
      endpoint:            endpoint.into(),
      timeout_secs:        DEFAULT_TIMEOUT_SECS,
      health_timeout_secs: DEFAULT_HEALTH_TIMEOUT_SECS,
    }
  }

  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  pub fn health_timeout(&self) -> Duration { Duration::from_secs(self.health_timeout_secs) }
}

fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }

fn default_health_timeout_secs() -> u64 { DEFAULT_HEALTH_TIMEOUT_SECS }
