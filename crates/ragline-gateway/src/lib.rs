//! HTTP gateway to the external answer-generation service.
//!
//! [`Gateway`] implements [`ragline_core::backend::AnswerBackend`]: it POSTs
//! `{"question": ...}` to the configured endpoint and validates the structured
//! answer that comes back. It never retries.

mod client;
mod wire;

pub mod config;
pub mod error;

pub use client::Gateway;
pub use config::GatewayConfig;
pub use error::{Error, Result};
