//! Core types and trait definitions for ragline.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend (`ragline-store-sqlite`) and the answer-generation gateway
//! (`ragline-gateway`) plug in through the [`store::ExchangeStore`] and
//! [`backend::AnswerBackend`] traits; the [`orchestrator::Orchestrator`] drives
//! them through one exchange at a time.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod backend;
pub mod error;
pub mod exchange;
pub mod history;
pub mod orchestrator;
pub mod store;
pub mod user;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
