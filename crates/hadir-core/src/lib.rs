//! Core of the Hadir attendance tracker: the day-boundary and
//! evidence-validation engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Persistence and sessions are reached through the [`store::RecordStore`]
//! and [`session::SessionProvider`] traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod employee;
pub mod error;
pub mod evidence;
pub mod gate;
pub mod query;
pub mod record;
pub mod session;
pub mod store;

#[cfg(test)]
mod memory;

pub use error::{Error, Result};
