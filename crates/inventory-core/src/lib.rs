//! Core types and trait definitions for the node inventory.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::FactStore`]; everything above the
//! store (retrying writes, predicate search) lives here and is generic over
//! that trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod coerce;
pub mod error;
pub mod inventory;
pub mod model;
pub mod predicate;
pub mod query;
pub mod retry;
pub mod store;

pub use error::{Error, Result};
pub use inventory::Inventory;
