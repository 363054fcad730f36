//! JSON REST API for the node inventory.
//!
//! Exposes an axum [`Router`] backed by any [`inventory_core::store::FactStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", inventory_api::api_router(inventory.clone()))
//! ```

pub mod error;
pub mod facts;
pub mod nodes;
pub mod search;

use std::sync::Arc;

use axum::{Router, routing::get};
use inventory_core::{Inventory, store::FactStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `inventory`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(inventory: Arc<Inventory<S>>) -> Router<()>
where
  S: FactStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Nodes
    .route("/nodes/{name}", get(nodes::get_one::<S>).put(nodes::replace::<S>))
    // Facts
    .route("/facts/{name}", get(facts::values::<S>))
    // Search
    .route("/search", get(search::handler::<S>))
    .with_state(inventory)
}
