//! Handler for `GET /search`.
//!
//! Every query parameter is a search option, keyed
//! `<kind>.<name>[.<operator>]`:
//!
//! ```text
//! /search?facts.osfamily.eq=RedHat&facts.uptime.gt=3600&meta.timestamp.ge=2011-01-01T00:00:00Z
//! ```

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Query, State},
};
use inventory_core::{Inventory, store::FactStore};

use crate::error::ApiError;

/// `GET /search[?<kind>.<name>[.<op>]=<literal>...]` → sorted node names.
pub async fn handler<S>(
  State(inventory): State<Arc<Inventory<S>>>,
  Query(options): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: FactStore,
{
  Ok(Json(inventory.search(&options).await?))
}
