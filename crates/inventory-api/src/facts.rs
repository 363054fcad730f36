//! Handler for `GET /facts/:name` — which nodes report which value.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, State},
};
use inventory_core::{Inventory, store::FactStore};

use crate::error::ApiError;

/// `GET /facts/:name` → `{"<value>": ["<node>", ...], ...}`
pub async fn values<S>(
  State(inventory): State<Arc<Inventory<S>>>,
  Path(name): Path<String>,
) -> Result<Json<BTreeMap<String, Vec<String>>>, ApiError>
where
  S: FactStore,
{
  Ok(Json(inventory.fact_values(&name).await?))
}
