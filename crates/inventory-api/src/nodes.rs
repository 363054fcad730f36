//! Handlers for `/nodes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/nodes/:name` | 404 if the node was never written |
//! | `PUT`  | `/nodes/:name` | Body: [`ReplaceBody`]; replaces the whole fact set, returns 204 |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use inventory_core::{
  Inventory,
  model::{FactSnapshot, Node},
  store::FactStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A node as returned by `GET /nodes/:name`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeView {
  pub name:      String,
  pub timestamp: DateTime<Utc>,
  pub values:    BTreeMap<String, String>,
}

impl From<Node> for NodeView {
  fn from(node: Node) -> Self {
    let values = node.facts_to_map();
    NodeView { name: node.name, timestamp: node.timestamp, values }
  }
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /nodes/:name`
pub async fn get_one<S>(
  State(inventory): State<Arc<Inventory<S>>>,
  Path(name): Path<String>,
) -> Result<Json<NodeView>, ApiError>
where
  S: FactStore,
{
  let node = inventory
    .find_node(&name)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("node {name} not found")))?;
  Ok(Json(NodeView::from(node)))
}

// ─── Replace ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /nodes/:name`.
#[derive(Debug, Deserialize)]
pub struct ReplaceBody {
  pub timestamp: DateTime<Utc>,
  #[serde(default)]
  pub values:    BTreeMap<String, String>,
}

/// `PUT /nodes/:name` — names starting with `_` in `values` are dropped.
pub async fn replace<S>(
  State(inventory): State<Arc<Inventory<S>>>,
  Path(name): Path<String>,
  Json(body): Json<ReplaceBody>,
) -> Result<StatusCode, ApiError>
where
  S: FactStore,
{
  let snapshot = FactSnapshot::new(name, body.timestamp, body.values);
  inventory.save(&snapshot).await?;
  Ok(StatusCode::NO_CONTENT)
}
