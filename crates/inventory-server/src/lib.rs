//! Server wiring for the node inventory: configuration, store opening and
//! the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use inventory_core::{Inventory, retry::RetryPolicy};
use inventory_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `INVENTORY_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// How long SQLite waits on a locked database before reporting busy.
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms:     u64,
  #[serde(default = "default_retry_attempts")]
  pub retry_attempts:      u32,
  #[serde(default = "default_retry_base_delay_ms")]
  pub retry_base_delay_ms: u64,
  #[serde(default = "default_retry_max_delay_ms")]
  pub retry_max_delay_ms:  u64,
}

fn default_busy_timeout_ms() -> u64 { 5_000 }

fn default_retry_attempts() -> u32 { RetryPolicy::default().max_attempts }

fn default_retry_base_delay_ms() -> u64 {
  RetryPolicy::default().base_delay.as_millis() as u64
}

fn default_retry_max_delay_ms() -> u64 {
  RetryPolicy::default().max_delay.as_millis() as u64
}

impl ServerConfig {
  /// Layer the (optional) TOML file at `path` under `INVENTORY_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("INVENTORY"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_attempts: self.retry_attempts,
      base_delay:   Duration::from_millis(self.retry_base_delay_ms),
      max_delay:    Duration::from_millis(self.retry_max_delay_ms),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Wiring ───────────────────────────────────────────────────────────────────

/// Open the SQLite store described by `cfg` and wrap it in an [`Inventory`].
pub async fn open_inventory(
  cfg: &ServerConfig,
) -> anyhow::Result<Inventory<SqliteStore>> {
  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  store
    .set_busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))
    .await
    .context("failed to set busy timeout")?;

  tracing::info!(path = ?store_path, "opened inventory store");
  Ok(Inventory::new(store, cfg.retry_policy()))
}

/// The full application router, with request tracing.
pub fn router(inventory: Arc<Inventory<SqliteStore>>) -> Router {
  inventory_api::api_router(inventory).layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
