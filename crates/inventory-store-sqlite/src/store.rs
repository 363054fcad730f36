//! [`SqliteStore`] — the SQLite implementation of [`FactStore`].

use std::{collections::BTreeSet, path::Path, time::Duration};

use chrono::{DateTime, Utc};
use inventory_core::{
  model::{FactSnapshot, NamedFact, Node},
  predicate::Operator,
  store::FactStore,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Result,
  encode::{RawFact, RawNamedFact, RawNode, encode_dt, encode_operator},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An inventory store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// How long a statement waits on a locked database before failing with
  /// `SQLITE_BUSY`.
  pub async fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-column `SELECT name …` query and collect the names.
  async fn select_names(
    &self,
    sql: String,
    params: Vec<String>,
  ) -> Result<BTreeSet<String>> {
    let names = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| row.get(0))?
          .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }
}

fn raw_fact(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFact> {
  Ok(RawFact {
    fact_id: row.get(0)?,
    node_id: row.get(1)?,
    name:    row.get(2)?,
    value:   row.get(3)?,
  })
}

// ─── FactStore impl ──────────────────────────────────────────────────────────

impl FactStore for SqliteStore {
  type Error = crate::Error;

  async fn find_node_by_name(&self, name: &str) -> Result<Option<Node>> {
    let name = name.to_owned();

    let raw: Option<RawNode> = self
      .conn
      .call(move |conn| {
        let node = conn
          .query_row(
            "SELECT id, name, timestamp FROM inventory_nodes WHERE name = ?1",
            rusqlite::params![name],
            |row| {
              Ok(RawNode {
                node_id:   row.get(0)?,
                name:      row.get(1)?,
                timestamp: row.get(2)?,
                facts:     Vec::new(),
              })
            },
          )
          .optional()?;

        let Some(mut node) = node else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT id, node_id, name, value FROM inventory_facts
           WHERE node_id = ?1
           ORDER BY id",
        )?;
        node.facts = stmt
          .query_map(rusqlite::params![node.node_id], raw_fact)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(node))
      })
      .await?;

    raw.map(RawNode::into_node).transpose()
  }

  async fn find_facts_by_name(&self, fact_name: &str) -> Result<Vec<NamedFact>> {
    let fact_name = fact_name.to_owned();

    let raws: Vec<RawNamedFact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT f.id, f.node_id, f.name, f.value, n.name
           FROM inventory_facts f
           INNER JOIN inventory_nodes n ON f.node_id = n.id
           WHERE f.name = ?1
           ORDER BY n.name, f.id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![fact_name], |row| {
            Ok(RawNamedFact { node_name: row.get(4)?, fact: raw_fact(row)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawNamedFact::into_named_fact).collect())
  }

  async fn replace_node_facts(&self, snapshot: &FactSnapshot) -> Result<()> {
    let name = snapshot.name.clone();
    let timestamp = encode_dt(snapshot.timestamp);
    let facts: Vec<(String, String)> = snapshot
      .persistable()
      .map(|(n, v)| (n.to_owned(), v.to_owned()))
      .collect();
    let fact_count = facts.len();

    self
      .conn
      .call(move |conn| {
        // Dropping the transaction without commit rolls everything back.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let node_id: i64 = tx.query_row(
          "INSERT INTO inventory_nodes (name, timestamp) VALUES (?1, ?2)
           ON CONFLICT(name) DO UPDATE SET timestamp = excluded.timestamp
           RETURNING id",
          rusqlite::params![name, timestamp],
          |row| row.get(0),
        )?;

        tx.execute(
          "DELETE FROM inventory_facts WHERE node_id = ?1",
          rusqlite::params![node_id],
        )?;

        {
          let mut insert = tx.prepare(
            "INSERT INTO inventory_facts (node_id, name, value) VALUES (?1, ?2, ?3)",
          )?;
          for (fact_name, value) in &facts {
            insert.execute(rusqlite::params![node_id, fact_name, value])?;
          }
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(node = %snapshot.name, facts = fact_count, "replaced node facts");
    Ok(())
  }

  async fn nodes_with_fact_value(
    &self,
    name: &str,
    value: &str,
  ) -> Result<BTreeSet<String>> {
    self
      .select_names(
        "SELECT DISTINCT n.name
         FROM inventory_nodes n
         INNER JOIN inventory_facts f ON f.node_id = n.id
         WHERE f.name = ?1 AND f.value = ?2"
          .to_owned(),
        vec![name.to_owned(), value.to_owned()],
      )
      .await
  }

  async fn nodes_without_fact_value(
    &self,
    name: &str,
    value: &str,
  ) -> Result<BTreeSet<String>> {
    self
      .select_names(
        "SELECT n.name
         FROM inventory_nodes n
         WHERE NOT EXISTS (
           SELECT 1 FROM inventory_facts f
           WHERE f.node_id = n.id AND f.name = ?1 AND f.value = ?2
         )"
          .to_owned(),
        vec![name.to_owned(), value.to_owned()],
      )
      .await
  }

  async fn nodes_by_timestamp(
    &self,
    operator: Operator,
    at: DateTime<Utc>,
  ) -> Result<BTreeSet<String>> {
    let sql = format!(
      "SELECT name FROM inventory_nodes WHERE timestamp {} ?1",
      encode_operator(operator)
    );
    self.select_names(sql, vec![encode_dt(at)]).await
  }
}
