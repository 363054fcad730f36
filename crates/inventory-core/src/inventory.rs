//! [`Inventory`] — the facade callers talk to.
//!
//! Writes go through a [`RetryingWriter`], reads through a [`QueryEngine`];
//! both share one store handle.

use std::collections::BTreeMap;

use crate::{
  Error, Result,
  model::{FactSnapshot, Node},
  query::QueryEngine,
  retry::{RetryPolicy, RetryingWriter},
  store::FactStore,
};

#[derive(Debug, Clone)]
pub struct Inventory<S> {
  writer: RetryingWriter<S>,
  query:  QueryEngine<S>,
}

impl<S: FactStore + Clone> Inventory<S> {
  pub fn new(store: S, policy: RetryPolicy) -> Self {
    Self {
      writer: RetryingWriter::new(store.clone(), policy),
      query:  QueryEngine::new(store),
    }
  }
}

impl<S: FactStore> Inventory<S> {
  pub fn store(&self) -> &S { self.query.store() }

  /// A node's facts and timestamp. `None` if the node was never written.
  pub async fn find_node(&self, name: &str) -> Result<Option<Node>, S::Error> {
    self.store().find_node_by_name(name).await.map_err(Error::Storage)
  }

  /// Replace a node's facts with `snapshot`, retrying transient failures.
  pub async fn save(&self, snapshot: &FactSnapshot) -> Result<(), S::Error> {
    self.writer.save(snapshot).await
  }

  /// Sorted names of nodes matching every option. See [`QueryEngine::search`].
  pub async fn search(
    &self,
    options: &BTreeMap<String, String>,
  ) -> Result<Vec<String>, S::Error> {
    self.query.search(options).await
  }

  /// Value → node names for one fact. See [`QueryEngine::fact_values`].
  pub async fn fact_values(
    &self,
    fact_name: &str,
  ) -> Result<BTreeMap<String, Vec<String>>, S::Error> {
    self.query.fact_values(fact_name).await
  }
}
