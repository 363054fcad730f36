//! [`QueryEngine`] — turns a flat option map into predicates, evaluates each
//! one independently and intersects the results.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, Result, predicate::Predicate, store::FactStore};

/// Parse every option into a predicate, dropping the ones that are ignored.
pub fn parse_options<'a, I>(options: I) -> Vec<Predicate>
where
  I: IntoIterator<Item = (&'a String, &'a String)>,
{
  let mut predicates = Vec::new();
  for (key, literal) in options {
    if let Some(p) = Predicate::parse(key, literal) {
      predicates.push(p);
    } else {
      tracing::debug!(key = %key, "ignoring unrecognised search option");
    }
  }
  predicates
}

/// Intersect all sets. No sets at all yields nothing rather than "everything",
/// since there is no universe to intersect against.
pub fn intersect_all(sets: Vec<BTreeSet<String>>) -> Vec<String> {
  sets
    .into_iter()
    .reduce(|acc, set| acc.intersection(&set).cloned().collect())
    .unwrap_or_default()
    .into_iter()
    .collect()
}

/// Read side of the inventory: predicate search and cross-node fact lookups.
#[derive(Debug, Clone)]
pub struct QueryEngine<S> {
  store: S,
}

impl<S: FactStore> QueryEngine<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Sorted, unique names of nodes satisfying every predicate in `options`.
  ///
  /// Any failing predicate aborts the whole search.
  pub async fn search(
    &self,
    options: &BTreeMap<String, String>,
  ) -> Result<Vec<String>, S::Error> {
    let predicates = parse_options(options);

    let mut sets = Vec::with_capacity(predicates.len());
    for predicate in &predicates {
      let nodes = predicate
        .matching_nodes(&self.store)
        .await
        .map_err(Error::Storage)?;
      sets.push(nodes);
    }

    let matched = intersect_all(sets);
    tracing::debug!(
      predicates = predicates.len(),
      matched = matched.len(),
      "search evaluated"
    );
    Ok(matched)
  }

  /// For one fact name, map each reported value to the sorted names of the
  /// nodes reporting it.
  pub async fn fact_values(
    &self,
    fact_name: &str,
  ) -> Result<BTreeMap<String, Vec<String>>, S::Error> {
    let facts = self
      .store
      .find_facts_by_name(fact_name)
      .await
      .map_err(Error::Storage)?;

    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for nf in facts {
      values.entry(nf.fact.value).or_default().push(nf.node_name);
    }
    for nodes in values.values_mut() {
      nodes.sort();
    }
    Ok(values)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex},
  };

  use chrono::{DateTime, TimeZone, Utc};
  use thiserror::Error;

  use super::{QueryEngine, intersect_all};
  use crate::{
    Error,
    model::{Fact, FactSnapshot, NamedFact, Node},
    predicate::Operator,
    store::{FactStore, StorageError},
  };

  // ── In-memory store with fault injection ────────────────────────────────

  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub enum StoreFault {
    Transient,
    Permanent,
  }

  #[derive(Debug, Error)]
  #[error("injected {0:?} fault")]
  pub struct MemoryError(StoreFault);

  impl StorageError for MemoryError {
    fn is_transient(&self) -> bool { self.0 == StoreFault::Transient }
  }

  #[derive(Default)]
  struct State {
    nodes:          BTreeMap<String, Node>,
    next_id:        i64,
    pending_faults: Vec<StoreFault>,
    write_attempts: usize,
    commits:        usize,
    fail_reads:     bool,
  }

  #[derive(Clone, Default)]
  pub struct MemoryStore {
    state: Arc<Mutex<State>>,
  }

  impl MemoryStore {
    pub fn fail_next(&self, n: usize, fault: StoreFault) {
      self.state.lock().unwrap().pending_faults.extend(std::iter::repeat_n(fault, n));
    }

    pub fn fail_reads(&self) { self.state.lock().unwrap().fail_reads = true; }

    pub fn write_attempts(&self) -> usize { self.state.lock().unwrap().write_attempts }

    pub fn commits(&self) -> usize { self.state.lock().unwrap().commits }

    pub fn node(&self, name: &str) -> Option<Node> {
      self.state.lock().unwrap().nodes.get(name).cloned()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T, MemoryError> {
      let state = self.state.lock().unwrap();
      if state.fail_reads {
        return Err(MemoryError(StoreFault::Permanent));
      }
      Ok(f(&state))
    }
  }

  impl FactStore for MemoryStore {
    type Error = MemoryError;

    async fn find_node_by_name(&self, name: &str) -> Result<Option<Node>, MemoryError> {
      self.read(|s| s.nodes.get(name).cloned())
    }

    async fn find_facts_by_name(&self, fact_name: &str) -> Result<Vec<NamedFact>, MemoryError> {
      self.read(|s| {
        s.nodes
          .values()
          .flat_map(|n| {
            n.facts.iter().filter(|f| f.name == fact_name).map(|f| NamedFact {
              node_name: n.name.clone(),
              fact:      f.clone(),
            })
          })
          .collect()
      })
    }

    async fn replace_node_facts(&self, snapshot: &FactSnapshot) -> Result<(), MemoryError> {
      let mut state = self.state.lock().unwrap();
      state.write_attempts += 1;
      if !state.pending_faults.is_empty() {
        let fault = state.pending_faults.remove(0);
        return Err(MemoryError(fault));
      }

      let node_id = match state.nodes.get(&snapshot.name) {
        Some(node) => node.node_id,
        None => {
          state.next_id += 1;
          state.next_id
        }
      };
      let mut facts = Vec::new();
      for (name, value) in snapshot.persistable() {
        state.next_id += 1;
        facts.push(Fact {
          fact_id: state.next_id,
          node_id,
          name: name.to_owned(),
          value: value.to_owned(),
        });
      }
      state.nodes.insert(snapshot.name.clone(), Node {
        node_id,
        name: snapshot.name.clone(),
        timestamp: snapshot.timestamp,
        facts,
      });
      state.commits += 1;
      Ok(())
    }

    async fn nodes_with_fact_value(
      &self,
      name: &str,
      value: &str,
    ) -> Result<BTreeSet<String>, MemoryError> {
      self.read(|s| {
        s.nodes
          .values()
          .filter(|n| n.facts.iter().any(|f| f.name == name && f.value == value))
          .map(|n| n.name.clone())
          .collect()
      })
    }

    async fn nodes_without_fact_value(
      &self,
      name: &str,
      value: &str,
    ) -> Result<BTreeSet<String>, MemoryError> {
      self.read(|s| {
        s.nodes
          .values()
          .filter(|n| !n.facts.iter().any(|f| f.name == name && f.value == value))
          .map(|n| n.name.clone())
          .collect()
      })
    }

    async fn nodes_by_timestamp(
      &self,
      operator: Operator,
      at: DateTime<Utc>,
    ) -> Result<BTreeSet<String>, MemoryError> {
      self.read(|s| {
        s.nodes
          .values()
          .filter(|n| operator.holds(&n.timestamp, &at))
          .map(|n| n.name.clone())
          .collect()
      })
    }
  }

  pub fn snapshot(name: &str, secs: i64, values: &[(&str, &str)]) -> FactSnapshot {
    FactSnapshot::new(
      name,
      Utc.timestamp_opt(secs, 0).unwrap(),
      values
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect(),
    )
  }

  fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect()
  }

  async fn seeded() -> QueryEngine<MemoryStore> {
    let store = MemoryStore::default();
    for s in [
      snapshot("a", 100, &[("role", "db"), ("env", "prod"), ("uptime", "7200")]),
      snapshot("b", 200, &[("role", "db"), ("env", "dev"), ("uptime", "abc")]),
      snapshot("c", 300, &[("role", "web"), ("uptime", "60")]),
    ] {
      store.replace_node_facts(&s).await.unwrap();
    }
    QueryEngine::new(store)
  }

  // ── Search ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn empty_options_match_nothing() {
    let q = seeded().await;
    assert!(q.search(&BTreeMap::new()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn only_ignored_options_match_nothing() {
    let q = seeded().await;
    let result = q
      .search(&options(&[("nodes.role.eq", "db"), ("meta.name", "a")]))
      .await
      .unwrap();
    assert!(result.is_empty());
  }

  #[tokio::test]
  async fn single_equality_predicate() {
    let q = seeded().await;
    let result = q.search(&options(&[("facts.role.eq", "db")])).await.unwrap();
    assert_eq!(result, vec!["a", "b"]);
  }

  #[tokio::test]
  async fn predicates_intersect() {
    let q = seeded().await;
    let result = q
      .search(&options(&[("facts.role.eq", "db"), ("facts.env.eq", "prod")]))
      .await
      .unwrap();
    assert_eq!(result, vec!["a"]);
  }

  #[tokio::test]
  async fn ignored_options_do_not_widen_or_narrow() {
    let q = seeded().await;
    let result = q
      .search(&options(&[("facts.role.eq", "db"), ("bogus.thing", "x")]))
      .await
      .unwrap();
    assert_eq!(result, vec!["a", "b"]);
  }

  #[tokio::test]
  async fn not_equal_includes_nodes_without_the_fact() {
    let q = seeded().await;
    let result = q.search(&options(&[("facts.env.ne", "prod")])).await.unwrap();
    assert_eq!(result, vec!["b", "c"]);
  }

  #[tokio::test]
  async fn ordering_coerces_non_numeric_to_zero() {
    let q = seeded().await;
    // "abc" is 0.0, and 0 > 0 is false.
    let gt = q.search(&options(&[("facts.uptime.gt", "0")])).await.unwrap();
    assert_eq!(gt, vec!["a", "c"]);

    let ge = q.search(&options(&[("facts.uptime.ge", "0")])).await.unwrap();
    assert_eq!(ge, vec!["a", "b", "c"]);

    let le = q.search(&options(&[("facts.uptime.le", "junk")])).await.unwrap();
    assert_eq!(le, vec!["b"]);
  }

  #[tokio::test]
  async fn ordering_compares_numerically_not_lexically() {
    let q = seeded().await;
    let result = q.search(&options(&[("facts.uptime.lt", "1000")])).await.unwrap();
    assert_eq!(result, vec!["b", "c"]);
  }

  #[tokio::test]
  async fn timestamp_predicates() {
    let q = seeded().await;
    let at = Utc.timestamp_opt(200, 0).unwrap().to_rfc3339();

    let ge = q.search(&options(&[("meta.timestamp.ge", at.as_str())])).await.unwrap();
    assert_eq!(ge, vec!["b", "c"]);

    let eq = q.search(&options(&[("meta.timestamp", at.as_str())])).await.unwrap();
    assert_eq!(eq, vec!["b"]);

    let combined = q
      .search(&options(&[("meta.timestamp.lt", at.as_str()), ("facts.role.eq", "db")]))
      .await
      .unwrap();
    assert_eq!(combined, vec!["a"]);
  }

  #[tokio::test]
  async fn invalid_timestamp_literal_matches_nothing() {
    let q = seeded().await;
    let alone = q.search(&options(&[("meta.timestamp.gt", "yesterday")])).await.unwrap();
    assert!(alone.is_empty());

    // Still part of the intersection, so it narrows instead of being dropped.
    let combined = q
      .search(&options(&[("meta.timestamp.gt", "yesterday"), ("facts.role.eq", "db")]))
      .await
      .unwrap();
    assert!(combined.is_empty());
  }

  #[tokio::test]
  async fn nameless_fact_key_narrows_to_nothing() {
    let q = seeded().await;
    let result = q
      .search(&options(&[("facts", "x"), ("facts.role.eq", "db")]))
      .await
      .unwrap();
    assert!(result.is_empty());

    let result = q
      .search(&options(&[("facts..eq", "db"), ("facts.role.eq", "db")]))
      .await
      .unwrap();
    assert!(result.is_empty());
  }

  #[tokio::test]
  async fn storage_failure_aborts_search() {
    let q = seeded().await;
    q.store().fail_reads();
    let err = q
      .search(&options(&[("facts.role.eq", "db")]))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
  }

  // ── Fact values ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn fact_values_groups_nodes_by_value() {
    let q = seeded().await;
    let values = q.fact_values("role").await.unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values["db"], vec!["a", "b"]);
    assert_eq!(values["web"], vec!["c"]);
    assert!(q.fact_values("missing").await.unwrap().is_empty());
  }

  #[test]
  fn intersect_of_single_set_is_that_set() {
    let set: BTreeSet<String> = ["z", "a"].into_iter().map(String::from).collect();
    assert_eq!(intersect_all(vec![set]), vec!["a", "z"]);
    assert!(intersect_all(Vec::new()).is_empty());
  }
}
