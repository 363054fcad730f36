//! Node and fact records — plain data owned by a [`FactStore`].
//!
//! Records carry no persistence behaviour of their own; every read and write
//! goes through a store.
//!
//! [`FactStore`]: crate::store::FactStore

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fact names starting with this prefix are node metadata and are never
/// persisted as facts.
pub const RESERVED_PREFIX: &str = "_";

/// Whether `name` is a reserved metadata name rather than a fact.
pub fn is_reserved(name: &str) -> bool { name.starts_with(RESERVED_PREFIX) }

// ─── Node ────────────────────────────────────────────────────────────────────

/// A managed node and the facts recorded by its most recent write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub node_id:   i64,
  pub name:      String,
  /// Caller-supplied timestamp of the most recent accepted write.
  pub timestamp: DateTime<Utc>,
  pub facts:     Vec<Fact>,
}

impl Node {
  /// Collapse the fact rows into a name → value map.
  ///
  /// The write path produces at most one fact per name, so no value is lost.
  pub fn facts_to_map(&self) -> BTreeMap<String, String> {
    self
      .facts
      .iter()
      .map(|f| (f.name.clone(), f.value.clone()))
      .collect()
  }
}

// ─── Fact ────────────────────────────────────────────────────────────────────

/// One named attribute of a node. Values are always text; numeric meaning is
/// only applied at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
  pub fact_id: i64,
  /// The owning node.
  pub node_id: i64,
  pub name:    String,
  pub value:   String,
}

/// A fact bundled with the name of the node that owns it, as returned by
/// cross-node lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedFact {
  pub node_name: String,
  pub fact:      Fact,
}

// ─── FactSnapshot ────────────────────────────────────────────────────────────

/// Input to [`crate::store::FactStore::replace_node_facts`]: the complete
/// fact set reported for one node at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSnapshot {
  pub name:      String,
  pub timestamp: DateTime<Utc>,
  pub values:    BTreeMap<String, String>,
}

impl FactSnapshot {
  pub fn new(
    name: impl Into<String>,
    timestamp: DateTime<Utc>,
    values: BTreeMap<String, String>,
  ) -> Self {
    Self { name: name.into(), timestamp, values }
  }

  /// The entries that are persisted as facts, i.e. everything outside the
  /// reserved prefix.
  pub fn persistable(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .values
      .iter()
      .filter(|(name, _)| !is_reserved(name))
      .map(|(name, value)| (name.as_str(), value.as_str()))
  }
}
