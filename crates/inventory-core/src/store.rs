//! The `FactStore` trait and the error classification it relies on.
//!
//! The trait is implemented by storage backends (e.g.
//! `inventory-store-sqlite`). The retrying writer and the query engine depend
//! on this abstraction, not on any concrete backend.

use std::{collections::BTreeSet, future::Future};

use chrono::{DateTime, Utc};

use crate::{
  model::{FactSnapshot, NamedFact, Node},
  predicate::Operator,
};

// ─── Error classification ────────────────────────────────────────────────────

/// A backend error that knows whether retrying could help.
pub trait StorageError: std::error::Error + Send + Sync + 'static {
  /// `true` for failures expected to succeed on retry (lock contention,
  /// interrupted transport, duplicate-key races); `false` for constraint
  /// violations, malformed data and everything else.
  fn is_transient(&self) -> bool;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over durable node/fact storage.
///
/// Reads see committed state only and take no locks; they may be stale
/// relative to an in-flight write.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait FactStore: Send + Sync {
  type Error: StorageError;

  /// Look up a node and its facts by exact name. Returns `None` if absent.
  fn find_node_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Node>, Self::Error>> + Send + 'a;

  /// Every fact with exactly this name, across all nodes.
  fn find_facts_by_name<'a>(
    &'a self,
    fact_name: &'a str,
  ) -> impl Future<Output = Result<Vec<NamedFact>, Self::Error>> + Send + 'a;

  /// Atomically replace a node's fact set.
  ///
  /// In one transaction: find-or-create the node, set its timestamp, delete
  /// all of its facts, insert one fact per non-reserved entry of the
  /// snapshot. Either everything commits or nothing does.
  fn replace_node_facts<'a>(
    &'a self,
    snapshot: &'a FactSnapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Names of nodes with a fact `name` whose value equals `value`.
  fn nodes_with_fact_value<'a>(
    &'a self,
    name: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + 'a;

  /// Names of nodes that do *not* have a fact `name` equal to `value`.
  ///
  /// A node lacking the fact entirely is included: absence counts as
  /// non-equal.
  fn nodes_without_fact_value<'a>(
    &'a self,
    name: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + 'a;

  /// Names of nodes whose timestamp satisfies `timestamp <operator> at`,
  /// compared as points in time by the backend.
  fn nodes_by_timestamp(
    &self,
    operator: Operator,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + '_;
}
