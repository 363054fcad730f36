//! Query predicates: parsing option keys and evaluating one predicate against
//! a store.
//!
//! An option key has the shape `<kind>.<name>[.<operator>]` and its value is
//! the literal to compare against, e.g. `facts.uptime.gt = 3600` or
//! `meta.timestamp.ge = 2011-01-01T00:00:00Z`.
//!
//! Parsing never fails. A key with an unknown kind, an unknown operator, or a
//! `meta` name other than `timestamp` contributes no predicate. A `facts` key
//! without a name, or a `meta.timestamp` literal that is not a timestamp,
//! still counts as a predicate but matches no node.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{coerce::loose_float, store::FactStore};

// ─── Operator ────────────────────────────────────────────────────────────────

/// The closed set of comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
  Eq,
  Ne,
  Gt,
  Lt,
  Ge,
  Le,
}

impl Operator {
  pub const ALL: [Operator; 6] =
    [Self::Eq, Self::Ne, Self::Gt, Self::Lt, Self::Ge, Self::Le];

  /// Parse an operator segment. `None` for anything outside the closed set.
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "eq" => Some(Self::Eq),
      "ne" => Some(Self::Ne),
      "gt" => Some(Self::Gt),
      "lt" => Some(Self::Lt),
      "ge" => Some(Self::Ge),
      "le" => Some(Self::Le),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Eq => "eq",
      Self::Ne => "ne",
      Self::Gt => "gt",
      Self::Lt => "lt",
      Self::Ge => "ge",
      Self::Le => "le",
    }
  }

  /// Evaluate `lhs <op> rhs`.
  pub fn holds<T: PartialOrd + ?Sized>(self, lhs: &T, rhs: &T) -> bool {
    match self {
      Self::Eq => lhs == rhs,
      Self::Ne => lhs != rhs,
      Self::Gt => lhs > rhs,
      Self::Lt => lhs < rhs,
      Self::Ge => lhs >= rhs,
      Self::Le => lhs <= rhs,
    }
  }
}

// ─── Predicate ───────────────────────────────────────────────────────────────

/// One typed query condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
  /// `facts.<name>.<operator>`: equality checks are existence lookups,
  /// ordering checks compare loosely-coerced floats.
  Fact {
    name:     String,
    operator: Operator,
    value:    String,
  },
  /// `meta.timestamp.<operator>`: compared as points in time by the store.
  Timestamp {
    operator: Operator,
    at:       DateTime<Utc>,
  },
  /// A recognised key that can never hold, e.g. `meta.timestamp.gt=soon`.
  /// It still takes part in the intersection.
  Unsatisfiable { key: String },
}

impl Predicate {
  /// Parse one option. `None` means the key is ignored.
  ///
  /// The key is split on `.` and only the first three segments are read, so
  /// `facts.a.b.eq` has operator `b` and is ignored.
  pub fn parse(key: &str, literal: &str) -> Option<Self> {
    let mut segments = key.split('.');
    let kind = segments.next().unwrap_or_default();
    let name = segments.next().filter(|name| !name.is_empty());
    let operator = match segments.next() {
      None | Some("") => Operator::Eq,
      Some(op) => Operator::parse(op)?,
    };

    let unsatisfiable = || Self::Unsatisfiable { key: key.to_owned() };
    match (kind, name) {
      ("facts", Some(name)) => Some(Self::Fact {
        name: name.to_owned(),
        operator,
        value: literal.to_owned(),
      }),
      ("facts", None) => Some(unsatisfiable()),
      ("meta", Some("timestamp")) => Some(
        parse_timestamp(literal)
          .map(|at| Self::Timestamp { operator, at })
          .unwrap_or_else(unsatisfiable),
      ),
      _ => None,
    }
  }

  /// The set of node names satisfying this predicate in isolation.
  pub async fn matching_nodes<S: FactStore>(
    &self,
    store: &S,
  ) -> Result<BTreeSet<String>, S::Error> {
    match self {
      Self::Fact { name, operator: Operator::Eq, value } => {
        store.nodes_with_fact_value(name, value).await
      }
      Self::Fact { name, operator: Operator::Ne, value } => {
        store.nodes_without_fact_value(name, value).await
      }
      Self::Fact { name, operator, value } => {
        let rhs = loose_float(value);
        let facts = store.find_facts_by_name(name).await?;
        Ok(
          facts
            .into_iter()
            .filter(|nf| operator.holds(&loose_float(&nf.fact.value), &rhs))
            .map(|nf| nf.node_name)
            .collect(),
        )
      }
      Self::Timestamp { operator, at } => {
        store.nodes_by_timestamp(*operator, *at).await
      }
      Self::Unsatisfiable { key } => {
        tracing::debug!(key = %key, "search option can never match");
        Ok(BTreeSet::new())
      }
    }
  }
}

/// Parse a timestamp literal: RFC 3339, or a naive date-time / date taken as
/// UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}
