//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with microsecond
//! precision, so comparing the strings in SQL compares the instants.

use chrono::{DateTime, SecondsFormat, Utc};
use inventory_core::{
  model::{Fact, NamedFact, Node},
  predicate::Operator,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Operator ────────────────────────────────────────────────────────────────

/// The SQL comparison for an operator. Only ever interpolated from this
/// closed table, never from caller input.
pub fn encode_operator(op: Operator) -> &'static str {
  match op {
    Operator::Eq => "=",
    Operator::Ne => "!=",
    Operator::Gt => ">",
    Operator::Lt => "<",
    Operator::Ge => ">=",
    Operator::Le => "<=",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// A row of `inventory_facts`.
pub struct RawFact {
  pub fact_id: i64,
  pub node_id: i64,
  pub name:    String,
  pub value:   String,
}

impl RawFact {
  pub fn into_fact(self) -> Fact {
    Fact {
      fact_id: self.fact_id,
      node_id: self.node_id,
      name:    self.name,
      value:   self.value,
    }
  }
}

/// A fact row joined with its owning node's name.
pub struct RawNamedFact {
  pub node_name: String,
  pub fact:      RawFact,
}

impl RawNamedFact {
  pub fn into_named_fact(self) -> NamedFact {
    NamedFact { node_name: self.node_name, fact: self.fact.into_fact() }
  }
}

/// A row of `inventory_nodes` plus all of its fact rows.
pub struct RawNode {
  pub node_id:   i64,
  pub name:      String,
  pub timestamp: String,
  pub facts:     Vec<RawFact>,
}

impl RawNode {
  pub fn into_node(self) -> Result<Node> {
    Ok(Node {
      node_id:   self.node_id,
      name:      self.name,
      timestamp: decode_dt(&self.timestamp)?,
      facts:     self.facts.into_iter().map(RawFact::into_fact).collect(),
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let early = Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap();
    let late = early + chrono::Duration::microseconds(1);
    let later = Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 10).unwrap();

    let (a, b, c) = (encode_dt(early), encode_dt(late), encode_dt(later));
    assert_eq!(a, "2011-01-01T00:00:00.000000Z");
    assert_eq!(a.len(), b.len());
    assert!(a < b && b < c);
    assert_eq!(decode_dt(&b).unwrap(), late);
  }
}
