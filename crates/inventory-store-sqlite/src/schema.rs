//! SQL schema for the inventory SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS inventory_nodes (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL UNIQUE,
    timestamp  TEXT NOT NULL          -- fixed-width RFC 3339 UTC, micros
);

-- Replaced wholesale on every write for a node; never patched in place.
CREATE TABLE IF NOT EXISTS inventory_facts (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    node_id  INTEGER NOT NULL REFERENCES inventory_nodes(id) ON DELETE CASCADE,
    name     TEXT NOT NULL,
    value    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS inventory_facts_node_idx ON inventory_facts(node_id);
CREATE INDEX IF NOT EXISTS inventory_facts_name_idx ON inventory_facts(name, value);
CREATE INDEX IF NOT EXISTS inventory_nodes_ts_idx   ON inventory_nodes(timestamp);

PRAGMA user_version = 1;
";
