//! Read-only snapshot of profiled tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{ColumnStats, TableStats};
use crate::cache::compute_hash;

/// In-memory view of every table and its column statistics.
///
/// Tables are keyed by name in a `BTreeMap`, so iteration order and the
/// serialized form are stable. That stability is what makes
/// [`fingerprint`](Self::fingerprint) a usable staleness check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataStore {
    tables: BTreeMap<String, TableStats>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a flat list of column statistics, grouping by table.
    pub fn from_columns(columns: impl IntoIterator<Item = ColumnStats>) -> Self {
        let mut store = Self::new();
        for stats in columns {
            store.add_column(stats);
        }
        store
    }

    pub fn from_tables(tables: impl IntoIterator<Item = TableStats>) -> Self {
        let mut store = Self::new();
        for table in tables {
            store.add_table(table);
        }
        store
    }

    /// Insert or replace a table.
    pub fn add_table(&mut self, table: TableStats) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Append a column to its table, creating the table if needed.
    pub fn add_column(&mut self, stats: ColumnStats) {
        let table = self
            .tables
            .entry(stats.table.clone())
            .or_insert_with(|| TableStats::new(stats.table.clone(), Vec::new()));
        match table.columns.iter_mut().find(|c| c.column == stats.column) {
            Some(existing) => *existing = stats,
            None => table.columns.push(stats),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableStats> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table(&self, name: &str) -> Option<&TableStats> {
        self.tables.get(name)
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnStats> {
        self.tables.get(table)?.column(column)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// SHA-256 of the store's canonical JSON.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        compute_hash(self)
    }
}
