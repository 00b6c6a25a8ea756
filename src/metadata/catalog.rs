//! JSON catalog files: column statistics plus optional row data.
//!
//! ```json
//! {
//!   "tables": [{
//!     "name": "customers",
//!     "columns": [
//!       {"name": "id", "logical_type": "identifier", "row_count": 3, "null_count": 0, "distinct_count": 3},
//!       {"name": "name", "logical_type": "categorical"}
//!     ],
//!     "rows": [["C1", "Ann"], ["C2", "Bob"], ["C3", "Cy"]]
//!   }]
//! }
//! ```
//!
//! Counts given in the file win. A table with rows gets its missing counts
//! from those rows; a table without rows keeps them unknown.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::memory::{value_key, InMemoryOracle, TableData};
use super::store::MetadataStore;
use super::types::{ColumnStats, LogicalType, TableStats};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table {table} row {row} has {found} values, expected {expected}")]
    RowWidth {
        table: String,
        row: usize,
        found: usize,
        expected: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    #[serde(default)]
    pub logical_type: LogicalType,
    #[serde(default)]
    pub row_count: Option<u64>,
    #[serde(default)]
    pub null_count: Option<u64>,
    #[serde(default)]
    pub distinct_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_values: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub name: String,
    pub columns: Vec<CatalogColumn>,
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub tables: Vec<CatalogTable>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Split into the statistics snapshot and an oracle over the rows.
    pub fn into_parts(self) -> Result<(MetadataStore, InMemoryOracle), CatalogError> {
        let mut store = MetadataStore::new();
        let mut oracle = InMemoryOracle::new();

        for table in self.tables {
            let width = table.columns.len();
            if let Some((row, found)) = table
                .rows
                .iter()
                .enumerate()
                .find(|(_, r)| r.len() != width)
                .map(|(i, r)| (i, r.len()))
            {
                return Err(CatalogError::RowWidth {
                    table: table.name,
                    row,
                    found,
                    expected: width,
                });
            }

            let columns = table
                .columns
                .iter()
                .enumerate()
                .map(|(i, col)| column_stats(&table, i, col))
                .collect();
            store.add_table(TableStats::new(table.name.clone(), columns));

            let names = table.columns.into_iter().map(|c| c.name).collect();
            oracle.add_table(TableData::new(table.name, names, table.rows));
        }
        Ok((store, oracle))
    }
}

fn column_stats(table: &CatalogTable, index: usize, col: &CatalogColumn) -> ColumnStats {
    let mut stats = ColumnStats::new(table.name.clone(), col.name.clone(), col.logical_type)
        .with_samples(col.sample_values.clone());
    stats.row_count = col.row_count;
    stats.null_count = col.null_count;
    stats.distinct_count = col.distinct_count;

    if !table.rows.is_empty() {
        let keys: Vec<Option<String>> = table.rows.iter().map(|r| value_key(&r[index])).collect();
        let nulls = keys.iter().filter(|k| k.is_none()).count() as u64;
        let distinct = keys.iter().flatten().collect::<HashSet<_>>().len() as u64;
        stats.row_count.get_or_insert(table.rows.len() as u64);
        stats.null_count.get_or_insert(nulls);
        stats.distinct_count.get_or_insert(distinct);
    }
    stats
}
