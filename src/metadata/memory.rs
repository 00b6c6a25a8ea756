//! In-memory value oracle over row data.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::oracle::{
    ColumnSet, CombinationStats, Containment, OracleError, OracleResult, ValueOracle,
};

/// Rows of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl TableData {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    fn column_index(&self, column: &str) -> OracleResult<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| OracleError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Distinct complete tuples for the given columns, plus the complete row count.
    fn tuples(&self, columns: &[String]) -> OracleResult<(HashSet<Vec<String>>, u64)> {
        let indexes = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<OracleResult<Vec<_>>>()?;

        let mut distinct = HashSet::new();
        let mut complete = 0u64;
        for row in &self.rows {
            let tuple: Option<Vec<String>> = indexes
                .iter()
                .map(|&i| row.get(i).and_then(value_key))
                .collect();
            if let Some(tuple) = tuple {
                complete += 1;
                distinct.insert(tuple);
            }
        }
        Ok((distinct, complete))
    }
}

/// Canonical text form of a value; `None` for SQL NULL.
pub(super) fn value_key(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A [`ValueOracle`] that answers from rows held in memory.
///
/// Values compare by their text form, so `1` and `"1"` are the same key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOracle {
    tables: BTreeMap<String, TableData>,
}

impl InMemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableData) -> Self {
        self.add_table(table);
        self
    }

    pub fn add_table(&mut self, table: TableData) {
        self.tables.insert(table.name.clone(), table);
    }

    fn table(&self, name: &str) -> OracleResult<&TableData> {
        self.tables
            .get(name)
            .ok_or_else(|| OracleError::UnknownTable(name.to_string()))
    }
}

impl FromIterator<TableData> for InMemoryOracle {
    fn from_iter<I: IntoIterator<Item = TableData>>(iter: I) -> Self {
        let mut oracle = Self::new();
        for table in iter {
            oracle.add_table(table);
        }
        oracle
    }
}

impl ValueOracle for InMemoryOracle {
    fn containment(&self, from: &ColumnSet, to: &ColumnSet) -> OracleResult<Containment> {
        if from.arity() != to.arity() || from.arity() == 0 {
            return Err(OracleError::Unsupported(format!(
                "containment between {} and {} needs equal, non-zero arity",
                from, to
            )));
        }
        let (from_values, _) = self.table(&from.table)?.tuples(&from.columns)?;
        let (to_values, _) = self.table(&to.table)?.tuples(&to.columns)?;
        let intersect = from_values.iter().filter(|v| to_values.contains(*v)).count();

        Ok(Containment {
            from_distinct: from_values.len() as u64,
            intersect_count: intersect as u64,
            sampled: false,
        })
    }

    fn combination_stats(&self, columns: &ColumnSet) -> OracleResult<CombinationStats> {
        let table = self.table(&columns.table)?;
        let (distinct, complete) = table.tuples(&columns.columns)?;
        Ok(CombinationStats {
            row_count: table.rows.len() as u64,
            complete_rows: complete,
            distinct_combinations: distinct.len() as u64,
        })
    }
}
