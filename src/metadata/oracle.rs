//! Value oracle: the collaborator that answers questions about actual values.

use serde::{Deserialize, Serialize};

/// Errors returned by a value oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column: {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error("Unsupported oracle request: {0}")]
    Unsupported(String),

    #[error("Oracle backend error: {0}")]
    Backend(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

/// An ordered list of columns of one table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnSet {
    pub table: String,
    pub columns: Vec<String>,
}

impl ColumnSet {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    pub fn single(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(table, vec![column.into()])
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

impl std::fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.table, self.columns.join(", "))
    }
}

/// How many distinct `from` value tuples also occur in `to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Containment {
    /// Distinct non-null tuples on the `from` side.
    pub from_distinct: u64,
    /// Distinct `from` tuples present in `to`.
    pub intersect_count: u64,
    /// Whether the counts come from a sample rather than the full data.
    #[serde(default)]
    pub sampled: bool,
}

impl Containment {
    /// Fraction of distinct `from` tuples found in `to`. Zero when `from` is empty.
    pub fn score(&self) -> f64 {
        if self.from_distinct == 0 {
            return 0.0;
        }
        (self.intersect_count.min(self.from_distinct) as f64) / (self.from_distinct as f64)
    }
}

/// Exact uniqueness facts about a column combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationStats {
    pub row_count: u64,
    /// Rows where every column is non-null.
    pub complete_rows: u64,
    /// Distinct tuples among complete rows.
    pub distinct_combinations: u64,
}

impl CombinationStats {
    /// A combination is an exact key when every complete row has its own tuple.
    pub fn is_unique(&self) -> bool {
        self.complete_rows > 0 && self.distinct_combinations == self.complete_rows
    }

    pub fn completeness(&self) -> f64 {
        if self.row_count == 0 {
            return 0.0;
        }
        self.complete_rows as f64 / self.row_count as f64
    }
}

/// Answers value-level questions the statistics cannot.
///
/// Implementations may query a warehouse; calls are fallible and errors are
/// propagated by callers without retry.
pub trait ValueOracle: Send + Sync {
    /// Containment of the distinct `from` tuples in the `to` tuples.
    fn containment(&self, from: &ColumnSet, to: &ColumnSet) -> OracleResult<Containment>;

    /// Exact combination uniqueness for a set of columns of one table.
    fn combination_stats(&self, columns: &ColumnSet) -> OracleResult<CombinationStats>;
}

impl<T: ValueOracle + ?Sized> ValueOracle for &T {
    fn containment(&self, from: &ColumnSet, to: &ColumnSet) -> OracleResult<Containment> {
        (**self).containment(from, to)
    }

    fn combination_stats(&self, columns: &ColumnSet) -> OracleResult<CombinationStats> {
        (**self).combination_stats(columns)
    }
}
