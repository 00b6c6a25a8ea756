//! Column and table statistics consumed by inference.

use serde::{Deserialize, Serialize};

/// Logical type assigned to a column by the profiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    Categorical,
    Numeric,
    Temporal,
    #[serde(alias = "identifier_like", alias = "id")]
    Identifier,
    #[default]
    Unknown,
}

impl LogicalType {
    pub fn is_identifier(self) -> bool {
        matches!(self, LogicalType::Identifier)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, LogicalType::Temporal)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, LogicalType::Numeric)
    }

    /// Whether two columns may hold values drawn from the same domain.
    ///
    /// Temporal columns only pair with temporal columns.
    pub fn compatible_with(self, other: LogicalType) -> bool {
        self.is_temporal() == other.is_temporal()
    }
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalType::Categorical => write!(f, "categorical"),
            LogicalType::Numeric => write!(f, "numeric"),
            LogicalType::Temporal => write!(f, "temporal"),
            LogicalType::Identifier => write!(f, "identifier"),
            LogicalType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Profiling statistics for one column.
///
/// Any count may be missing. Missing counts make [`uniqueness`](Self::uniqueness)
/// and [`completeness`](Self::completeness) unknown, and unknown statistics
/// never produce a key or a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub table: String,
    pub column: String,
    #[serde(default)]
    pub row_count: Option<u64>,
    #[serde(default)]
    pub null_count: Option<u64>,
    #[serde(default)]
    pub distinct_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_values: Vec<serde_json::Value>,
    #[serde(default)]
    pub logical_type: LogicalType,
}

impl ColumnStats {
    pub fn new(table: impl Into<String>, column: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            row_count: None,
            null_count: None,
            distinct_count: None,
            sample_values: Vec::new(),
            logical_type,
        }
    }

    /// Builder: set row, null and distinct counts.
    pub fn with_counts(mut self, row_count: u64, null_count: u64, distinct_count: u64) -> Self {
        self.row_count = Some(row_count);
        self.null_count = Some(null_count);
        self.distinct_count = Some(distinct_count);
        self
    }

    pub fn with_samples(mut self, samples: Vec<serde_json::Value>) -> Self {
        self.sample_values = samples;
        self
    }

    pub fn non_null_count(&self) -> Option<u64> {
        let rows = self.row_count?;
        let nulls = self.null_count?;
        Some(rows.saturating_sub(nulls))
    }

    /// distinct / non-null, capped at 1.0.
    pub fn uniqueness(&self) -> Option<f64> {
        let non_null = self.non_null_count()?;
        let distinct = self.distinct_count?;
        if non_null == 0 {
            return None;
        }
        Some((distinct.min(non_null) as f64 / non_null as f64).min(1.0))
    }

    /// 1 - nulls / rows.
    pub fn completeness(&self) -> Option<f64> {
        let rows = self.row_count?;
        let nulls = self.null_count?;
        if rows == 0 {
            return None;
        }
        Some(1.0 - (nulls.min(rows) as f64 / rows as f64))
    }

    /// True when every count is present.
    pub fn is_known(&self) -> bool {
        self.row_count.is_some() && self.null_count.is_some() && self.distinct_count.is_some()
    }
}

/// Statistics for all columns of one table, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    pub name: String,
    pub columns: Vec<ColumnStats>,
}

impl TableStats {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnStats>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.column == name)
    }

    /// Row count reported by the first column that knows it.
    pub fn row_count(&self) -> Option<u64> {
        self.columns.iter().find_map(|c| c.row_count)
    }
}
