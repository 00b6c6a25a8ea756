//! Product specs: the declarative request the planner compiles.
//!
//! A product spec arrives as JSON:
//!
//! ```json
//! {
//!   "name": "orders_by_customer",
//!   "fields": [
//!     {"id": "customers.name", "name": "customer_name"},
//!     {"id": "orders.id", "name": "order_count", "category": "measure", "measure_func": "count"}
//!   ],
//!   "filter": {
//!     "selections": [{"id": "customers.region", "values": ["EU"]}],
//!     "sort_by": [{"id": "order_count", "direction": "desc"}],
//!     "limit": 10
//!   }
//! }
//! ```
//!
//! Field ids are parsed into [`FieldId`] during deserialization, so a
//! malformed id fails at the boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A field id that is not `table.column`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid field id '{0}': expected table.column")]
pub struct InvalidFieldId(pub String);

/// An unrecognised function name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} function: {name}")]
pub struct UnknownFunction {
    pub kind: &'static str,
    pub name: String,
}

// ============================================================================
// Field ids
// ============================================================================

/// A `table.column` reference. The table is everything before the first dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldId {
    pub table: String,
    pub column: String,
}

impl FieldId {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl FromStr for FieldId {
    type Err = InvalidFieldId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                Ok(Self::new(table, column))
            }
            _ => Err(InvalidFieldId(s.to_string())),
        }
    }
}

impl TryFrom<String> for FieldId {
    type Error = InvalidFieldId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FieldId> for String {
    fn from(id: FieldId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

// ============================================================================
// Field requests
// ============================================================================

/// Whether a field is grouped on or aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    #[default]
    Dimension,
    Measure,
}

/// Aggregate applied to a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MeasureFunc {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
}

impl MeasureFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasureFunc::Count => "count",
            MeasureFunc::CountDistinct => "count_distinct",
            MeasureFunc::Sum => "sum",
            MeasureFunc::Avg => "avg",
            MeasureFunc::Min => "min",
            MeasureFunc::Max => "max",
        }
    }

    /// sum and avg only make sense over numbers.
    pub fn requires_numeric(self) -> bool {
        matches!(self, MeasureFunc::Sum | MeasureFunc::Avg)
    }
}

impl FromStr for MeasureFunc {
    type Err = UnknownFunction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(MeasureFunc::Count),
            "count_distinct" | "distinct_count" => Ok(MeasureFunc::CountDistinct),
            "sum" => Ok(MeasureFunc::Sum),
            "avg" | "mean" => Ok(MeasureFunc::Avg),
            "min" => Ok(MeasureFunc::Min),
            "max" => Ok(MeasureFunc::Max),
            _ => Err(UnknownFunction {
                kind: "measure",
                name: s.to_string(),
            }),
        }
    }
}

/// Date truncation applied to a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DimensionFunc {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
}

impl DimensionFunc {
    /// The DATE_TRUNC unit.
    pub fn as_str(self) -> &'static str {
        match self {
            DimensionFunc::Year => "year",
            DimensionFunc::Quarter => "quarter",
            DimensionFunc::Month => "month",
            DimensionFunc::Week => "week",
            DimensionFunc::Day => "day",
            DimensionFunc::Hour => "hour",
        }
    }
}

impl FromStr for DimensionFunc {
    type Err = UnknownFunction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" => Ok(DimensionFunc::Year),
            "quarter" => Ok(DimensionFunc::Quarter),
            "month" => Ok(DimensionFunc::Month),
            "week" => Ok(DimensionFunc::Week),
            "day" | "date" => Ok(DimensionFunc::Day),
            "hour" => Ok(DimensionFunc::Hour),
            _ => Err(UnknownFunction {
                kind: "dimension",
                name: s.to_string(),
            }),
        }
    }
}

macro_rules! string_conversions {
    ($ty:ty) => {
        impl TryFrom<String> for $ty {
            type Error = UnknownFunction;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for String {
            fn from(f: $ty) -> Self {
                f.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_conversions!(MeasureFunc);
string_conversions!(DimensionFunc);

/// One requested output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRequest {
    pub id: FieldId,
    /// Output name; defaults to the column name.
    #[serde(default, rename = "name", alias = "alias", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, rename = "category", alias = "role")]
    pub role: FieldRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_func: Option<MeasureFunc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_func: Option<DimensionFunc>,
}

impl FieldRequest {
    pub fn dimension(id: FieldId) -> Self {
        Self {
            id,
            alias: None,
            role: FieldRole::Dimension,
            measure_func: None,
            dimension_func: None,
        }
    }

    pub fn measure(id: FieldId, func: MeasureFunc) -> Self {
        Self {
            id,
            alias: None,
            role: FieldRole::Measure,
            measure_func: Some(func),
            dimension_func: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_dimension_func(mut self, func: DimensionFunc) -> Self {
        self.dimension_func = Some(func);
        self
    }

    /// A field is a measure when declared one or when it names an aggregate.
    pub fn is_measure(&self) -> bool {
        self.role == FieldRole::Measure || self.measure_func.is_some()
    }

    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.id.column)
    }
}

// ============================================================================
// Filters
// ============================================================================

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Null test attached to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullCheck {
    IsNull,
    IsNotNull,
}

/// Membership filter: `IN`, `NOT IN`, and/or a null test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub id: FieldId,
    #[serde(default)]
    pub values: Vec<FilterValue>,
    #[serde(default)]
    pub exclude: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null: Option<NullCheck>,
}

/// How a wildcard value is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    StartsWith,
    EndsWith,
    #[default]
    Contains,
    Exact,
}

/// Text match filter, compiled to LIKE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wildcard {
    pub id: FieldId,
    pub value: String,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub exclude: bool,
}

/// Sort direction of a sort entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ASC", alias = "ascending")]
    Asc,
    #[serde(alias = "DESC", alias = "descending")]
    Desc,
}

/// A sort entry; `id` is an alias or a `table.column` id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub id: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub wildcards: Vec<Wildcard>,
    #[serde(default)]
    pub sort_by: Vec<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// A named request for fields, filters and ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub name: String,
    pub fields: Vec<FieldRequest>,
    #[serde(default)]
    pub filter: FilterSpec,
}

impl ProductSpec {
    pub fn new(name: impl Into<String>, fields: Vec<FieldRequest>) -> Self {
        Self {
            name: name.into(),
            fields,
            filter: FilterSpec::default(),
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }
}
