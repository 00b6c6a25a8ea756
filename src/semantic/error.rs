//! Error types for relationship resolution and query planning.
//!
//! "No key" and "no link" are not errors: they surface as `None` and empty
//! link lists. Everything here is fatal to the request that raised it and
//! names the offending table, column or alias.

use crate::metadata::OracleError;

/// Result type for planning operations.
pub type PlanningResult<T> = Result<T, PlanningError>;

/// Result type for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Failures while resolving links between tables.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The value oracle failed while comparing two tables.
    #[error("Oracle failed while resolving {from} -> {to}: {source}")]
    Oracle {
        from: String,
        to: String,
        #[source]
        source: OracleError,
    },

    /// The value oracle failed during composite key search.
    #[error("Oracle failed while identifying the key of {table}: {source}")]
    KeyIdentification {
        table: String,
        #[source]
        source: OracleError,
    },

    /// The metadata snapshot could not be fingerprinted.
    #[error("Failed to fingerprint metadata: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Failures while turning a product spec into a query plan.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanningError {
    /// A field id names a table or column the metadata does not know.
    #[error("Unknown field: {table}.{column}")]
    UnknownField { table: String, column: String },

    /// A required table cannot be reached from the rest of the join tree.
    #[error("No join path reaches table '{0}'")]
    DisconnectedGraph(String),

    /// A sort entry is neither a declared alias nor a field id.
    #[error("Unknown alias: {0}")]
    UnknownAlias(String),

    /// sum/avg requested on a column that is not numeric.
    #[error("Cannot apply {func} to non-numeric field {field}")]
    IncompatibleAggregation { field: String, func: String },

    /// A measure was declared without an aggregate function.
    #[error("Measure {0} has no measure_func")]
    MissingMeasureFunc(String),

    /// Date truncation requested on a column that is not temporal.
    #[error("Cannot apply {func} to non-temporal field {field}")]
    IncompatibleDimensionFunc { field: String, func: String },

    /// Two select items share an output name.
    #[error("Duplicate alias: {0}")]
    DuplicateAlias(String),

    /// The product declares no fields.
    #[error("Product '{0}' declares no fields")]
    EmptyProduct(String),

    /// A raw sort column is not grouped in an aggregated query.
    #[error("Column {0} must appear in GROUP BY to be used for sorting")]
    UngroupedColumn(String),
}
