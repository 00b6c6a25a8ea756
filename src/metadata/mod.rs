//! Metadata module.
//!
//! This module holds the read-only view of profiled tables and the value
//! oracle used to compare column domains.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MetadataStore                              │
//! │  - tables()                  - column(table, column)            │
//! │  - table(name)               - fingerprint()                    │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │ ColumnStats (from the profiler)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ValueOracle                                │
//! │  - containment(from, to)     (FK candidate values ⊂ key values) │
//! │  - combination_stats(cols)   (exact composite uniqueness)       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statistics are produced elsewhere; nothing here computes them. The oracle
//! is a collaborator that may be backed by a warehouse, so every call returns
//! a `Result` and errors propagate to the caller.
//!
//! # Example
//!
//! ```ignore
//! use joinwise::metadata::{ColumnStats, LogicalType, MetadataStore};
//!
//! let store = MetadataStore::from_columns(vec![
//!     ColumnStats::new("customers", "id", LogicalType::Identifier).with_counts(100, 0, 100),
//! ]);
//! assert!(store.column("customers", "id").is_some());
//! ```

mod catalog;
mod memory;
mod oracle;
mod store;
mod types;

pub use catalog::{Catalog, CatalogColumn, CatalogError, CatalogTable};
pub use memory::{InMemoryOracle, TableData};
pub use oracle::{
    ColumnSet, CombinationStats, Containment, OracleError, OracleResult, ValueOracle,
};
pub use store::MetadataStore;
pub use types::*;
