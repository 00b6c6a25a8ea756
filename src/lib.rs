//! # joinwise
//!
//! Infers relationships between independently-sourced tables and compiles
//! declarative field requests into multi-table SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        MetadataStore (ColumnStats per table)             │
//! │        + ValueOracle (containment, exact uniqueness)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [key identification]
//! ┌─────────────────────────────────────────────────────────┐
//! │              KeyCandidate per table                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [pairwise resolution, rayon]
//! ┌─────────────────────────────────────────────────────────┐
//! │       LinkSet (PredictedLink, fingerprinted)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [graph builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │          RelationshipGraph (join trees, paths)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]  ◄── ProductSpec
//! ┌─────────────────────────────────────────────────────────┐
//! │                    QueryPlan                             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::render]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    SQL text                              │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod metadata;
pub mod semantic;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::metadata::{
        Catalog, ColumnStats, InMemoryOracle, LogicalType, MetadataStore, TableStats, ValueOracle,
    };
    pub use crate::semantic::inference::resolve_all;
    pub use crate::semantic::planner::{
        CompiledQuery, DimensionFunc, FieldId, FieldRequest, FilterSpec, MeasureFunc,
        PlannerConfig, ProductSpec, QueryPlan, QueryPlanner,
    };
    pub use crate::semantic::{
        InferenceConfig, LinkSet, PlanningError, PredictedLink, RelationshipGraph,
    };
    pub use crate::sql::{render, render_with, Canonical, SqlDialect};
}

pub use semantic::{PlanningError, ResolveError};
