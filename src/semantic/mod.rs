//! Semantic layer - relationship discovery and query planning.
//!
//! Data flows one way:
//!
//! 1. **Inference** - propose a key per table, then predict links between
//!    every pair of tables from value containment
//! 2. **Graph** - collect the links into a weighted table graph
//! 3. **Planner** - turn a product spec into a canonical query plan, joining
//!    through the graph
//!
//! SQL text is produced from the plan by [`crate::sql::render`].

pub mod error;
pub mod graph;
pub mod inference;
pub mod planner;

pub use error::{PlanningError, PlanningResult, ResolveError, ResolveResult};
pub use graph::{JoinPath, JoinTree, RelationshipGraph, TreeEdge};
pub use inference::{
    resolve_all, Cardinality, InferenceConfig, KeyCandidate, KeyIdentifier, LinkSet,
    PredictedLink, Resolver,
};
pub use planner::{
    CompiledQuery, FieldId, FieldRequest, FilterSpec, PlannerConfig, ProductSpec, QueryPlan,
    QueryPlanner,
};
