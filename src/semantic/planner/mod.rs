//! Query planning: product spec + relationship graph → canonical plan.
//!
//! Planning runs in a fixed order:
//! 1. Select list: validate every field against the metadata and wrap it in
//!    its aggregate or date truncation.
//! 2. Predicates from selections and wildcards, ANDed.
//! 3. GROUP BY: every non-measure select expression when any measure exists.
//! 4. ORDER BY: aliases first, then raw `table.column` ids.
//! 5. Joins: a tree over every referenced table, rooted at the first
//!    measure's table.
//!
//! The planner holds only shared references and never mutates the graph, so
//! any number of planners can run against one graph at once.

mod filters;
mod plan;
mod product;

pub use filters::{like_pattern, LIKE_ESCAPE};
pub use plan::{JoinKind, JoinStep, PlanExpr, Predicate, QueryPlan, SelectItem, SortItem};
pub use product::{
    DimensionFunc, FieldId, FieldRequest, FieldRole, FilterSpec, FilterValue, InvalidFieldId,
    MatchMode, MeasureFunc, NullCheck, ProductSpec, Selection, SortBy, SortDirection,
    UnknownFunction, Wildcard,
};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metadata::{LogicalType, MetadataStore};
use crate::semantic::error::{PlanningError, PlanningResult};
use crate::semantic::graph::RelationshipGraph;

/// Planner options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Join type for every join step.
    #[serde(default)]
    pub join_kind: JoinKind,
}

impl PlannerConfig {
    pub fn with_join_kind(mut self, kind: JoinKind) -> Self {
        self.join_kind = kind;
        self
    }
}

/// A plan and the SQL rendered from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub plan: QueryPlan,
    pub sql: String,
}

/// Compiles product specs against one metadata snapshot and its graph.
pub struct QueryPlanner<'a> {
    store: &'a MetadataStore,
    graph: &'a RelationshipGraph,
    config: PlannerConfig,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(store: &'a MetadataStore, graph: &'a RelationshipGraph, config: PlannerConfig) -> Self {
        Self {
            store,
            graph,
            config,
        }
    }

    /// Build the canonical plan for `spec`.
    pub fn plan(&self, spec: &ProductSpec) -> PlanningResult<QueryPlan> {
        if spec.fields.is_empty() {
            return Err(PlanningError::EmptyProduct(spec.name.clone()));
        }

        let select = self.select_list(&spec.fields)?;
        let mut required: BTreeSet<String> =
            spec.fields.iter().map(|f| f.id.table.clone()).collect();

        let mut predicates = Vec::new();
        for selection in &spec.filter.selections {
            self.column_type(&selection.id)?;
            required.insert(selection.id.table.clone());
            predicates.extend(filters::selection_predicates(selection));
        }
        for wildcard in &spec.filter.wildcards {
            self.column_type(&wildcard.id)?;
            required.insert(wildcard.id.table.clone());
            predicates.push(filters::wildcard_predicate(wildcard));
        }

        let group_by = group_by_of(&select);
        let order_by = self.order_by(&spec.filter.sort_by, &select, &group_by, &mut required)?;

        let root = spec
            .fields
            .iter()
            .find(|f| f.is_measure())
            .unwrap_or(&spec.fields[0])
            .id
            .table
            .clone();
        let (tables, joins) = self.join_steps(&root, &required)?;

        debug!(
            product = %spec.name,
            root = %root,
            tables = tables.len(),
            joins = joins.len(),
            "planned product"
        );

        Ok(QueryPlan {
            name: spec.name.clone(),
            root_table: root,
            tables,
            joins,
            select,
            group_by,
            filter: Predicate::all(predicates),
            order_by,
            limit: spec.filter.limit,
            source_fingerprint: self.graph.fingerprint().to_string(),
        })
    }

    /// Plan `spec` and render it in the canonical dialect.
    pub fn compile(&self, spec: &ProductSpec) -> PlanningResult<CompiledQuery> {
        let plan = self.plan(spec)?;
        let sql = crate::sql::render(&plan);
        Ok(CompiledQuery { plan, sql })
    }

    fn column_type(&self, id: &FieldId) -> PlanningResult<LogicalType> {
        self.store
            .column(&id.table, &id.column)
            .map(|c| c.logical_type)
            .ok_or_else(|| PlanningError::UnknownField {
                table: id.table.clone(),
                column: id.column.clone(),
            })
    }

    fn select_list(&self, fields: &[FieldRequest]) -> PlanningResult<Vec<SelectItem>> {
        let mut seen = BTreeSet::new();
        let mut items = Vec::with_capacity(fields.len());
        for field in fields {
            let item = self.select_item(field)?;
            if !seen.insert(item.alias.clone()) {
                return Err(PlanningError::DuplicateAlias(item.alias));
            }
            items.push(item);
        }
        Ok(items)
    }

    fn select_item(&self, field: &FieldRequest) -> PlanningResult<SelectItem> {
        let ty = self.column_type(&field.id)?;
        let alias = field.output_name().to_string();

        if field.is_measure() {
            let func = field
                .measure_func
                .ok_or_else(|| PlanningError::MissingMeasureFunc(field.id.to_string()))?;
            // Unknown types get the benefit of the doubt.
            if func.requires_numeric() && ty != LogicalType::Unknown && !ty.is_numeric() {
                return Err(PlanningError::IncompatibleAggregation {
                    field: field.id.to_string(),
                    func: func.to_string(),
                });
            }
            return Ok(SelectItem {
                expr: PlanExpr::Aggregate {
                    func,
                    field: field.id.clone(),
                },
                alias,
                role: FieldRole::Measure,
            });
        }

        let expr = match field.dimension_func {
            Some(func) if ty != LogicalType::Unknown && !ty.is_temporal() => {
                return Err(PlanningError::IncompatibleDimensionFunc {
                    field: field.id.to_string(),
                    func: func.to_string(),
                });
            }
            Some(func) => PlanExpr::Truncate {
                func,
                field: field.id.clone(),
            },
            None => PlanExpr::Column {
                field: field.id.clone(),
            },
        };
        Ok(SelectItem {
            expr,
            alias,
            role: FieldRole::Dimension,
        })
    }

    fn order_by(
        &self,
        sort_by: &[SortBy],
        select: &[SelectItem],
        group_by: &[PlanExpr],
        required: &mut BTreeSet<String>,
    ) -> PlanningResult<Vec<SortItem>> {
        let aggregated = select.iter().any(|s| s.expr.is_aggregate());
        let mut items = Vec::with_capacity(sort_by.len());

        for sort in sort_by {
            let expr = if let Some(item) = select.iter().find(|s| s.alias == sort.id) {
                item.expr.clone()
            } else {
                let id: FieldId = sort
                    .id
                    .parse()
                    .map_err(|_| PlanningError::UnknownAlias(sort.id.clone()))?;
                self.column_type(&id)?;
                let expr = PlanExpr::Column { field: id };
                if aggregated && !group_by.contains(&expr) {
                    return Err(PlanningError::UngroupedColumn(expr.field().to_string()));
                }
                required.insert(expr.field().table.clone());
                expr
            };
            items.push(SortItem {
                expr,
                direction: sort.direction,
            });
        }
        Ok(items)
    }

    fn join_steps(
        &self,
        root: &str,
        required: &BTreeSet<String>,
    ) -> PlanningResult<(Vec<String>, Vec<JoinStep>)> {
        if required.len() <= 1 {
            return Ok((vec![root.to_string()], Vec::new()));
        }

        let tree = self
            .graph
            .connect_from(root, required.iter().map(String::as_str))?;
        let tables = tree.tables().into_iter().map(str::to_string).collect();
        let joins = tree
            .edges
            .iter()
            .map(|edge| JoinStep {
                left_table: edge.parent.clone(),
                right_table: edge.child.clone(),
                on_left_cols: edge.parent_columns().to_vec(),
                on_right_cols: edge.child_columns().to_vec(),
                join_kind: self.config.join_kind,
                confidence: edge.link.confidence,
            })
            .collect();
        Ok((tables, joins))
    }
}

/// Non-measure select expressions, deduplicated, when any measure is present.
fn group_by_of(select: &[SelectItem]) -> Vec<PlanExpr> {
    if !select.iter().any(|s| s.expr.is_aggregate()) {
        return Vec::new();
    }
    let mut out: Vec<PlanExpr> = Vec::new();
    for item in select.iter().filter(|s| !s.expr.is_aggregate()) {
        if !out.contains(&item.expr) {
            out.push(item.expr.clone());
        }
    }
    out
}
