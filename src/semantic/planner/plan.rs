//! The canonical query plan.
//!
//! A plan is the planner's only output and the SQL assembler's only input.
//! It names tables and columns directly and holds no dialect details.

use serde::{Deserialize, Serialize};

use super::product::{DimensionFunc, FieldId, FieldRole, FilterValue, MeasureFunc, SortDirection};

/// A value-producing expression over one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanExpr {
    Column { field: FieldId },
    Truncate { func: DimensionFunc, field: FieldId },
    Aggregate { func: MeasureFunc, field: FieldId },
}

impl PlanExpr {
    pub fn field(&self) -> &FieldId {
        match self {
            PlanExpr::Column { field }
            | PlanExpr::Truncate { field, .. }
            | PlanExpr::Aggregate { field, .. } => field,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, PlanExpr::Aggregate { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub expr: PlanExpr,
    pub alias: String,
    pub role: FieldRole,
}

/// Join type used for every join step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    #[default]
    Left,
    Inner,
}

/// `right_table` joins onto the already-joined `left_table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinStep {
    pub left_table: String,
    pub right_table: String,
    pub on_left_cols: Vec<String>,
    pub on_right_cols: Vec<String>,
    pub join_kind: JoinKind,
    /// Confidence of the link this join follows.
    pub confidence: f64,
}

/// WHERE predicate tree. Only conjunction is expressible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    And { predicates: Vec<Predicate> },
    InList {
        field: FieldId,
        values: Vec<FilterValue>,
        negated: bool,
    },
    IsNull { field: FieldId, negated: bool },
    Like {
        field: FieldId,
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        escape: Option<char>,
        negated: bool,
    },
}

impl Predicate {
    /// AND the predicates together; `None` when there are none.
    pub fn all(mut predicates: Vec<Predicate>) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::And { predicates }),
        }
    }

    /// Leaf predicates in order.
    pub fn conjuncts(&self) -> Vec<&Predicate> {
        match self {
            Predicate::And { predicates } => predicates.iter().flat_map(|p| p.conjuncts()).collect(),
            leaf => vec![leaf],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortItem {
    pub expr: PlanExpr,
    pub direction: SortDirection,
}

/// A complete, dialect-neutral query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub name: String,
    /// The FROM table.
    pub root_table: String,
    /// Every table in the query, root first, then in join order.
    pub tables: Vec<String>,
    pub joins: Vec<JoinStep>,
    pub select: Vec<SelectItem>,
    /// Non-measure select expressions, when any measure is present.
    pub group_by: Vec<PlanExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Predicate>,
    pub order_by: Vec<SortItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Fingerprint of the links the join path came from.
    #[serde(default)]
    pub source_fingerprint: String,
}

impl QueryPlan {
    pub fn is_aggregated(&self) -> bool {
        self.select.iter().any(|s| s.expr.is_aggregate())
    }
}
