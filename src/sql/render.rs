//! QueryPlan → SQL.
//!
//! The plan is lowered onto the [`Query`] builder and serialized through a
//! [`SqlDialect`]. Nothing here makes planning decisions; the plan is
//! rendered as given.

use super::dialect::{Canonical, SqlDialect};
use super::expr::{
    avg, count, count_distinct, date_trunc, lit_bool, lit_float, lit_int, lit_str, max, min, sum,
    table_col, Expr, ExprExt,
};
use super::query::{JoinType, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
use crate::semantic::planner::{
    FieldId, FilterValue, JoinKind, JoinStep, MeasureFunc, PlanExpr, Predicate, QueryPlan,
    SortDirection,
};

/// Render `plan` in the canonical dialect.
pub fn render(plan: &QueryPlan) -> String {
    render_with(plan, &Canonical)
}

pub fn render_with(plan: &QueryPlan, dialect: &dyn SqlDialect) -> String {
    plan_to_query(plan).to_sql(dialect)
}

/// Lower a plan onto the SQL builder.
pub fn plan_to_query(plan: &QueryPlan) -> Query {
    let mut query = Query::new()
        .select(
            plan.select
                .iter()
                .map(|item| SelectExpr::new(plan_expr(&item.expr)).with_alias(&item.alias))
                .collect::<Vec<_>>(),
        )
        .from(TableRef::new(&plan.root_table));

    for step in &plan.joins {
        let join_type = match step.join_kind {
            JoinKind::Left => JoinType::Left,
            JoinKind::Inner => JoinType::Inner,
        };
        query = query.join(join_type, TableRef::new(&step.right_table), join_condition(step));
    }

    if let Some(filter) = &plan.filter {
        query = query.filter(predicate(filter));
    }

    query = query
        .group_by(plan.group_by.iter().map(plan_expr).collect())
        .order_by(
            plan.order_by
                .iter()
                .map(|item| OrderByExpr {
                    expr: plan_expr(&item.expr),
                    dir: match item.direction {
                        SortDirection::Asc => SortDir::Asc,
                        SortDirection::Desc => SortDir::Desc,
                    },
                })
                .collect(),
        );

    match plan.limit {
        Some(n) => query.limit(n),
        None => query,
    }
}

fn column(field: &FieldId) -> Expr {
    table_col(&field.table, &field.column)
}

fn plan_expr(expr: &PlanExpr) -> Expr {
    match expr {
        PlanExpr::Column { field } => column(field),
        PlanExpr::Truncate { func, field } => date_trunc(func.as_str(), column(field)),
        PlanExpr::Aggregate { func, field } => {
            let col = column(field);
            match func {
                MeasureFunc::Count => count(col),
                MeasureFunc::CountDistinct => count_distinct(col),
                MeasureFunc::Sum => sum(col),
                MeasureFunc::Avg => avg(col),
                MeasureFunc::Min => min(col),
                MeasureFunc::Max => max(col),
            }
        }
    }
}

/// `left.a = right.a AND left.b = right.b`
fn join_condition(step: &JoinStep) -> Expr {
    let mut pairs = step
        .on_left_cols
        .iter()
        .zip(&step.on_right_cols)
        .map(|(l, r)| table_col(&step.left_table, l).eq(table_col(&step.right_table, r)));

    let first = pairs.next().unwrap_or_else(|| lit_bool(true));
    pairs.fold(first, |acc, cond| acc.and(cond))
}

fn literal(value: &FilterValue) -> Expr {
    match value {
        FilterValue::Bool(b) => lit_bool(*b),
        FilterValue::Int(n) => lit_int(*n),
        FilterValue::Float(f) => lit_float(*f),
        FilterValue::String(s) => lit_str(s),
    }
}

fn predicate(pred: &Predicate) -> Expr {
    match pred {
        Predicate::And { predicates } => {
            let mut parts = predicates.iter().map(predicate);
            let first = parts.next().unwrap_or_else(|| lit_bool(true));
            parts.fold(first, |acc, p| acc.and(p))
        }
        Predicate::InList {
            field,
            values,
            negated,
        } => {
            let values = values.iter().map(literal).collect();
            if *negated {
                column(field).not_in_list(values)
            } else {
                column(field).in_list(values)
            }
        }
        Predicate::IsNull { field, negated } => {
            if *negated {
                column(field).is_not_null()
            } else {
                column(field).is_null()
            }
        }
        Predicate::Like {
            field,
            pattern,
            escape,
            negated,
        } => {
            if *negated {
                column(field).not_like(pattern.as_str(), *escape)
            } else {
                column(field).like(pattern.as_str(), *escape)
            }
        }
    }
}
