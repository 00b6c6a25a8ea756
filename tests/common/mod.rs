//! Shared fixtures for integration tests.
#![allow(dead_code)]

use joinwise::metadata::{Catalog, ColumnStats, InMemoryOracle, LogicalType, MetadataStore};
use joinwise::semantic::inference::{Cardinality, PredictedLink};
use sqlparser::ast::{BinaryOperator, Expr, GroupByExpr, SetExpr, Statement, TableFactor};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Retail catalog: every order's customer exists, products stand alone.
pub const RETAIL_CATALOG: &str = r#"{
    "tables": [
        {
            "name": "customers",
            "columns": [
                {"name": "id", "logical_type": "identifier"},
                {"name": "name", "logical_type": "categorical"},
                {"name": "region", "logical_type": "categorical"}
            ],
            "rows": [
                ["C1", "Ann", "EU"],
                ["C2", "Bob", "EU"],
                ["C3", "Cy", "US"],
                ["C4", "Di", null]
            ]
        },
        {
            "name": "orders",
            "columns": [
                {"name": "id", "logical_type": "identifier"},
                {"name": "customer_id", "logical_type": "identifier"},
                {"name": "amount", "logical_type": "numeric"},
                {"name": "placed_at", "logical_type": "temporal"}
            ],
            "rows": [
                ["O1", "C1", 10, "2024-01-05"],
                ["O2", "C1", 20, "2024-01-09"],
                ["O3", "C2", 30, "2024-02-11"],
                ["O4", "C3", 40, "2024-02-14"],
                ["O5", "C3", 50, "2024-03-02"],
                ["O6", "C3", 60, "2024-03-20"]
            ]
        },
        {
            "name": "products",
            "columns": [
                {"name": "sku", "logical_type": "identifier"},
                {"name": "label", "logical_type": "categorical"}
            ],
            "rows": [["P1", "x"], ["P2", "x"], ["P3", "y"]]
        }
    ]
}"#;

pub fn retail() -> (MetadataStore, InMemoryOracle) {
    Catalog::from_json(RETAIL_CATALOG)
        .expect("fixture parses")
        .into_parts()
        .expect("fixture is rectangular")
}

pub fn col(
    table: &str,
    column: &str,
    ty: LogicalType,
    rows: u64,
    nulls: u64,
    distinct: u64,
) -> ColumnStats {
    ColumnStats::new(table, column, ty).with_counts(rows, nulls, distinct)
}

/// A many-to-one link `from.from_col -> to.id`.
pub fn link(from: &str, from_col: &str, to: &str, confidence: f64) -> PredictedLink {
    PredictedLink {
        from_table: from.into(),
        from_columns: vec![from_col.into()],
        to_table: to.into(),
        to_columns: vec!["id".into()],
        confidence,
        cardinality: Cardinality::ManyToOne,
        containment: confidence,
        intersect_count: 1,
    }
}

/// The parts of a SELECT that a plan determines.
#[derive(Debug, PartialEq)]
pub struct SqlShape {
    pub from: String,
    /// (table, is LEFT JOIN) in join order
    pub joins: Vec<(String, bool)>,
    pub conjuncts: usize,
    pub group_by: usize,
    pub order_by: usize,
    pub limit: Option<String>,
}

/// Parse rendered SQL back and pull out its shape.
pub fn sql_shape(sql: &str) -> SqlShape {
    let statements = Parser::parse_sql(&GenericDialect {}, sql)
        .unwrap_or_else(|e| panic!("rendered SQL does not parse: {e}\n{sql}"));
    assert_eq!(statements.len(), 1, "expected one statement:\n{sql}");

    let Statement::Query(query) = &statements[0] else {
        panic!("not a query:\n{sql}");
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        panic!("not a plain SELECT:\n{sql}");
    };
    assert_eq!(select.from.len(), 1, "expected a single FROM item:\n{sql}");
    let from = &select.from[0];

    SqlShape {
        from: table_name(&from.relation),
        joins: from
            .joins
            .iter()
            .map(|j| {
                let left = format!("{:?}", j.join_operator).starts_with("Left");
                (table_name(&j.relation), left)
            })
            .collect(),
        conjuncts: select.selection.as_ref().map_or(0, count_conjuncts),
        group_by: match &select.group_by {
            GroupByExpr::Expressions(exprs, _) => exprs.len(),
            other => panic!("unexpected GROUP BY {other:?}"),
        },
        order_by: query.order_by.as_ref().map_or(0, |o| o.exprs.len()),
        limit: query.limit.as_ref().map(|e| e.to_string()),
    }
}

fn table_name(factor: &TableFactor) -> String {
    match factor {
        TableFactor::Table { name, .. } => name.to_string().replace('"', ""),
        other => panic!("unexpected table factor {other}"),
    }
}

fn count_conjuncts(expr: &Expr) -> usize {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => count_conjuncts(left) + count_conjuncts(right),
        Expr::Nested(inner) => count_conjuncts(inner),
        _ => 1,
    }
}
