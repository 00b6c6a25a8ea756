//! End-to-end scenarios: catalog → links → graph → plan → SQL.

#[path = "../common/mod.rs"]
mod common;

use common::{link, retail, sql_shape};
use joinwise::metadata::MetadataStore;
use joinwise::semantic::inference::{resolve_all, Cardinality, InferenceConfig};
use joinwise::semantic::planner::{
    CompiledQuery, PlanExpr, PlannerConfig, ProductSpec, QueryPlanner,
};
use joinwise::semantic::{PlanningError, RelationshipGraph};
use serde_json::json;

fn compile(spec: serde_json::Value) -> Result<CompiledQuery, PlanningError> {
    let (store, oracle) = retail();
    let links = resolve_all(&store, &oracle, &InferenceConfig::default(), None).unwrap();
    let graph = RelationshipGraph::from_link_set(&store, &links);
    let spec: ProductSpec = serde_json::from_value(spec).unwrap();
    QueryPlanner::new(&store, &graph, PlannerConfig::default()).compile(&spec)
}

#[test]
fn scenario_contained_foreign_key_becomes_many_to_one_link() {
    let (store, oracle) = retail();
    let links = resolve_all(&store, &oracle, &InferenceConfig::default(), None).unwrap();

    let link = links
        .iter()
        .find(|l| l.from_table == "orders" && l.to_table == "customers")
        .expect("orders -> customers");
    assert_eq!(link.from_columns, vec!["customer_id"]);
    assert_eq!(link.to_columns, vec!["id"]);
    assert_eq!(link.cardinality, Cardinality::ManyToOne);
    assert_eq!(link.confidence, 1.0);
}

#[test]
fn scenario_dimension_and_count_group_and_left_join() {
    let compiled = compile(json!({
        "name": "orders_by_customer",
        "fields": [
            {"id": "customers.name", "name": "customer_name"},
            {"id": "orders.id", "name": "order_count", "category": "measure", "measure_func": "count"}
        ]
    }))
    .unwrap();

    insta::assert_snapshot!(compiled.sql, @r###"
    SELECT
      "customers"."name" AS "customer_name",
      COUNT("orders"."id") AS "order_count"
    FROM "orders"
    LEFT JOIN "customers" ON "orders"."customer_id" = "customers"."id"
    GROUP BY "customers"."name"
    "###);

    let shape = sql_shape(&compiled.sql);
    assert_eq!(shape.from, "orders");
    assert_eq!(shape.joins, vec![("customers".to_string(), true)]);
    assert_eq!(shape.group_by, 1);
    assert!(compiled.sql.contains("COUNT("));
}

#[test]
fn scenario_sort_by_measure_alias_orders_by_aggregate() {
    let compiled = compile(json!({
        "name": "top_customers",
        "fields": [
            {"id": "customers.name"},
            {"id": "orders.amount", "name": "total", "category": "measure", "measure_func": "sum"}
        ],
        "filter": {
            "sort_by": [{"id": "total", "direction": "desc"}],
            "limit": 2
        }
    }))
    .unwrap();

    assert!(matches!(
        compiled.plan.order_by[0].expr,
        PlanExpr::Aggregate { .. }
    ));
    assert!(compiled
        .sql
        .contains("ORDER BY SUM(\"orders\".\"amount\") DESC\nLIMIT 2"));

    let shape = sql_shape(&compiled.sql);
    assert_eq!(shape.order_by, 1);
    assert_eq!(shape.limit.as_deref(), Some("2"));
}

#[test]
fn scenario_unreachable_table_is_disconnected() {
    let store = MetadataStore::from_columns([
        common::col("a", "id", joinwise::metadata::LogicalType::Identifier, 3, 0, 3),
        common::col("a", "b_id", joinwise::metadata::LogicalType::Identifier, 3, 0, 2),
        common::col("b", "id", joinwise::metadata::LogicalType::Identifier, 2, 0, 2),
        common::col("c", "id", joinwise::metadata::LogicalType::Identifier, 2, 0, 2),
    ]);
    let graph = RelationshipGraph::build(store.table_names(), vec![link("a", "b_id", "b", 1.0)]);
    let spec: ProductSpec = serde_json::from_value(json!({
        "name": "broken",
        "fields": [{"id": "a.id"}, {"id": "c.id", "name": "c_id"}]
    }))
    .unwrap();

    let err = QueryPlanner::new(&store, &graph, PlannerConfig::default())
        .plan(&spec)
        .unwrap_err();
    assert_eq!(err, PlanningError::DisconnectedGraph("c".into()));
    assert_eq!(err.to_string(), "No join path reaches table 'c'");
}

#[test]
fn scenario_isolated_measure_table_is_the_one_named() {
    let store = MetadataStore::from_columns([
        common::col("a", "id", joinwise::metadata::LogicalType::Identifier, 3, 0, 3),
        common::col("a", "b_id", joinwise::metadata::LogicalType::Identifier, 3, 0, 2),
        common::col("b", "id", joinwise::metadata::LogicalType::Identifier, 2, 0, 2),
        common::col("z", "id", joinwise::metadata::LogicalType::Identifier, 2, 0, 2),
    ]);
    let graph = RelationshipGraph::build(store.table_names(), vec![link("a", "b_id", "b", 1.0)]);
    let spec: ProductSpec = serde_json::from_value(json!({
        "name": "broken",
        "fields": [
            {"id": "a.id"},
            {"id": "b.id", "name": "b_id"},
            {"id": "z.id", "name": "z_count", "category": "measure", "measure_func": "count"}
        ]
    }))
    .unwrap();

    let err = QueryPlanner::new(&store, &graph, PlannerConfig::default())
        .plan(&spec)
        .unwrap_err();
    assert_eq!(err, PlanningError::DisconnectedGraph("z".into()));
    assert_eq!(
        graph.shortest_connecting_subgraph(&["a", "b", "z"]).unwrap_err(),
        err
    );
}

#[test]
fn scenario_products_are_not_joinable_to_orders() {
    let err = compile(json!({
        "name": "p",
        "fields": [{"id": "orders.id"}, {"id": "products.sku"}]
    }))
    .unwrap_err();
    assert_eq!(err, PlanningError::DisconnectedGraph("products".into()));
}
