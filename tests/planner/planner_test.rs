#[path = "../common/mod.rs"]
mod common;

use common::{retail, sql_shape};
use joinwise::metadata::MetadataStore;
use joinwise::semantic::inference::{resolve_all, InferenceConfig};
use joinwise::semantic::planner::{
    JoinKind, PlanExpr, PlannerConfig, Predicate, ProductSpec, QueryPlan, QueryPlanner,
};
use joinwise::semantic::{PlanningError, RelationshipGraph};
use joinwise::sql::{render, render_with, Canonical};
use serde_json::json;

struct Fixture {
    store: MetadataStore,
    graph: RelationshipGraph,
}

impl Fixture {
    fn new() -> Self {
        let (store, oracle) = retail();
        let links = resolve_all(&store, &oracle, &InferenceConfig::default(), None).unwrap();
        let graph = RelationshipGraph::from_link_set(&store, &links);
        Self { store, graph }
    }

    fn plan_with(&self, config: PlannerConfig, spec: serde_json::Value) -> Result<QueryPlan, PlanningError> {
        let spec: ProductSpec = serde_json::from_value(spec).unwrap();
        QueryPlanner::new(&self.store, &self.graph, config).plan(&spec)
    }

    fn plan(&self, spec: serde_json::Value) -> Result<QueryPlan, PlanningError> {
        self.plan_with(PlannerConfig::default(), spec)
    }
}

#[test]
fn test_filters_render_and_round_trip() {
    let fixture = Fixture::new();
    let plan = fixture
        .plan(json!({
            "name": "eu_orders",
            "fields": [
                {"id": "orders.id"},
                {"id": "customers.name", "name": "customer"}
            ],
            "filter": {
                "selections": [
                    {"id": "customers.region", "values": ["EU", "US"]},
                    {"id": "orders.amount", "values": [10, 20.5], "exclude": true, "null": "is_not_null"}
                ],
                "wildcards": [
                    {"id": "customers.name", "value": "A_", "mode": "starts_with"},
                    {"id": "customers.name", "value": "zz", "mode": "contains", "exclude": true}
                ],
                "sort_by": [{"id": "customers.name"}],
                "limit": 5
            }
        }))
        .unwrap();

    assert!(plan.group_by.is_empty());
    let conjuncts = plan.filter.as_ref().unwrap().conjuncts();
    assert_eq!(conjuncts.len(), 5);
    assert!(matches!(
        conjuncts[3],
        Predicate::Like { pattern, escape: Some('!'), negated: false, .. } if pattern == "A!_%"
    ));

    let sql = render(&plan);
    assert!(sql.contains("\"customers\".\"region\" IN ('EU', 'US')"));
    assert!(sql.contains("\"orders\".\"amount\" NOT IN (10, 20.5)"));
    assert!(sql.contains("\"orders\".\"amount\" IS NOT NULL"));
    assert!(sql.contains("\"customers\".\"name\" LIKE 'A!_%' ESCAPE '!'"));
    assert!(sql.contains("\"customers\".\"name\" NOT LIKE '%zz%'"));

    let shape = sql_shape(&sql);
    assert_eq!(shape.from, "orders");
    assert_eq!(shape.joins.len(), 1);
    assert_eq!(shape.conjuncts, 5);
    assert_eq!(shape.group_by, 0);
    assert_eq!(shape.order_by, 1);
    assert_eq!(shape.limit.as_deref(), Some("5"));
}

#[test]
fn test_group_by_follows_select_order() {
    let fixture = Fixture::new();
    let plan = fixture
        .plan(json!({
            "name": "monthly",
            "fields": [
                {"id": "orders.placed_at", "name": "month", "dimension_func": "month"},
                {"id": "customers.region"},
                {"id": "orders.amount", "name": "avg_amount", "category": "measure", "measure_func": "avg"},
                {"id": "orders.customer_id", "name": "buyers", "category": "measure", "measure_func": "count_distinct"}
            ]
        }))
        .unwrap();

    assert_eq!(plan.group_by.len(), 2);
    assert!(matches!(plan.group_by[0], PlanExpr::Truncate { .. }));
    assert!(matches!(plan.group_by[1], PlanExpr::Column { .. }));

    let sql = render(&plan);
    insta::assert_snapshot!(sql, @r###"
    SELECT
      DATE_TRUNC('month', "orders"."placed_at") AS "month",
      "customers"."region" AS "region",
      AVG("orders"."amount") AS "avg_amount",
      COUNT(DISTINCT "orders"."customer_id") AS "buyers"
    FROM "orders"
    LEFT JOIN "customers" ON "orders"."customer_id" = "customers"."id"
    GROUP BY DATE_TRUNC('month', "orders"."placed_at"), "customers"."region"
    "###);
    assert_eq!(sql_shape(&sql).group_by, 2);
}

#[test]
fn test_root_is_first_measure_table() {
    let fixture = Fixture::new();
    let plan = fixture
        .plan(json!({
            "name": "p",
            "fields": [
                {"id": "customers.name"},
                {"id": "orders.id", "category": "measure", "measure_func": "count"}
            ]
        }))
        .unwrap();
    assert_eq!(plan.root_table, "orders");
    assert_eq!(plan.joins[0].left_table, "orders");
    assert_eq!(plan.joins[0].right_table, "customers");

    let plan = fixture
        .plan(json!({
            "name": "p",
            "fields": [{"id": "customers.name"}, {"id": "orders.id"}]
        }))
        .unwrap();
    assert_eq!(plan.root_table, "customers");
    assert_eq!(plan.joins[0].on_left_cols, vec!["id"]);
    assert_eq!(plan.joins[0].on_right_cols, vec!["customer_id"]);
}

#[test]
fn test_inner_join_config() {
    let fixture = Fixture::new();
    let plan = fixture
        .plan_with(
            PlannerConfig::default().with_join_kind(JoinKind::Inner),
            json!({"name": "p", "fields": [{"id": "orders.id"}, {"id": "customers.name"}]}),
        )
        .unwrap();
    assert_eq!(plan.joins[0].join_kind, JoinKind::Inner);

    let sql = render_with(&plan, &Canonical);
    assert!(sql.contains("INNER JOIN \"customers\""));
    assert_eq!(sql_shape(&sql).joins, vec![("customers".to_string(), false)]);
}

#[test]
fn test_plan_and_sql_come_from_one_plan() {
    let fixture = Fixture::new();
    let spec: ProductSpec = serde_json::from_value(json!({
        "name": "p",
        "fields": [{"id": "customers.name"}]
    }))
    .unwrap();
    let compiled = QueryPlanner::new(&fixture.store, &fixture.graph, PlannerConfig::default())
        .compile(&spec)
        .unwrap();
    assert_eq!(compiled.sql, render(&compiled.plan));
    assert_eq!(compiled.plan.source_fingerprint, fixture.graph.fingerprint());

    let json = serde_json::to_value(&compiled.plan).unwrap();
    assert_eq!(json["root_table"], "customers");
    assert_eq!(json["select"][0]["expr"]["kind"], "column");
    assert_eq!(json["select"][0]["expr"]["field"], "customers.name");
}

#[test]
fn test_request_errors_name_the_offender() {
    let fixture = Fixture::new();

    let err = fixture
        .plan(json!({"name": "p", "fields": [{"id": "orders.nope"}]}))
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown field: orders.nope");

    let err = fixture
        .plan(json!({
            "name": "p",
            "fields": [{"id": "customers.name", "category": "measure", "measure_func": "avg"}]
        }))
        .unwrap_err();
    assert_eq!(
        err,
        PlanningError::IncompatibleAggregation {
            field: "customers.name".into(),
            func: "avg".into()
        }
    );

    let err = fixture
        .plan(json!({
            "name": "p",
            "fields": [{"id": "orders.id"}],
            "filter": {"sort_by": [{"id": "nothing_here"}]}
        }))
        .unwrap_err();
    assert_eq!(err, PlanningError::UnknownAlias("nothing_here".into()));

    let err = fixture
        .plan(json!({
            "name": "p",
            "fields": [{"id": "orders.id"}],
            "filter": {"selections": [{"id": "customers.ghost", "values": [1]}]}
        }))
        .unwrap_err();
    assert!(err.to_string().contains("customers.ghost"));
}

#[test]
fn test_planner_shares_graph_across_threads() {
    let fixture = Fixture::new();
    let spec: ProductSpec = serde_json::from_value(json!({
        "name": "p",
        "fields": [
            {"id": "customers.name"},
            {"id": "orders.id", "category": "measure", "measure_func": "count"}
        ]
    }))
    .unwrap();

    let sqls: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    QueryPlanner::new(&fixture.store, &fixture.graph, PlannerConfig::default())
                        .compile(&spec)
                        .unwrap()
                        .sql
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(sqls.windows(2).all(|w| w[0] == w[1]));
}
