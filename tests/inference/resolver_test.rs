#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::{col, retail};
use joinwise::metadata::{
    Catalog, ColumnSet, CombinationStats, Containment, InMemoryOracle, LogicalType, MetadataStore,
    OracleResult, TableStats, ValueOracle,
};
use joinwise::semantic::inference::{
    resolve_all, thresholds, Cardinality, InferenceConfig, KeyCandidate, Resolver,
};
use joinwise::semantic::RelationshipGraph;

/// Counts containment calls made through it.
struct CountingOracle<'a> {
    inner: &'a InMemoryOracle,
    containment_calls: AtomicUsize,
}

impl<'a> CountingOracle<'a> {
    fn new(inner: &'a InMemoryOracle) -> Self {
        Self {
            inner,
            containment_calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.containment_calls.load(Ordering::SeqCst)
    }
}

impl ValueOracle for CountingOracle<'_> {
    fn containment(&self, from: &ColumnSet, to: &ColumnSet) -> OracleResult<Containment> {
        self.containment_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.containment(from, to)
    }

    fn combination_stats(&self, columns: &ColumnSet) -> OracleResult<CombinationStats> {
        self.inner.combination_stats(columns)
    }
}

#[test]
fn test_orders_reference_customers() {
    let (store, oracle) = retail();
    let links = resolve_all(&store, &oracle, &InferenceConfig::default(), None).unwrap();

    assert_eq!(links.len(), 1, "links: {:?}", links.links);
    let link = &links.links[0];
    assert_eq!(link.from_table, "orders");
    assert_eq!(link.from_columns, vec!["customer_id"]);
    assert_eq!(link.to_table, "customers");
    assert_eq!(link.to_columns, vec!["id"]);
    assert_eq!(link.cardinality, Cardinality::ManyToOne);
    assert_eq!(link.confidence, 1.0);
    assert_eq!(link.intersect_count, 3);
    assert_eq!(link.name(), "orders_customer_id_customers_id");

    assert_eq!(links.keys["customers"].columns, vec!["id"]);
    assert_eq!(links.keys["orders"].columns, vec!["id"]);
}

#[test]
fn test_no_containment_is_empty_not_error() {
    let (store, oracle) = retail();
    let config = InferenceConfig::default();
    let keys = resolve_all(&store, &oracle, &config, None).unwrap().keys;
    let resolver = Resolver::new(&oracle, &config);
    let products = store.table("products").unwrap();
    let customers = store.table("customers").unwrap();
    let links = resolver
        .resolve(products, customers, keys.get("products"), keys.get("customers"))
        .unwrap();
    assert!(links.is_empty());
}

#[test]
fn test_resolution_is_order_independent() {
    let (store, oracle) = retail();
    let config = InferenceConfig::default();
    let all = resolve_all(&store, &oracle, &config, None).unwrap();
    let orders = store.table("orders").unwrap();
    let customers = store.table("customers").unwrap();
    let (ko, kc) = (all.keys.get("orders"), all.keys.get("customers"));

    let resolver = Resolver::new(&oracle, &config);
    let forward = resolver.resolve(orders, customers, ko, kc).unwrap();
    let backward = resolver.resolve(customers, orders, kc, ko).unwrap();
    assert_eq!(forward, backward);

    let mut tables: Vec<TableStats> = store.tables().cloned().collect();
    tables.reverse();
    let reversed = MetadataStore::from_tables(tables);
    let again = resolve_all(&reversed, &oracle, &config, None).unwrap();
    assert_eq!(again.links, all.links);
}

#[test]
fn test_unchanged_metadata_reuses_previous_links() {
    let (store, oracle) = retail();
    let config = InferenceConfig::default();
    let first = resolve_all(&store, &oracle, &config, None).unwrap();

    let counting = CountingOracle::new(&oracle);
    let second = resolve_all(&store, &counting, &config, Some(&first)).unwrap();
    assert_eq!(second, first);
    assert_eq!(counting.calls(), 0);

    let stricter = config.clone().with_min_containment(0.95);
    let third = resolve_all(&store, &counting, &stricter, Some(&first)).unwrap();
    assert_ne!(third.fingerprint, first.fingerprint);
    assert!(counting.calls() > 0);
}

#[test]
fn test_composite_key_link_by_same_named_columns() {
    let (store, oracle) = Catalog::from_json(
        r#"{"tables": [
            {
                "name": "enrollments",
                "columns": [
                    {"name": "student_id", "logical_type": "identifier"},
                    {"name": "course_id", "logical_type": "identifier"},
                    {"name": "grade", "logical_type": "categorical"}
                ],
                "rows": [
                    ["S1", "MATH", "A"],
                    ["S1", "PHYS", "B"],
                    ["S2", "MATH", "A"],
                    ["S2", "PHYS", "A"]
                ]
            },
            {
                "name": "attendance",
                "columns": [
                    {"name": "student_id", "logical_type": "identifier"},
                    {"name": "course_id", "logical_type": "identifier"},
                    {"name": "day", "logical_type": "temporal"}
                ],
                "rows": [
                    ["S1", "MATH", "2024-01-01"],
                    ["S1", "MATH", "2024-01-02"],
                    ["S2", "PHYS", "2024-01-01"]
                ]
            }
        ]}"#,
    )
    .unwrap()
    .into_parts()
    .unwrap();

    let links = resolve_all(&store, &oracle, &InferenceConfig::default(), None).unwrap();
    let link = links
        .iter()
        .find(|l| l.to_table == "enrollments")
        .expect("attendance references enrollments");
    assert_eq!(link.from_table, "attendance");
    assert_eq!(link.from_columns, vec!["course_id", "student_id"]);
    assert_eq!(link.to_columns, vec!["course_id", "student_id"]);
    assert_eq!(link.cardinality, Cardinality::ManyToOne);
    assert_eq!(link.confidence, 1.0);
}

/// Two columns of `shipments` both reference `depots.id`.
fn shipments() -> (MetadataStore, InMemoryOracle) {
    Catalog::from_json(
        r#"{"tables": [
            {
                "name": "depots",
                "columns": [{"name": "id", "logical_type": "identifier"}],
                "rows": [["D1"], ["D2"], ["D3"]]
            },
            {
                "name": "shipments",
                "columns": [
                    {"name": "id", "logical_type": "identifier"},
                    {"name": "origin_id", "logical_type": "identifier"},
                    {"name": "dest_id", "logical_type": "identifier"}
                ],
                "rows": [["X1", "D1", "D2"], ["X2", "D1", "D3"], ["X3", "D2", "D3"]]
            }
        ]}"#,
    )
    .unwrap()
    .into_parts()
    .unwrap()
}

#[test]
fn test_ambiguous_pairs_are_penalised() {
    let (store, oracle) = shipments();
    let config = InferenceConfig::default();
    let links = resolve_all(&store, &oracle, &config, None).unwrap();
    assert_eq!(links.len(), 2);
    for link in links.iter() {
        assert_eq!(link.to_table, "depots");
        assert_eq!(link.containment, 1.0);
        assert!((link.confidence - config.ambiguity_factor(2)).abs() < 1e-12);
    }
}

#[test]
fn test_full_penalty_keeps_every_qualifying_pair() {
    let (store, oracle) = shipments();
    let config = InferenceConfig::default().with_ambiguity_penalty(1.0);
    let links = resolve_all(&store, &oracle, &config, None).unwrap();
    assert_eq!(links.len(), 2);
    for link in links.iter() {
        assert_eq!(link.confidence, thresholds::link::MIN_CONFIDENCE);
        assert!(link.cost().is_finite());
    }

    let graph = RelationshipGraph::from_link_set(&store, &links);
    assert_eq!(graph.link_count(), 2);
    assert_eq!(graph.links_between("shipments", "depots").len(), 2);
}

#[test]
fn test_empty_key_yields_no_links() {
    let (store, oracle) = retail();
    let config = InferenceConfig::default();
    let orders = store.table("orders").unwrap();
    let customers = store.table("customers").unwrap();
    let empty = KeyCandidate {
        table: "customers".into(),
        columns: vec![],
        uniqueness: 1.0,
        completeness: 1.0,
    };
    let links = Resolver::new(&oracle, &config)
        .resolve(orders, customers, None, Some(&empty))
        .unwrap();
    assert!(links.is_empty());
}

#[test]
fn test_temporal_columns_never_reference_identifiers() {
    let a = TableStats::new(
        "a",
        vec![
            col("a", "id", LogicalType::Identifier, 3, 0, 3),
            col("a", "when", LogicalType::Temporal, 3, 0, 3),
        ],
    );
    let b = TableStats::new("b", vec![col("b", "id", LogicalType::Identifier, 3, 0, 3)]);
    let store = MetadataStore::from_tables([a, b]);
    let oracle = InMemoryOracle::new();
    let config = InferenceConfig::default();

    // a.id -> b.id is compatible, so the oracle is consulted and fails.
    assert!(resolve_all(&store, &oracle, &config, None).is_err());

    let only_temporal = MetadataStore::from_tables([
        TableStats::new("a", vec![col("a", "when", LogicalType::Temporal, 3, 0, 3)]),
        TableStats::new("b", vec![col("b", "id", LogicalType::Identifier, 3, 0, 3)]),
    ]);
    let links = resolve_all(&only_temporal, &oracle, &config, None).unwrap();
    assert!(links.is_empty());
}
