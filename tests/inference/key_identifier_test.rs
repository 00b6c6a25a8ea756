#[path = "../common/mod.rs"]
mod common;

use common::{col, retail};
use joinwise::metadata::{Catalog, InMemoryOracle, LogicalType, TableStats};
use joinwise::semantic::inference::{InferenceConfig, KeyIdentifier};

fn enrollments() -> (TableStats, InMemoryOracle) {
    let (store, oracle) = Catalog::from_json(
        r#"{"tables": [{
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
        }]}"#,
    )
    .unwrap()
    .into_parts()
    .unwrap();
    (store.table("enrollments").unwrap().clone(), oracle)
}

#[test]
fn test_unique_complete_column_is_key() {
    let (store, oracle) = retail();
    let config = InferenceConfig::default();
    let identifier = KeyIdentifier::new(&oracle, &config);

    for (table, column) in [("customers", "id"), ("orders", "id"), ("products", "sku")] {
        let key = identifier
            .identify(store.table(table).unwrap())
            .unwrap()
            .unwrap_or_else(|| panic!("{table} has a key"));
        assert_eq!(key.columns, vec![column], "key of {table}");
        assert_eq!(key.uniqueness, 1.0);
        assert_eq!(key.completeness, 1.0);
    }
}

#[test]
fn test_identifier_wins_tie_with_other_unique_columns() {
    let table = TableStats::new(
        "t",
        vec![
            col("t", "amount", LogicalType::Numeric, 100, 0, 100),
            col("t", "code", LogicalType::Identifier, 100, 0, 100),
            col("t", "alpha", LogicalType::Categorical, 100, 0, 100),
        ],
    );
    let oracle = InMemoryOracle::new();
    let config = InferenceConfig::default();
    let key = KeyIdentifier::new(&oracle, &config).identify(&table).unwrap().unwrap();
    assert_eq!(key.columns, vec!["code"]);
}

#[test]
fn test_composite_key_found_exactly() {
    let (table, oracle) = enrollments();
    let config = InferenceConfig::default();
    let key = KeyIdentifier::new(&oracle, &config)
        .identify(&table)
        .unwrap()
        .unwrap();
    assert_eq!(key.columns, vec!["course_id", "student_id"]);
    assert!(key.is_composite());
}

#[test]
fn test_composite_search_disabled_by_arity() {
    let (table, oracle) = enrollments();
    let config = InferenceConfig::default().with_max_composite_arity(1);
    let key = KeyIdentifier::new(&oracle, &config).identify(&table).unwrap();
    assert_eq!(key, None);
}

#[test]
fn test_unknown_stats_never_yield_key() {
    let mut stats = col("t", "id", LogicalType::Identifier, 10, 0, 10);
    stats.null_count = None;
    let table = TableStats::new("t", vec![stats]);
    let oracle = InMemoryOracle::new();
    let config = InferenceConfig::default();
    assert_eq!(
        KeyIdentifier::new(&oracle, &config).identify(&table).unwrap(),
        None
    );
}

#[test]
fn test_incomplete_column_rejected() {
    let table = TableStats::new("t", vec![col("t", "id", LogicalType::Identifier, 100, 20, 80)]);
    let oracle = InMemoryOracle::new();
    let config = InferenceConfig::default();
    assert!(KeyIdentifier::new(&oracle, &config)
        .identify_single(&table)
        .is_none());
}

#[test]
fn test_oracle_errors_propagate() {
    let (table, _) = enrollments();
    let empty = InMemoryOracle::new();
    let config = InferenceConfig::default();
    let err = KeyIdentifier::new(&empty, &config).identify(&table).unwrap_err();
    assert!(err.to_string().contains("enrollments"));
}
