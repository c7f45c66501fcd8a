//! Index scan sizing against statistics loaded from a document.

mod common;

use std::sync::Arc;

use common::{fixture, fixture_with};
use groupcost_common::{Error, Value};
use groupcost_core::{RowCounts, StatisticsLoader};
use groupcost_engine::{Comparand, CostEstimator, EstimatorConfig, IndexScanShape};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn sku_and_date() -> IndexScanShape {
    IndexScanShape::new()
        .eq(Comparand::literal("0254"))
        .eq(Comparand::Literal(Value::Int64(1_032_274)))
}

#[test]
fn group_index_borrows_table_index_histograms() {
    let f = fixture();
    let index = f.schema.group_index_by_name("sku_and_date").unwrap().id();
    let rows = f.estimator.size_index_scan(index, &sku_and_date()).unwrap();
    assert!(close(rows, 1.0));
}

#[test]
fn minimum_row_count_is_configurable() {
    let f = fixture_with(EstimatorConfig::default().with_min_row_count(5.0));
    let index = f.schema.group_index_by_name("sku_and_date").unwrap().id();
    let rows = f.estimator.size_index_scan(index, &sku_and_date()).unwrap();
    assert!(close(rows, 5.0));
}

#[test]
fn leading_column_of_multi_column_index() {
    let f = fixture();
    let shape = IndexScanShape::new().eq(Comparand::literal("0254"));
    let rows = f
        .estimator
        .size_index_scan(f.index("items", "sku_quan"), &shape)
        .unwrap();
    assert!(close(rows, 110.0));
}

#[test]
fn second_column_scales_first_column_rows() {
    let f = fixture();
    let index = f.index("items", "sku_quan");
    let sku_only = IndexScanShape::new().eq(Comparand::literal("5000"));
    let both = IndexScanShape::new()
        .eq(Comparand::literal("5000"))
        .eq(Comparand::literal(5));
    let first = f.estimator.size_index_scan(index, &sku_only).unwrap();
    let rows = f.estimator.size_index_scan(index, &both).unwrap();
    // quan has no histogram and contributes the missing statistics selectivity
    let selectivity = f.estimator.config().missing_stats_selectivity;
    assert!(close(first, 199.0));
    assert!((rows - first * selectivity).abs() <= 1.0);
}

#[test]
fn missing_statistics_selectivity() {
    let f = fixture_with(EstimatorConfig::default().with_missing_stats_selectivity(0.5));
    let shape = IndexScanShape::new().eq(Comparand::literal("MA"));
    let rows = f
        .estimator
        .size_index_scan(f.index("addresses", "state"), &shape)
        .unwrap();
    assert!(close(rows, 50.0));
}

#[test]
fn mostly_distinct_column_is_not_rescaled() {
    let f = fixture();
    let shape = IndexScanShape::new().eq(Comparand::literal("Baker"));
    let rows = f
        .estimator
        .size_index_scan(f.index("customers", "name"), &shape)
        .unwrap();
    assert!(close(rows, 1.0));
}

#[test]
fn bounded_range() {
    let f = fixture();
    let shape = IndexScanShape::new()
        .low(Comparand::Literal(Value::Int64(1_000_000)), false)
        .high(Comparand::Literal(Value::Int64(1_032_275)), true);
    let rows = f
        .estimator
        .size_index_scan(f.index("orders", "order_date"), &shape)
        .unwrap();
    assert!(close(rows, 61.0));
}

#[test]
fn unbound_parameter_in_range_is_unbounded() {
    let f = fixture();
    let shape = IndexScanShape::new()
        .low(Comparand::Parameter(None), true)
        .high(Comparand::Parameter(None), true);
    let rows = f
        .estimator
        .size_index_scan(f.index("orders", "order_date"), &shape)
        .unwrap();
    assert!(close(rows, 1000.0));
}

#[test]
fn rows_scale_with_live_table_size() {
    let f = fixture();
    let counts = RowCounts::new().with_count(f.table("items"), 50000);
    let snapshot = StatisticsLoader::new(&f.schema)
        .load_str(common::STATISTICS)
        .unwrap();
    let estimator = CostEstimator::new(
        Arc::clone(&f.schema),
        Arc::new(snapshot),
        Arc::new(counts),
        EstimatorConfig::default(),
    );
    let shape = IndexScanShape::new().eq(Comparand::literal("0254"));
    let rows = estimator
        .size_index_scan(f.index("items", "sku"), &shape)
        .unwrap();
    assert!(close(rows, 275.0));
}

#[test]
fn too_many_comparands() {
    let f = fixture();
    let shape = IndexScanShape::new()
        .eq(Comparand::literal("0254"))
        .eq(Comparand::literal(5))
        .low(Comparand::literal(1), true);
    assert!(matches!(
        f.estimator
            .size_index_scan(f.index("items", "sku_quan"), &shape),
        Err(Error::TooManyComparands { .. })
    ));
}

#[test]
fn scan_cost_grows_with_rows() {
    let f = fixture();
    let index = f.index("items", "sku");
    let narrow = f
        .estimator
        .cost_index_scan(index, &IndexScanShape::new().eq(Comparand::literal("0254")))
        .unwrap();
    let full = f
        .estimator
        .cost_index_scan(index, &IndexScanShape::new())
        .unwrap();
    assert!(narrow.cost() < full.cost());
    assert!(close(full.row_count(), 20000.0));
}
