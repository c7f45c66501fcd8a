use std::sync::Arc;

use super::*;
use bytes::Bytes;
use groupcost_common::Value;
use groupcost_core::{Histogram, HistogramBucket, IndexStatistics, RowCounts, StatisticsSnapshot};

struct Fixture {
    schema: Arc<Schema>,
    estimator: CostEstimator,
}

impl Fixture {
    fn table(&self, name: &str) -> TableId {
        self.schema.table_by_name(name).unwrap().id()
    }

    fn index(&self, table: &str, name: &str) -> IndexId {
        self.schema.index_by_name(table, name).unwrap().id()
    }

    fn histogram(&self, table: &str, index: &str) -> ColumnHistogram {
        self.estimator
            .statistics
            .index_statistics(self.index(table, index))
            .unwrap()
            .column_histogram(0, 1)
            .unwrap()
    }
}

fn key(value: Value) -> Bytes {
    KeyEncoder::new().encode_value(&value)
}

fn sku(s: &str) -> Value {
    Value::from(s)
}

fn date(d: i64) -> Value {
    Value::Int64(d)
}

fn fixture() -> Fixture {
    let mut b = Schema::builder();
    b.add_table("customers", &["cid", "name"], None).unwrap();
    b.add_table("orders", &["oid", "cid", "order_date"], Some("customers"))
        .unwrap();
    b.add_table("items", &["iid", "oid", "sku", "quan"], Some("orders"))
        .unwrap();
    b.add_table("addresses", &["aid", "cid", "state"], Some("customers"))
        .unwrap();
    b.add_index("customers", "PRIMARY", &["cid"], true).unwrap();
    b.add_index("orders", "order_date", &["order_date"], false)
        .unwrap();
    let sku_index = b.add_index("items", "sku", &["sku"], false).unwrap();
    b.add_index("addresses", "state", &["state"], false).unwrap();
    b.add_group_index("sku_and_date", &[("items", "sku"), ("orders", "order_date")])
        .unwrap();
    let schema = Arc::new(b.build());
    let order_date_index = schema.index_by_name("orders", "order_date").unwrap().id();

    let sku_stats = IndexStatistics::new(sku_index, 20000, 20000).with_histogram(
        Histogram::new(
            0,
            1,
            vec![
                HistogramBucket::new(key(sku("0254")), 110, 0, 0),
                HistogramBucket::new(key(sku("9999")), 10, 19880, 100),
            ],
        )
        .unwrap(),
    );
    let date_stats = IndexStatistics::new(order_date_index, 1000, 1000).with_histogram(
        Histogram::new(
            0,
            1,
            vec![
                HistogramBucket::new(key(date(1_000_000)), 1, 0, 0),
                HistogramBucket::new(key(date(1_032_275)), 2, 59, 43),
                HistogramBucket::new(key(date(1_100_000)), 5, 933, 300),
            ],
        )
        .unwrap(),
    );
    let snapshot = StatisticsSnapshot::new().with(sku_stats).with(date_stats);

    let id = |name: &str| schema.table_by_name(name).unwrap().id();
    let counts = RowCounts::new()
        .with_count(id("customers"), 100)
        .with_count(id("orders"), 1000)
        .with_count(id("items"), 20000)
        .with_count(id("addresses"), 100);

    let estimator = CostEstimator::new(
        Arc::clone(&schema),
        Arc::new(snapshot),
        Arc::new(counts),
        EstimatorConfig::default(),
    );
    Fixture { schema, estimator }
}

#[test]
fn test_group_index_equalities_use_table_index_histograms() {
    let f = fixture();
    let shape = IndexScanShape::new()
        .eq(Comparand::literal("0254"))
        .eq(Comparand::Literal(date(1_032_274)));
    let rows = f
        .estimator
        .size_index_scan(f.schema.group_index_by_name("sku_and_date").unwrap().id(), &shape)
        .unwrap();
    // 0.0055 * 0.00137 of 20000 sampled rows rounds to zero, floored at one
    assert!((rows - 1.0).abs() < 0.001);
}

#[test]
fn test_ordering_only_scan_returns_table() {
    let f = fixture();
    let rows = f
        .estimator
        .size_index_scan(f.index("items", "sku"), &IndexScanShape::new())
        .unwrap();
    assert!((rows - 20000.0).abs() < 0.001);
}

#[test]
fn test_unique_lookup_returns_one_row() {
    let f = fixture();
    let shape = IndexScanShape::new().eq(Comparand::literal(7));
    let rows = f
        .estimator
        .size_index_scan(f.index("customers", "PRIMARY"), &shape)
        .unwrap();
    assert!((rows - 1.0).abs() < 0.001);
}

#[test]
fn test_equality_on_boundary() {
    let f = fixture();
    let shape = IndexScanShape::new().eq(Comparand::literal("0254"));
    let rows = f
        .estimator
        .size_index_scan(f.index("items", "sku"), &shape)
        .unwrap();
    assert!((rows - 110.0).abs() < 0.001);
}

#[test]
fn test_range_scan() {
    let f = fixture();
    let shape = IndexScanShape::new().low(Comparand::Literal(date(1_032_275)), true);
    let rows = f
        .estimator
        .size_index_scan(f.index("orders", "order_date"), &shape)
        .unwrap();
    assert!((rows - 940.0).abs() < 0.001);
}

/// An estimator over the fixture's statistics with different live counts.
fn with_counts(f: &Fixture, counts: RowCounts, config: EstimatorConfig) -> CostEstimator {
    CostEstimator::new(
        Arc::clone(&f.schema),
        Arc::clone(&f.estimator.statistics),
        Arc::new(counts),
        config,
    )
}

#[test]
fn test_empty_range_is_not_rescaled() {
    let f = fixture();
    let counts = RowCounts::new().with_count(f.table("orders"), 1_000_000);
    let index = f.index("orders", "order_date");
    let inverted = IndexScanShape::new()
        .low(Comparand::Literal(date(1_090_000)), true)
        .high(Comparand::Literal(date(1_010_000)), true);
    let half_open = IndexScanShape::new()
        .low(Comparand::Literal(date(1_032_275)), true)
        .high(Comparand::Literal(date(1_032_275)), false);

    let e = with_counts(&f, counts.clone(), EstimatorConfig::default());
    assert!((e.size_index_scan(index, &inverted).unwrap() - 1.0).abs() < 0.001);
    assert!((e.size_index_scan(index, &half_open).unwrap() - 1.0).abs() < 0.001);
    // a satisfiable range is still scaled from 1000 sampled rows
    let open = IndexScanShape::new().low(Comparand::Literal(date(1_032_275)), true);
    assert!((e.size_index_scan(index, &open).unwrap() - 940_000.0).abs() < 0.001);

    let e = with_counts(&f, counts, EstimatorConfig::default().with_min_row_count(3.0));
    assert!((e.size_index_scan(index, &inverted).unwrap() - 3.0).abs() < 0.001);
}

#[test]
fn test_is_null_equality_uses_null_bucket() {
    let f = fixture();
    let state = f.index("addresses", "state");
    let stats = IndexStatistics::new(state, 100, 100).with_histogram(
        Histogram::new(
            0,
            1,
            vec![
                HistogramBucket::new(key(Value::Null), 30, 0, 0),
                HistogramBucket::new(key(sku("MA")), 10, 50, 5),
                HistogramBucket::new(key(sku("WY")), 10, 0, 0),
            ],
        )
        .unwrap(),
    );
    let h = Arc::new(stats.clone()).column_histogram(0, 1).unwrap();
    let e = CostEstimator::new(
        Arc::clone(&f.schema),
        Arc::new(StatisticsSnapshot::new().with(stats)),
        Arc::new(RowCounts::new().with_count(f.table("addresses"), 100)),
        EstimatorConfig::default(),
    );

    let is_null = Comparand::Literal(Value::Null);
    assert!((e.fraction_equal(Some(&h), &is_null) - 0.3).abs() < 1e-9);
    let rows = |c: Comparand| e.size_index_scan(state, &IndexScanShape::new().eq(c)).unwrap();
    assert!((rows(is_null) - 30.0).abs() < 0.001);
    assert!((rows(Comparand::literal("MA")) - 10.0).abs() < 0.001);
    // strings sort after null, so AK falls inside the MA bucket
    assert!((rows(Comparand::literal("AK")) - 10.0).abs() < 0.001);
}

#[test]
fn test_missing_statistics() {
    let f = fixture();
    let shape = IndexScanShape::new().eq(Comparand::literal("MA"));
    let rows = f
        .estimator
        .size_index_scan(f.index("addresses", "state"), &shape)
        .unwrap();
    assert!((rows - 85.0).abs() < 0.001);
}

#[test]
fn test_too_many_comparands() {
    let f = fixture();
    let shape = IndexScanShape::new()
        .eq(Comparand::literal("0254"))
        .low(Comparand::literal("1"), true);
    assert!(matches!(
        f.estimator.size_index_scan(f.index("items", "sku"), &shape),
        Err(Error::TooManyComparands {
            columns: 1,
            constrained: 2,
            ..
        })
    ));
}

#[test]
fn test_cost_index_scan_uses_model() {
    let f = fixture();
    let index = f.index("items", "sku");
    let shape = IndexScanShape::new().eq(Comparand::literal("0254"));
    let estimate = f.estimator.cost_index_scan(index, &shape).unwrap();
    let expected = f
        .estimator
        .cost_model()
        .index_scan(f.schema.index(index).unwrap(), 110.0);
    assert!((estimate.row_count() - 110.0).abs() < 0.001);
    assert!((estimate.cost() - expected).abs() < 1e-9);
}

#[test]
fn test_fraction_equal() {
    let f = fixture();
    let h = f.histogram("items", "sku");
    let e = &f.estimator;
    assert!((e.fraction_equal(Some(&h), &Comparand::literal("0254")) - 0.0055).abs() < 1e-9);
    assert!((e.fraction_equal(Some(&h), &Comparand::Parameter(None)) - 1.0 / 20000.0).abs() < 1e-12);
    assert!(
        (e.fraction_equal(Some(&h), &Comparand::Values(vec![sku("0254"), sku("9999")])) - 0.003)
            .abs()
            < 1e-9
    );
    assert!((e.fraction_equal(None, &Comparand::literal("0254")) - 0.85).abs() < 1e-9);
    assert!((e.fraction_equal(None, &Comparand::Parameter(None)) - 0.85).abs() < 1e-9);
    let expression = Comparand::Expression("current_date".into());
    assert!((e.fraction_equal(Some(&h), &expression) - 1.0 / 20000.0).abs() < 1e-12);
    assert!(e.fraction_equal(Some(&h), &Comparand::Values(Vec::new())).abs() < 1e-12);
}

#[test]
fn test_fraction_between() {
    let f = fixture();
    let h = f.histogram("orders", "order_date");
    let e = &f.estimator;
    assert!((e.fraction_between(Some(&h), None, None) - 1.0).abs() < 1e-9);
    let variable = RangeBound::inclusive(Comparand::Parameter(None));
    assert!((e.fraction_between(Some(&h), Some(&variable), None) - 1.0).abs() < 1e-9);
    let low = RangeBound::inclusive(Comparand::Literal(date(1_032_275)));
    assert!((e.fraction_between(Some(&h), Some(&low), None) - 0.94).abs() < 1e-9);
    assert!((e.fraction_between(None, Some(&low), None) - 0.85).abs() < 1e-9);
    // an empty range still counts one sampled row
    let high = RangeBound::exclusive(Comparand::Literal(date(1)));
    assert!((e.fraction_between(Some(&h), Some(&low), Some(&high)) - 0.001).abs() < 1e-9);
}

#[test]
fn test_conditions_selectivity() {
    let f = fixture();
    let e = &f.estimator;
    let orders = f.table("orders");

    let range = ColumnConditions::new()
        .with("order_date", ColumnCondition::Gt(Comparand::Literal(date(1_000_000))))
        .with("order_date", ColumnCondition::Ge(Comparand::Literal(date(1_032_275))));
    assert!((e.conditions_selectivity(orders, &range).unwrap() - 0.94).abs() < 1e-9);

    let items = f.table("items");
    let ne = ColumnConditions::new().with("sku", ColumnCondition::Ne(Comparand::literal("0254")));
    assert!((e.conditions_selectivity(items, &ne).unwrap() - 0.9945).abs() < 1e-9);

    let list = ColumnConditions::new().with(
        "sku",
        ColumnCondition::In(vec![Comparand::literal("0254"), Comparand::literal("9999")]),
    );
    assert!((e.conditions_selectivity(items, &list).unwrap() - 0.006).abs() < 1e-9);

    let eq_wins = list.with("sku", ColumnCondition::Eq(Comparand::literal("0254")));
    assert!((e.conditions_selectivity(items, &eq_wins).unwrap() - 0.0055).abs() < 1e-9);
}

#[test]
fn test_conditions_without_histogram() {
    let f = fixture();
    let customers = f.table("customers");
    let conditions = ColumnConditions::new()
        .with("name", ColumnCondition::Eq(Comparand::literal("Smith")))
        .with("name", ColumnCondition::Ne(Comparand::literal("Jones")));
    let selectivity = f
        .estimator
        .conditions_selectivity(customers, &conditions)
        .unwrap();
    assert!((selectivity - 0.85).abs() < 1e-9);
    assert!((f
        .estimator
        .conditions_selectivity(customers, &ColumnConditions::new())
        .unwrap()
        - 1.0)
        .abs()
        < 1e-9);
}

#[test]
fn test_conditions_unknown_column() {
    let f = fixture();
    let conditions =
        ColumnConditions::new().with("color", ColumnCondition::Eq(Comparand::literal("red")));
    assert!(matches!(
        f.estimator.conditions_selectivity(f.table("items"), &conditions),
        Err(Error::UnknownColumn { .. })
    ));
}

#[test]
fn test_select_and_sort() {
    let f = fixture();
    let e = &f.estimator;
    let input = CostEstimate::new(100.0, 1.0);

    let selected = e.cost_select(input, 0.5);
    assert!((selected.row_count() - 50.0).abs() < 0.001);
    assert!((selected.cost() - (1.0 + e.cost_model().select(100.0))).abs() < 1e-9);

    let sorted = e.cost_sort(input, true);
    assert!((sorted.row_count() - 100.0).abs() < 0.001);
    assert!(sorted.cost() > e.cost_sort(input, false).cost());

    let limited = e.cost_sort_with_limit(input, 10, 2);
    assert!((limited.row_count() - 10.0).abs() < 0.001);
    assert!((limited.cost() - (1.0 + e.cost_model().sort_with_limit(100.0, 2))).abs() < 1e-9);
}

#[test]
fn test_group_scan() {
    let f = fixture();
    let group = f.schema.table_by_name("customers").unwrap().group();
    let estimate = f.estimator.cost_group_scan(group).unwrap();
    assert!((estimate.row_count() - 21200.0).abs() < 0.001);
    assert!(estimate.cost() > 0.0);
}

#[test]
fn test_descendant_cardinality() {
    let f = fixture();
    let e = &f.estimator;
    assert!((e.descendant_cardinality(f.table("items"), f.table("orders")) - 20.0).abs() < 0.001);
    assert!(
        (e.descendant_cardinality(f.table("addresses"), f.table("customers")) - 1.0).abs() < 0.001
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn comparand(value: Option<i64>) -> Comparand {
        match value {
            Some(v) => Comparand::Literal(date(v)),
            None => Comparand::Parameter(None),
        }
    }

    proptest! {
        #[test]
        fn prop_scan_rows_at_least_one(
            low in proptest::option::of(900_000i64..1_200_000),
            high in proptest::option::of(900_000i64..1_200_000),
            low_inclusive in any::<bool>(),
            high_inclusive in any::<bool>(),
        ) {
            let f = fixture();
            let shape = IndexScanShape::new()
                .low(comparand(low), low_inclusive)
                .high(comparand(high), high_inclusive);
            let estimate = f
                .estimator
                .cost_index_scan(f.index("orders", "order_date"), &shape)
                .unwrap();
            prop_assert!(estimate.row_count() >= 1.0);
            prop_assert!(estimate.row_count() <= 1000.0);
            prop_assert!(estimate.cost().is_finite());
        }

        #[test]
        fn prop_equality_rows_at_least_one(value in any::<i64>(), sku_text in "[0-9]{4}") {
            let f = fixture();
            let shape = IndexScanShape::new()
                .eq(Comparand::literal(sku_text.as_str()))
                .eq(Comparand::Literal(date(value)));
            let rows = f
                .estimator
                .size_index_scan(f.schema.group_index_by_name("sku_and_date").unwrap().id(), &shape)
                .unwrap();
            prop_assert!(rows >= 1.0 && rows.is_finite());
        }

        #[test]
        fn prop_equalities_multiply(
            sku_text in prop_oneof![Just("0254"), Just("5000"), Just("9999")],
            value in 900_000i64..1_200_000,
        ) {
            let f = fixture();
            let index = f.schema.group_index_by_name("sku_and_date").unwrap().id();
            let sku_only = IndexScanShape::new().eq(Comparand::literal(sku_text));
            let both = IndexScanShape::new()
                .eq(Comparand::literal(sku_text))
                .eq(Comparand::Literal(date(value)));
            let first = f.estimator.size_index_scan(index, &sku_only).unwrap();
            let rows = f.estimator.size_index_scan(index, &both).unwrap();
            let dates = f.histogram("orders", "order_date");
            let second = f
                .estimator
                .fraction_equal(Some(&dates), &Comparand::Literal(date(value)));
            prop_assert!((rows - (first * second).max(1.0)).abs() <= 1.0);
        }
    }
}
