//! Shared fixture: a customers/orders/items group with addresses and
//! shipments, plus a separate parts group.

#![allow(dead_code)]

use std::sync::Arc;

use groupcost_common::{GroupId, IndexId, TableId};
use groupcost_core::{RowCounts, Schema, SchemaDefinition, StatisticsLoader};
use groupcost_engine::{CostEstimator, EstimatorConfig};

pub const SCHEMA: &str = r#"{
    "tables": [
        { "name": "customers", "columns": ["cid", "name"] },
        { "name": "orders", "columns": ["oid", "cid", "order_date"], "parent": "customers" },
        { "name": "items", "columns": ["iid", "oid", "sku", "quan"], "parent": "orders" },
        { "name": "shipments", "columns": ["sid", "oid", "carrier"], "parent": "orders" },
        { "name": "addresses", "columns": ["aid", "cid", "state"], "parent": "customers" },
        { "name": "parts", "columns": ["pid", "sku"] }
    ],
    "indexes": [
        { "table": "customers", "name": "PRIMARY", "columns": ["cid"], "unique": true },
        { "table": "customers", "name": "name", "columns": ["name"] },
        { "table": "orders", "name": "order_date", "columns": ["order_date"] },
        { "table": "items", "name": "sku", "columns": ["sku"] },
        { "table": "items", "name": "sku_quan", "columns": ["sku", "quan"] },
        { "table": "addresses", "name": "state", "columns": ["state"] }
    ],
    "group_indexes": [
        { "name": "sku_and_date", "columns": ["items.sku", "orders.order_date"] }
    ]
}"#;

pub const STATISTICS: &str = r#"[
    {
        "table": "items", "index": "sku", "row_count": 20000,
        "statistics": [
            { "columns": 1, "histogram": [
                { "key": ["0254"], "eq": 110, "lt": 0, "distinct": 0 },
                { "key": ["9999"], "eq": 10, "lt": 19880, "distinct": 100 }
            ] }
        ]
    },
    {
        "table": "orders", "index": "order_date", "row_count": 1000,
        "statistics": [
            { "columns": 1, "histogram": [
                { "key": [1000000], "eq": 1, "lt": 0, "distinct": 0 },
                { "key": [1032275], "eq": 2, "lt": 59, "distinct": 43 },
                { "key": [1100000], "eq": 5, "lt": 933, "distinct": 300 }
            ] }
        ]
    },
    {
        "table": "customers", "index": "name", "row_count": 100,
        "statistics": [
            { "columns": 1, "histogram": [
                { "key": ["Adams"], "eq": 1, "lt": 0, "distinct": 0 },
                { "key": ["Zimmer"], "eq": 1, "lt": 98, "distinct": 98 }
            ] }
        ]
    }
]"#;

pub struct Fixture {
    pub schema: Arc<Schema>,
    pub estimator: CostEstimator,
}

impl Fixture {
    pub fn table(&self, name: &str) -> TableId {
        self.schema.table_by_name(name).unwrap().id()
    }

    pub fn tables(&self, names: &[&str]) -> Vec<TableId> {
        names.iter().map(|n| self.table(n)).collect()
    }

    pub fn index(&self, table: &str, name: &str) -> IndexId {
        self.schema.index_by_name(table, name).unwrap().id()
    }

    pub fn group(&self) -> GroupId {
        self.schema.table_by_name("customers").unwrap().group()
    }
}

pub fn fixture() -> Fixture {
    fixture_with(EstimatorConfig::default())
}

pub fn fixture_with(config: EstimatorConfig) -> Fixture {
    let schema = Arc::new(
        SchemaDefinition::from_json_str(SCHEMA)
            .unwrap()
            .build()
            .unwrap(),
    );
    let snapshot = StatisticsLoader::new(&schema).load_str(STATISTICS).unwrap();

    let id = |name: &str| schema.table_by_name(name).unwrap().id();
    let counts = RowCounts::new()
        .with_count(id("customers"), 100)
        .with_count(id("orders"), 1000)
        .with_count(id("items"), 20000)
        .with_count(id("shipments"), 2000)
        .with_count(id("addresses"), 100)
        .with_count(id("parts"), 500);

    let estimator = CostEstimator::new(
        Arc::clone(&schema),
        Arc::new(snapshot),
        Arc::new(counts),
        config,
    );
    Fixture { schema, estimator }
}
