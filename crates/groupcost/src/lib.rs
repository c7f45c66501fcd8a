//! # groupcost
//!
//! Cost estimation for query plans over hierarchically grouped tables.
//!
//! Tables form groups: a root table and its descendants, with child rows
//! stored next to their parent row. An index may cover columns of a single
//! table or of several tables along one branch of a group. Given a schema,
//! per-index histograms and live row counts, [`CostEstimator`] predicts how
//! many rows an index scan returns, what the scan costs, and what it costs
//! to turn each index row into a flattened row with its ancestors and side
//! branches.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use groupcost::{
//!     Comparand, CostEstimator, EstimatorConfig, IndexScanShape, RowCounts, Schema,
//!     StatisticsSnapshot, TableGroupJoinTree,
//! };
//!
//! let mut builder = Schema::builder();
//! let customers = builder.add_table("customers", &["cid", "name"], None)?;
//! let orders = builder.add_table("orders", &["oid", "cid", "order_date"], Some("customers"))?;
//! let by_date = builder.add_index("orders", "order_date", &["order_date"], false)?;
//! let schema = Arc::new(builder.build());
//!
//! let counts = RowCounts::new().with_count(customers, 100).with_count(orders, 1000);
//! let estimator = CostEstimator::new(
//!     Arc::clone(&schema),
//!     Arc::new(StatisticsSnapshot::new()),
//!     Arc::new(counts),
//!     EstimatorConfig::default(),
//! );
//!
//! // Without statistics the missing-statistics selectivity applies.
//! let shape = IndexScanShape::new().eq(Comparand::literal(1_032_275));
//! let scan = estimator.cost_index_scan(by_date, &shape)?;
//! assert_eq!(scan.row_count(), 850.0);
//!
//! // Fetch each order's customer as well.
//! let tree = TableGroupJoinTree::for_tables(&schema, &[customers, orders])?;
//! let flatten = estimator.cost_flatten(&tree, orders, &[customers, orders])?;
//! let plan = scan.nest(flatten);
//! assert_eq!(plan.row_count(), 850.0);
//! # Ok::<(), groupcost::Error>(())
//! ```

// Re-export the estimator API
pub use groupcost_engine::{
    BTreeCostModel, BTreeCostModelFactory, ColumnCondition, ColumnConditions, Comparand,
    CostEstimate, CostEstimator, CostModel, CostModelConfig, CostModelFactory, EstimatorConfig,
    IndexScanShape, JoinNodeId, KeyBound, RangeBound, TableGroupJoinTree,
};

// Re-export schema and statistics types
pub use groupcost_core::{
    ColumnHistogram, Histogram, HistogramBucket, IndexStatistics, KeyEncoder, RowCounts, Schema,
    SchemaBuilder, SchemaDefinition, StatisticsLoader, StatisticsSnapshot, StatisticsSource,
    StatisticsStore, TableRowCounts, uniform_portion,
};

// Re-export identifiers, values and errors
pub use groupcost_common::{Error, GroupId, IndexId, Result, TableId, Value};

