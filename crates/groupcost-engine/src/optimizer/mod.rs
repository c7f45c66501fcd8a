//! Cost estimation for table-group plans.
//!
//! ## Submodules
//!
//! - [`cost`] - Pluggable cost model and the reference B-tree model
//! - [`comparand`] - Predicate operands and index scan shapes
//! - [`estimate`] - Row count and cost pairs
//! - [`estimator`] - Index scan sizing, selectivity and flatten costing
//! - [`join_tree`] - Join trees over one table group
//! - [`selectivity`] - Histogram row counts for equalities and ranges

pub mod comparand;
pub mod cost;
pub mod estimate;
pub mod estimator;
pub mod join_tree;
pub mod selectivity;

pub use comparand::{
    ColumnCondition, ColumnConditions, Comparand, IndexScanShape, KeyBound, RangeBound,
};
pub use cost::{BTreeCostModel, BTreeCostModelFactory, CostModel, CostModelFactory};
pub use estimate::CostEstimate;
pub use estimator::CostEstimator;
pub use join_tree::{JoinNodeId, TableGroupJoinTree};
