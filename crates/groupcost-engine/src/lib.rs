//! # groupcost-engine
//!
//! Cost estimation for plans over grouped tables: how many rows an index
//! scan returns, what it costs, and what it costs to flatten the rows of a
//! table group into joined output rows.
//!
//! ## Modules
//!
//! - [`config`] - Estimator and cost model configuration
//! - [`optimizer`] - Estimators, cost model, join trees and selectivity

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod optimizer;

pub use config::{CostModelConfig, EstimatorConfig};
pub use optimizer::{
    BTreeCostModel, BTreeCostModelFactory, ColumnCondition, ColumnConditions, Comparand,
    CostEstimate, CostEstimator, CostModel, CostModelFactory, IndexScanShape, JoinNodeId,
    KeyBound, RangeBound, TableGroupJoinTree,
};
