//! Statistics consumed by the cost estimators.
//!
//! This module provides:
//! - [`Histogram`]: bucketed key distribution over a prefix of index columns
//! - [`IndexStatistics`]: analyzed row and sample counts plus histograms
//! - [`StatisticsSource`], [`StatisticsSnapshot`], [`StatisticsStore`]:
//!   lookup and copy-on-write refresh
//! - [`TableRowCounts`], [`RowCounts`]: table cardinalities
//! - [`StatisticsLoader`]: JSON statistics documents

mod histogram;
mod index;
mod loader;
mod row_counts;
mod store;

pub use histogram::{BucketPosition, Histogram, HistogramBucket};
pub use index::{ColumnHistogram, IndexStatistics};
pub use loader::StatisticsLoader;
pub use row_counts::{RowCounts, TableRowCounts};
pub use store::{StatisticsSnapshot, StatisticsSource, StatisticsStore};
