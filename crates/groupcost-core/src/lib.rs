//! # groupcost-core
//!
//! Core layer for groupcost: the schema model, byte-key encoding, and the
//! statistics consumed by the cost estimators.
//!
//! Nothing in this crate touches storage. Statistics arrive already
//! collected (from a [`statistics::StatisticsLoader`] document or an
//! external service) and are shared read-only by reference.
//!
//! ## Modules
//!
//! - [`key`] - Order-preserving key encoding and byte-key interpolation
//! - [`schema`] - Tables, table groups and indexes
//! - [`statistics`] - Histograms, per-index statistics, row counts

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod key;
pub mod schema;
pub mod statistics;

// Re-export commonly used types
pub use key::{KeyEncoder, uniform_portion};
pub use schema::{
    Group, Index, IndexColumn, IndexKind, Schema, SchemaBuilder, SchemaDefinition, Table,
};
pub use statistics::{
    BucketPosition, ColumnHistogram, Histogram, HistogramBucket, IndexStatistics, RowCounts,
    StatisticsLoader, StatisticsSnapshot, StatisticsSource, StatisticsStore, TableRowCounts,
};
