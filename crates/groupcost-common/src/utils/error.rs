//! Error types shared across groupcost.
//!
//! Only structural misuse is an error. Missing statistics, empty ranges and
//! degenerate arithmetic are handled inside the estimators by falling back
//! to default estimates and never surface here.

use thiserror::Error;

/// Result alias using the groupcost [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by schema construction, statistics loading and the
/// estimators when they are called with inputs that violate their contract.
#[derive(Error, Debug)]
pub enum Error {
    /// A table name or id that the schema does not contain.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// An index name or id that the schema does not contain.
    #[error("unknown index: {0}")]
    UnknownIndex(String),

    /// A group name or id that the schema does not contain.
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// A column that its table does not declare.
    #[error("unknown column {column} in table {table}")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A name declared twice.
    #[error("duplicate {kind}: {name}")]
    Duplicate {
        /// What kind of object was duplicated.
        kind: &'static str,
        /// The duplicated name.
        name: String,
    },

    /// The scanned table is not a node of the join tree being costed.
    #[error("table {0} is not part of the join tree")]
    TableNotInJoinTree(String),

    /// A join tree that does not mirror a single table group.
    #[error("malformed join tree: {0}")]
    MalformedJoinTree(String),

    /// More constrained columns than the index has.
    #[error("index {index} has {columns} columns but the scan constrains {constrained}")]
    TooManyComparands {
        /// Index name.
        index: String,
        /// Number of index columns.
        columns: usize,
        /// Number of columns the scan constrains.
        constrained: usize,
    },

    /// A histogram whose buckets violate ordering or shape invariants.
    #[error("invalid histogram: {0}")]
    InvalidHistogram(String),

    /// A statistics document that cannot be applied to the schema.
    #[error("invalid statistics: {0}")]
    InvalidStatistics(String),

    /// A per-table row count that a costing call required but was not given.
    #[error("no row count supplied for table {0}")]
    MissingTableCount(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O failure while reading an input document.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON input.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
