//! Table cardinalities.

use super::StatisticsSource;
use crate::schema::{IndexKind, Schema};
use groupcost_common::TableId;
use hashbrown::HashMap;

/// Estimated row count of each table.
pub trait TableRowCounts: Send + Sync {
    /// Rows in `table`.
    fn row_count(&self, table: TableId) -> u64;
}

/// Row counts from explicit values, falling back to analyzed statistics
/// and finally to a single row.
#[derive(Debug, Clone, Default)]
pub struct RowCounts {
    explicit: HashMap<TableId, u64>,
    analyzed: HashMap<TableId, u64>,
}

impl RowCounts {
    /// Creates row counts that know nothing and answer 1 for every table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the fallback counts from the analyzed row count of each
    /// table's indexes. Table indexes are consulted before group indexes.
    #[must_use]
    pub fn from_statistics(schema: &Schema, statistics: &dyn StatisticsSource) -> Self {
        let mut analyzed = HashMap::new();
        for kind in [IndexKind::Table, IndexKind::Group] {
            for index in schema.indexes().iter().filter(|i| i.kind() == kind) {
                if let Some(stats) = statistics.index_statistics(index.id()) {
                    analyzed.entry(index.leaf_table()).or_insert(stats.row_count());
                }
            }
        }
        Self {
            explicit: HashMap::new(),
            analyzed,
        }
    }

    /// Sets the row count of a table.
    #[must_use]
    pub fn with_count(mut self, table: TableId, rows: u64) -> Self {
        self.set(table, rows);
        self
    }

    /// Sets the row count of a table.
    pub fn set(&mut self, table: TableId, rows: u64) {
        self.explicit.insert(table, rows);
    }

    /// Returns true if a count for `table` is known, explicitly or from
    /// statistics.
    #[must_use]
    pub fn contains(&self, table: TableId) -> bool {
        self.explicit.contains_key(&table) || self.analyzed.contains_key(&table)
    }
}

impl TableRowCounts for RowCounts {
    fn row_count(&self, table: TableId) -> u64 {
        self.explicit
            .get(&table)
            .or_else(|| self.analyzed.get(&table))
            .copied()
            .unwrap_or(1)
    }
}
