//! Cost model strategy.
//!
//! The estimators only ever call the [`CostModel`] trait. A planner picks
//! the implementation through a [`CostModelFactory`] once per planning
//! session; [`BTreeCostModel`] is the reference implementation.

use std::sync::Arc;

use super::CostEstimate;
use crate::config::CostModelConfig;
use groupcost_common::{GroupId, TableId};
use groupcost_core::{Index, Schema, TableRowCounts};

/// Converts operation shapes and row counts into abstract costs.
pub trait CostModel: Send + Sync {
    /// Short name, for diagnostics.
    fn name(&self) -> &str;

    /// Scanning `rows` entries of `index`, including the descent to the
    /// first entry.
    fn index_scan(&self, index: &Index, rows: f64) -> f64;

    /// Fetching the rows of `tables` that are ancestors of (or equal to)
    /// the current row, by hkey prefix.
    fn ancestor_lookup(&self, tables: &[TableId]) -> f64;

    /// Fetching one row of `branch_root` together with all of its
    /// descendants.
    fn branch_lookup(&self, branch_root: TableId) -> f64;

    /// Combining `rows` parent/child row pairs into flattened rows.
    fn flatten(&self, rows: f64) -> f64;

    /// Producing `rows` rows of a cross product of independent branches.
    fn product(&self, rows: f64) -> f64;

    /// Filtering `rows` rows.
    fn select(&self, rows: f64) -> f64;

    /// Fully sorting `rows` rows.
    fn sort(&self, rows: f64, mixed_mode: bool) -> f64;

    /// Sorting `rows` rows on `sort_fields` fields while keeping only a
    /// bounded number of them.
    fn sort_with_limit(&self, rows: f64, sort_fields: usize) -> f64;

    /// Reading every row of a group.
    fn full_group_scan(&self, group: GroupId) -> f64;

    /// Reading `rows` consecutive group rows starting at a row of `table`.
    fn partial_group_scan(&self, table: TableId, rows: f64) -> f64;

    /// Final adjustment applied to index scan estimates.
    fn adjust_cost_estimate(&self, estimate: CostEstimate) -> CostEstimate {
        estimate
    }
}

/// Creates a cost model for a planning session.
pub trait CostModelFactory: Send + Sync {
    /// Builds a cost model over `schema` and `row_counts`.
    fn new_cost_model(
        &self,
        schema: Arc<Schema>,
        row_counts: Arc<dyn TableRowCounts>,
    ) -> Box<dyn CostModel>;
}

/// Cost model for clustered B-tree storage: each access descends a tree
/// whose depth grows with the logarithm of its row count, and rows that
/// follow in key order are cheap.
pub struct BTreeCostModel {
    schema: Arc<Schema>,
    row_counts: Arc<dyn TableRowCounts>,
    config: CostModelConfig,
}

impl BTreeCostModel {
    /// Creates the model.
    #[must_use]
    pub fn new(
        schema: Arc<Schema>,
        row_counts: Arc<dyn TableRowCounts>,
        config: CostModelConfig,
    ) -> Self {
        Self {
            schema,
            row_counts,
            config,
        }
    }

    /// Levels descended to reach one of `rows` entries; at least 1.
    #[must_use]
    pub fn tree_depth(&self, rows: f64) -> f64 {
        if rows <= 1.0 {
            return 1.0;
        }
        (rows.ln() / self.config.tree_fanout.ln()).ceil().max(1.0)
    }

    fn rows(&self, table: TableId) -> f64 {
        self.row_counts.row_count(table) as f64
    }

    /// Rows stored in a whole group.
    fn group_rows(&self, group: GroupId) -> f64 {
        self.schema
            .group_tables(group)
            .map(|t| self.rows(t.id()))
            .sum()
    }

    /// Rows in the group that stores `table`.
    fn group_rows_of(&self, table: TableId) -> f64 {
        self.schema
            .table(table)
            .map_or_else(|| self.rows(table), |t| self.group_rows(t.group()))
    }

    /// Rows of `table` and all its descendants that cluster under one row
    /// of `table`.
    fn subtree_rows_per_row(&self, table: TableId) -> f64 {
        let own = self.rows(table).max(1.0);
        let mut total = 0.0;
        let mut pending = vec![table];
        while let Some(t) = pending.pop() {
            total += self.rows(t);
            pending.extend_from_slice(self.schema.children(t));
        }
        (total / own).max(1.0)
    }
}

impl CostModel for BTreeCostModel {
    fn name(&self) -> &str {
        "btree"
    }

    fn index_scan(&self, index: &Index, rows: f64) -> f64 {
        let entries = self.rows(index.leaf_table());
        let per_row = self.config.sequential_row_cost
            + self.config.index_field_cost * index.key_column_count() as f64;
        self.config.random_access_cost * self.tree_depth(entries) + rows * per_row
    }

    fn ancestor_lookup(&self, tables: &[TableId]) -> f64 {
        tables
            .iter()
            .map(|t| {
                self.config.random_access_cost * self.tree_depth(self.group_rows_of(*t))
                    + self.config.ancestor_level_cost
            })
            .sum()
    }

    fn branch_lookup(&self, branch_root: TableId) -> f64 {
        self.config.random_access_cost * self.tree_depth(self.group_rows_of(branch_root))
            + self.subtree_rows_per_row(branch_root) * self.config.sequential_row_cost
    }

    fn flatten(&self, rows: f64) -> f64 {
        rows * self.config.flatten_row_cost
    }

    fn product(&self, rows: f64) -> f64 {
        rows * self.config.product_row_cost
    }

    fn select(&self, rows: f64) -> f64 {
        rows * self.config.select_row_cost
    }

    fn sort(&self, rows: f64, mixed_mode: bool) -> f64 {
        if rows <= 1.0 {
            return 0.0;
        }
        let cost = rows * rows.log2() * self.config.sort_compare_cost;
        if mixed_mode {
            cost * self.config.mixed_sort_factor
        } else {
            cost
        }
    }

    fn sort_with_limit(&self, rows: f64, sort_fields: usize) -> f64 {
        rows * (self.config.sort_compare_cost
            + self.config.sort_field_cost * sort_fields.max(1) as f64)
    }

    fn full_group_scan(&self, group: GroupId) -> f64 {
        self.config.random_access_cost + self.group_rows(group) * self.config.sequential_row_cost
    }

    fn partial_group_scan(&self, table: TableId, rows: f64) -> f64 {
        self.config.random_access_cost * self.tree_depth(self.group_rows_of(table))
            + rows * self.config.sequential_row_cost
    }
}

/// Factory for [`BTreeCostModel`].
#[derive(Debug, Clone, Default)]
pub struct BTreeCostModelFactory {
    config: CostModelConfig,
}

impl BTreeCostModelFactory {
    /// Creates a factory handing `config` to every model.
    #[must_use]
    pub fn new(config: CostModelConfig) -> Self {
        Self { config }
    }
}

impl CostModelFactory for BTreeCostModelFactory {
    fn new_cost_model(
        &self,
        schema: Arc<Schema>,
        row_counts: Arc<dyn TableRowCounts>,
    ) -> Box<dyn CostModel> {
        Box::new(BTreeCostModel::new(schema, row_counts, self.config))
    }
}
