//! Costing the flattening of a table group into single rows.
//!
//! When an index scan enters a group at some table, producing full output
//! rows means fetching the required ancestors of each index row (ancestor
//! lookup), fetching required tables hanging off to the side of that
//! ancestor path (branch lookup), joining each parent row with its child
//! rows (flatten) and, when more than one independent branch contributes
//! rows, forming their cross product.
//!
//! Branch coverage is computed into a per-node state word kept outside the
//! tree. Bit 0 marks a node whose row is needed. Every other bit names a
//! branch: bit 1 is the path from the scanned table to the root, and each
//! side branch gets a fresh bit that is set on every node from its leaf up
//! to where it joins an already covered node.

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::debug;

use super::CostEstimator;
use crate::optimizer::{CostEstimate, JoinNodeId, TableGroupJoinTree};
use groupcost_common::{Error, Result, TableId};

const REQUIRED: u64 = 1;
const ANCESTOR: u64 = 1 << 1;
const BRANCH_MASK: u64 = !REQUIRED;
const SIDE_BRANCH_MASK: u64 = !(REQUIRED | ANCESTOR);
const FIRST_SIDE_BRANCH: u32 = 2;

/// A required table off the ancestor path and where its branch attaches.
#[derive(Debug, Clone, Copy)]
struct SideBranch {
    leaf: JoinNodeId,
    /// Covered node the branch joins.
    branch_point: JoinNodeId,
    /// Top of the subtree fetched by the branch lookup.
    branch_root: JoinNodeId,
}

#[derive(Debug)]
struct Coverage {
    state: Vec<u64>,
    side_branches: SmallVec<[SideBranch; 4]>,
}

impl Coverage {
    fn is_required(&self, node: JoinNodeId) -> bool {
        self.state[node.index()] & REQUIRED != 0
    }

    fn is_ancestor(&self, node: JoinNodeId) -> bool {
        self.state[node.index()] & ANCESTOR != 0
    }

    fn has_side_branches(&self, node: JoinNodeId) -> bool {
        self.state[node.index()] & SIDE_BRANCH_MASK != 0
    }
}

/// Per-subtree result of flattening from a group scan.
#[derive(Debug, Default)]
struct SubtreeFlatten {
    /// Flattened rows produced per row of the subtree's top table.
    rows_per_top_row: f64,
    /// Sum of flatten costs inside the subtree.
    flatten_cost: f64,
    /// Whether two or more independent branches contribute rows.
    branching: bool,
    /// Whether the subtree holds any required table.
    any_required: bool,
}

impl CostEstimator {
    /// Average rows of `child` per row of its ancestor `ancestor`, never
    /// less than 1. An empty ancestor counts as 1.
    #[must_use]
    pub fn descendant_cardinality(&self, child: TableId, ancestor: TableId) -> f64 {
        fan_out(
            self.table_row_count(child) as f64,
            self.table_row_count(ancestor) as f64,
        )
    }

    /// Cost of turning one row of an index on `index_table` into flattened
    /// rows containing `required` tables of `tree`.
    ///
    /// The result is per index row: its row count is the number of output
    /// rows each index row expands into. Combine it with the scan through
    /// [`CostEstimate::nest`].
    pub fn cost_flatten(
        &self,
        tree: &TableGroupJoinTree,
        index_table: TableId,
        required: &[TableId],
    ) -> Result<CostEstimate> {
        let start = tree.require(&self.schema, index_table)?;
        let coverage = self.cover_branches(tree, start, required)?;

        let ancestors: SmallVec<[TableId; 4]> = tree
            .path_to_root(start)
            .filter(|n| coverage.is_required(*n))
            .filter(|n| *n != start || !coverage.has_side_branches(start))
            .map(|n| tree.table(n))
            .collect();

        let mut rows = 1.0;
        let mut cost = 0.0;
        if !ancestors.is_empty() {
            cost += self.model.ancestor_lookup(&ancestors);
        }
        for branch in &coverage.side_branches {
            rows *= self.descendant_cardinality(
                tree.table(branch.leaf),
                tree.table(branch.branch_point),
            );
            cost += self.model.branch_lookup(tree.table(branch.branch_root));
        }
        for node in tree.iter() {
            if is_flattenable(tree, &coverage, node) {
                cost += self.model.flatten(self.rows_per_ancestor_row(tree, &coverage, node));
            }
        }
        if rows > 1.0 {
            cost += self.model.product(rows);
        }

        let estimate = CostEstimate::new(rows, cost);
        debug!(
            table = %self.schema.table_name(index_table),
            lookups = ancestors.len(),
            side_branches = coverage.side_branches.len(),
            rows,
            cost,
            "flatten estimate"
        );
        Ok(estimate)
    }

    /// Cost of flattening the `required` tables of `tree` out of a full
    /// scan of its group.
    pub fn cost_flatten_group(
        &self,
        tree: &TableGroupJoinTree,
        required: &[TableId],
    ) -> Result<CostEstimate> {
        let required = self.required_nodes(tree, required)?;
        let count = |t: TableId| -> Result<f64> { Ok(self.table_row_count(t) as f64) };
        let flatten = self.flatten_subtree(tree, tree.root(), &required, &count)?;
        let root_rows = self.table_row_count(tree.table(tree.root())) as f64;

        let rows = if flatten.any_required {
            root_rows * flatten.rows_per_top_row
        } else {
            0.0
        };
        let mut cost = self.model.full_group_scan(tree.group()) + flatten.flatten_cost;
        if flatten.branching {
            cost += self.model.product(rows);
        }
        Ok(CostEstimate::new(rows, cost))
    }

    /// Cost, per row of `outside`, of fetching and flattening `inside`
    /// where both belong to the same group and one is an ancestor of the
    /// other.
    pub fn cost_flatten_nested(
        &self,
        tree: &TableGroupJoinTree,
        outside: TableId,
        inside: TableId,
        required: &[TableId],
    ) -> Result<CostEstimate> {
        let outside_node = tree.require(&self.schema, outside)?;
        let inside_node = tree.require(&self.schema, inside)?;
        let required_nodes = self.required_nodes(tree, required)?;

        if tree.is_ancestor(inside_node, outside_node) {
            let mut tables: SmallVec<[TableId; 4]> = SmallVec::new();
            for node in tree.path_to_root(outside_node).skip(1) {
                if node == inside_node || required_nodes[node.index()] {
                    tables.push(tree.table(node));
                }
                if node == inside_node {
                    break;
                }
            }
            let cost = self.model.ancestor_lookup(&tables)
                + self.model.flatten(1.0) * tables.len() as f64;
            return Ok(CostEstimate::new(1.0, cost));
        }

        if tree.descendants(outside_node).contains(&inside_node) {
            let count = |t: TableId| -> Result<f64> { Ok(self.table_row_count(t) as f64) };
            let flatten = self.flatten_subtree(tree, inside_node, &required_nodes, &count)?;
            let rows = self.descendant_cardinality(inside, outside) * flatten.rows_per_top_row;
            let mut cost =
                self.model.branch_lookup(inside) + flatten.flatten_cost + self.model.flatten(rows);
            if flatten.branching {
                cost += self.model.product(rows);
            }
            return Ok(CostEstimate::new(rows, cost));
        }

        Err(Error::MalformedJoinTree(format!(
            "{} and {} are not on one branch",
            self.schema.table_name(outside),
            self.schema.table_name(inside)
        )))
    }

    /// Cost of scanning part of a group, with the rows of each table in
    /// the scanned range given by `table_counts`, and flattening the
    /// `required` tables.
    pub fn cost_partial_group_scan_and_flatten(
        &self,
        tree: &TableGroupJoinTree,
        required: &[TableId],
        table_counts: &HashMap<TableId, u64>,
    ) -> Result<CostEstimate> {
        let required = self.required_nodes(tree, required)?;
        let count = |t: TableId| -> Result<f64> {
            table_counts
                .get(&t)
                .map(|c| *c as f64)
                .ok_or_else(|| Error::MissingTableCount(self.schema.table_name(t)))
        };

        let mut scanned = 0.0;
        for node in tree.iter() {
            scanned += count(tree.table(node))?;
        }
        let flatten = self.flatten_subtree(tree, tree.root(), &required, &count)?;
        let root_rows = count(tree.table(tree.root()))?;
        let rows = if flatten.any_required {
            root_rows * flatten.rows_per_top_row
        } else {
            0.0
        };
        let mut cost = self
            .model
            .partial_group_scan(tree.table(tree.root()), scanned)
            + flatten.flatten_cost;
        if flatten.branching {
            cost += self.model.product(rows);
        }
        Ok(CostEstimate::new(rows, cost))
    }

    fn required_nodes(&self, tree: &TableGroupJoinTree, required: &[TableId]) -> Result<Vec<bool>> {
        let mut nodes = vec![false; tree.len()];
        for &table in required {
            nodes[tree.require(&self.schema, table)?.index()] = true;
        }
        Ok(nodes)
    }

    fn cover_branches(
        &self,
        tree: &TableGroupJoinTree,
        start: JoinNodeId,
        required: &[TableId],
    ) -> Result<Coverage> {
        let mut state: Vec<u64> = self
            .required_nodes(tree, required)?
            .into_iter()
            .map(u64::from)
            .collect();
        for node in tree.path_to_root(start) {
            state[node.index()] |= ANCESTOR;
        }
        // Includes the scanned table itself.
        let path_required = tree
            .path_to_root(start)
            .any(|n| state[n.index()] & REQUIRED != 0);
        let join_mask = if path_required {
            BRANCH_MASK
        } else {
            SIDE_BRANCH_MASK
        };

        let mut next_bit = FIRST_SIDE_BRANCH;
        let mut side_branches = SmallVec::new();
        for leaf in tree.iter().into_iter().rev() {
            if state[leaf.index()] & REQUIRED == 0 || state[leaf.index()] & BRANCH_MASK != 0 {
                continue;
            }
            if next_bit >= u64::BITS {
                return Err(Error::MalformedJoinTree(
                    "too many side branches".to_string(),
                ));
            }
            let branch = 1u64 << next_bit;
            next_bit += 1;

            let mut below = leaf;
            let mut node = leaf;
            while state[node.index()] & BRANCH_MASK == 0 {
                state[node.index()] |= branch;
                below = node;
                node = tree.parent(node).ok_or_else(|| {
                    Error::MalformedJoinTree("side branch does not reach the root".to_string())
                })?;
            }
            state[node.index()] |= branch;
            if (state[node.index()] & join_mask).count_ones() > 1 {
                state[node.index()] |= REQUIRED;
            }
            side_branches.push(SideBranch {
                leaf,
                branch_point: node,
                branch_root: if node == start { start } else { below },
            });
        }

        Ok(Coverage {
            state,
            side_branches,
        })
    }

    /// Rows of `node` per index row: one on the ancestor path, the fan-out
    /// from the ancestor path otherwise.
    fn rows_per_ancestor_row(
        &self,
        tree: &TableGroupJoinTree,
        coverage: &Coverage,
        node: JoinNodeId,
    ) -> f64 {
        match tree.path_to_root(node).find(|n| coverage.is_ancestor(*n)) {
            Some(n) if n == node => 1.0,
            Some(n) => self.descendant_cardinality(tree.table(node), tree.table(n)),
            None => 1.0,
        }
    }

    fn flatten_subtree(
        &self,
        tree: &TableGroupJoinTree,
        top: JoinNodeId,
        required: &[bool],
        count: &dyn Fn(TableId) -> Result<f64>,
    ) -> Result<SubtreeFlatten> {
        let order = tree.subtree(top);
        let mut contains = vec![false; tree.len()];
        let mut factor = vec![1.0f64; tree.len()];
        let mut result = SubtreeFlatten::default();

        for &node in order.iter().rev() {
            let rows = count(tree.table(node))?;
            let mut contributing = 0usize;
            for child in tree.children(node) {
                if !contains[child.index()] {
                    continue;
                }
                contributing += 1;
                let child_rows = count(tree.table(child))?;
                let per_row = if rows > 0.0 {
                    factor[child.index()] * child_rows / rows
                } else {
                    factor[child.index()]
                };
                factor[node.index()] *= per_row.max(1.0);
            }
            contains[node.index()] = required[node.index()] || contributing > 0;
            result.branching |= contributing > 1;

            if required[node.index()] && required_ancestor_within(tree, node, top, required) {
                result.flatten_cost += self.model.flatten(rows);
            }
        }

        result.rows_per_top_row = factor[top.index()];
        result.any_required = contains[top.index()];
        Ok(result)
    }
}

fn fan_out(child_rows: f64, ancestor_rows: f64) -> f64 {
    if ancestor_rows <= 0.0 {
        return 1.0;
    }
    (child_rows / ancestor_rows).max(1.0)
}

/// Returns true if a proper ancestor of `node`, no higher than `top`, is
/// required.
fn required_ancestor_within(
    tree: &TableGroupJoinTree,
    node: JoinNodeId,
    top: JoinNodeId,
    required: &[bool],
) -> bool {
    if node == top {
        return false;
    }
    for n in tree.path_to_root(node).skip(1) {
        if required[n.index()] {
            return true;
        }
        if n == top {
            break;
        }
    }
    false
}

/// A required node with a required ancestor is joined to it.
fn is_flattenable(tree: &TableGroupJoinTree, coverage: &Coverage, node: JoinNodeId) -> bool {
    coverage.is_required(node)
        && tree
            .path_to_root(node)
            .skip(1)
            .any(|n| coverage.is_required(n))
}
