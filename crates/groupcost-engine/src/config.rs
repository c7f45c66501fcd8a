//! Estimator configuration.
//!
//! Both structs deserialize from JSON with every field optional:
//!
//! ```json
//! {
//!   "missing_stats_selectivity": 0.85,
//!   "min_row_count": 1.0,
//!   "cost_model": { "tree_fanout": 100.0, "random_access_cost": 1.0 }
//! }
//! ```

use std::path::Path;

use groupcost_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Constants of the reference B-tree cost model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModelConfig {
    /// Average entries per B-tree page; sets the depth of a tree.
    pub tree_fanout: f64,
    /// Cost of descending one B-tree level.
    pub random_access_cost: f64,
    /// Cost of reading the next row in key order.
    pub sequential_row_cost: f64,
    /// Extra per-row cost for each index key column.
    pub index_field_cost: f64,
    /// Fixed cost per table fetched by an ancestor lookup.
    pub ancestor_level_cost: f64,
    /// Cost of combining one parent row with one child row.
    pub flatten_row_cost: f64,
    /// Cost per row of a cross product of side branches.
    pub product_row_cost: f64,
    /// Cost of evaluating a filter on one row.
    pub select_row_cost: f64,
    /// Cost of one sort comparison.
    pub sort_compare_cost: f64,
    /// Per-row cost of each sort field for a limited sort.
    pub sort_field_cost: f64,
    /// Multiplier for sorts mixing ascending and descending fields.
    pub mixed_sort_factor: f64,
}

impl Default for CostModelConfig {
    fn default() -> Self {
        Self {
            tree_fanout: 100.0,
            random_access_cost: 1.0,
            sequential_row_cost: 0.02,
            index_field_cost: 0.005,
            ancestor_level_cost: 0.1,
            flatten_row_cost: 0.01,
            product_row_cost: 0.01,
            select_row_cost: 0.005,
            sort_compare_cost: 0.01,
            sort_field_cost: 0.002,
            mixed_sort_factor: 1.5,
        }
    }
}

impl CostModelConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for data that is fully cached in memory, where page
    /// accesses cost about as much as row processing.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            random_access_cost: 0.1,
            sequential_row_cost: 0.005,
            ..Default::default()
        }
    }

    /// Sets the B-tree fanout.
    pub fn with_tree_fanout(mut self, fanout: f64) -> Self {
        self.tree_fanout = fanout;
        self
    }

    /// Sets the cost of descending one level.
    pub fn with_random_access_cost(mut self, cost: f64) -> Self {
        self.random_access_cost = cost;
        self
    }

    /// Sets the sequential row cost.
    pub fn with_sequential_row_cost(mut self, cost: f64) -> Self {
        self.sequential_row_cost = cost;
        self
    }

    /// Sets the ancestor lookup cost per table.
    pub fn with_ancestor_level_cost(mut self, cost: f64) -> Self {
        self.ancestor_level_cost = cost;
        self
    }

    /// Sets the flatten cost per row.
    pub fn with_flatten_row_cost(mut self, cost: f64) -> Self {
        self.flatten_row_cost = cost;
        self
    }

    /// Sets the product cost per row.
    pub fn with_product_row_cost(mut self, cost: f64) -> Self {
        self.product_row_cost = cost;
        self
    }

    /// Sets the sort comparison cost.
    pub fn with_sort_compare_cost(mut self, cost: f64) -> Self {
        self.sort_compare_cost = cost;
        self
    }

    /// Checks that every constant is finite and non-negative and that the
    /// fanout is greater than 1.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("random_access_cost", self.random_access_cost),
            ("sequential_row_cost", self.sequential_row_cost),
            ("index_field_cost", self.index_field_cost),
            ("ancestor_level_cost", self.ancestor_level_cost),
            ("flatten_row_cost", self.flatten_row_cost),
            ("product_row_cost", self.product_row_cost),
            ("select_row_cost", self.select_row_cost),
            ("sort_compare_cost", self.sort_compare_cost),
            ("sort_field_cost", self.sort_field_cost),
            ("mixed_sort_factor", self.mixed_sort_factor),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !self.tree_fanout.is_finite() || self.tree_fanout <= 1.0 {
            return Err(Error::Config(format!(
                "tree_fanout must be greater than 1, got {}",
                self.tree_fanout
            )));
        }
        Ok(())
    }
}

/// Estimator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Selectivity of a condition on a column that has no histogram.
    pub missing_stats_selectivity: f64,
    /// Smallest row count an index scan estimate reports.
    pub min_row_count: f64,
    /// Constants for the reference cost model.
    pub cost_model: CostModelConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            missing_stats_selectivity: 0.85,
            min_row_count: 1.0,
            cost_model: CostModelConfig::default(),
        }
    }
}

impl EstimatorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the missing-statistics selectivity.
    pub fn with_missing_stats_selectivity(mut self, selectivity: f64) -> Self {
        self.missing_stats_selectivity = selectivity;
        self
    }

    /// Sets the minimum row count.
    pub fn with_min_row_count(mut self, rows: f64) -> Self {
        self.min_row_count = rows;
        self
    }

    /// Sets the cost model constants.
    pub fn with_cost_model(mut self, cost_model: CostModelConfig) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Parses and validates JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        let s = self.missing_stats_selectivity;
        if !(s > 0.0 && s <= 1.0) {
            return Err(Error::Config(format!(
                "missing_stats_selectivity must be in (0, 1], got {s}"
            )));
        }
        if !self.min_row_count.is_finite() || self.min_row_count < 0.0 {
            return Err(Error::Config(format!(
                "min_row_count must be finite and non-negative, got {}",
                self.min_row_count
            )));
        }
        self.cost_model.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EstimatorConfig::default();
        assert!((config.missing_stats_selectivity - 0.85).abs() < 0.001);
        assert!((config.min_row_count - 1.0).abs() < 0.001);
        assert!(config.validate().is_ok());
        assert!(CostModelConfig::in_memory().validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = EstimatorConfig::from_json_str(
            r#"{ "min_row_count": 2.0, "cost_model": { "tree_fanout": 50.0 } }"#,
        )
        .unwrap();
        assert!((config.min_row_count - 2.0).abs() < 0.001);
        assert!((config.cost_model.tree_fanout - 50.0).abs() < 0.001);
        assert!((config.cost_model.random_access_cost - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_rejects_bad_selectivity() {
        assert!(matches!(
            EstimatorConfig::from_json_str(r#"{ "missing_stats_selectivity": 0.0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EstimatorConfig::new()
                .with_missing_stats_selectivity(1.5)
                .validate(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_cost_constants() {
        let config = EstimatorConfig::new()
            .with_cost_model(CostModelConfig::new().with_flatten_row_cost(-1.0));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        let config = EstimatorConfig::new()
            .with_cost_model(CostModelConfig::new().with_tree_fanout(1.0));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "missing_stats_selectivity": 0.5 }"#)
            .unwrap();
        let config = EstimatorConfig::from_path(file.path()).unwrap();
        assert!((config.missing_stats_selectivity - 0.5).abs() < 0.001);
    }
}
