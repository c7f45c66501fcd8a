//! Cost estimation entry points.
//!
//! [`CostEstimator`] answers the planner's questions about candidate plan
//! shapes: how many rows an index scan returns and what it costs, what
//! flattening a table group costs, and the cost of the operators placed on
//! top (select, sort). It holds the statistics snapshot it was created
//! with, so a refresh never changes estimates mid-planning.

mod flatten;

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::selectivity::{equal_rows, is_empty_range, range_rows};
use super::{
    BTreeCostModelFactory, ColumnCondition, ColumnConditions, Comparand, CostEstimate, CostModel,
    CostModelFactory, IndexScanShape, KeyBound, RangeBound,
};
use crate::config::EstimatorConfig;
use groupcost_common::{Error, GroupId, IndexId, Result, TableId};
use groupcost_core::{
    ColumnHistogram, Index, IndexColumn, KeyEncoder, Schema, StatisticsSource, TableRowCounts,
};

/// Estimates row counts and costs from schema, statistics and row counts.
pub struct CostEstimator {
    schema: Arc<Schema>,
    statistics: Arc<dyn StatisticsSource>,
    row_counts: Arc<dyn TableRowCounts>,
    model: Box<dyn CostModel>,
    config: EstimatorConfig,
    encoder: KeyEncoder,
}

impl CostEstimator {
    /// Creates an estimator using the reference B-tree cost model.
    #[must_use]
    pub fn new(
        schema: Arc<Schema>,
        statistics: Arc<dyn StatisticsSource>,
        row_counts: Arc<dyn TableRowCounts>,
        config: EstimatorConfig,
    ) -> Self {
        let factory = BTreeCostModelFactory::new(config.cost_model);
        Self::with_factory(schema, statistics, row_counts, config, &factory)
    }

    /// Creates an estimator whose cost model comes from `factory`.
    #[must_use]
    pub fn with_factory(
        schema: Arc<Schema>,
        statistics: Arc<dyn StatisticsSource>,
        row_counts: Arc<dyn TableRowCounts>,
        config: EstimatorConfig,
        factory: &dyn CostModelFactory,
    ) -> Self {
        let model = factory.new_cost_model(Arc::clone(&schema), Arc::clone(&row_counts));
        debug!(model = model.name(), "cost estimator created");
        Self {
            schema,
            statistics,
            row_counts,
            model,
            config,
            encoder: KeyEncoder::new(),
        }
    }

    /// The schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// The active cost model.
    #[must_use]
    pub fn cost_model(&self) -> &dyn CostModel {
        self.model.as_ref()
    }

    /// Current row count of a table.
    #[must_use]
    pub fn table_row_count(&self, table: TableId) -> u64 {
        self.row_counts.row_count(table)
    }

    /// Estimated rows returned by scanning `index` with `shape`, floored
    /// at the configured minimum.
    ///
    /// Per-column selectivities come from histograms and are multiplied
    /// together. Columns without a histogram use the missing-statistics
    /// selectivity. The product is applied to the sampled count of the
    /// indexed table's statistics and then scaled to its live row count,
    /// unless every histogram involved is mostly distinct. A range no key
    /// can satisfy returns the minimum directly.
    pub fn size_index_scan(&self, index: IndexId, shape: &IndexScanShape) -> Result<f64> {
        let index = self.schema.require_index(index)?;
        if shape.constrained_columns() > index.key_column_count() {
            return Err(Error::TooManyComparands {
                index: index.name().to_string(),
                columns: index.key_column_count(),
                constrained: shape.constrained_columns(),
            });
        }

        let table = index.leaf_table();
        let row_count = self.table_row_count(table) as f64;
        let min_rows = self.config.min_row_count;
        if shape.is_ordering_only() {
            return Ok(row_count.max(min_rows));
        }
        if index.is_unique() && shape.equalities.len() == index.key_column_count() {
            return Ok(min_rows.max(1.0));
        }

        let mut selectivity = 1.0;
        let mut histograms: SmallVec<[Option<ColumnHistogram>; 4]> = SmallVec::new();
        for (position, comparand) in shape.equalities.iter().enumerate() {
            let histogram = self.index_column_histogram(index, position);
            let fraction = self.fraction_equal(histogram.as_ref(), comparand);
            trace!(index = %index.name(), column = position, fraction, "equality selectivity");
            selectivity *= fraction;
            histograms.push(histogram);
        }
        if shape.has_range() {
            let position = shape.equalities.len();
            let low = shape.low.as_ref().and_then(|b| b.encode(&self.encoder));
            let high = shape.high.as_ref().and_then(|b| b.encode(&self.encoder));
            if is_empty_range(low.as_ref(), high.as_ref()) {
                debug!(index = %index.name(), column = position, "empty range");
                return Ok(min_rows);
            }
            let histogram = self.index_column_histogram(index, position);
            let fraction =
                self.fraction_between_keys(histogram.as_ref(), low.as_ref(), high.as_ref());
            trace!(index = %index.name(), column = position, fraction, "range selectivity");
            selectivity *= fraction;
            histograms.push(histogram);
        }

        let mostly_distinct = histograms
            .iter()
            .all(|h| h.as_ref().is_some_and(ColumnHistogram::is_mostly_distinct));
        let basis = histograms
            .iter()
            .flatten()
            .find(|h| self.leads_with_table(h.source_index(), table));

        let rows = match basis {
            Some(histogram) if histogram.sampled_count() > 0 => {
                self.check_row_count_changed(table, histogram, row_count);
                let stats_count = histogram.sampled_count() as f64;
                let sampled_rows = (selectivity * stats_count).round().max(1.0);
                if mostly_distinct {
                    sampled_rows
                } else {
                    (sampled_rows * row_count / stats_count + 0.5).floor()
                }
            }
            _ => (selectivity * row_count).round().max(1.0),
        };
        Ok(rows.max(min_rows))
    }

    /// Estimated rows and cost of scanning `index` with `shape`.
    pub fn cost_index_scan(&self, index: IndexId, shape: &IndexScanShape) -> Result<CostEstimate> {
        let rows = self.size_index_scan(index, shape)?;
        let estimate = self.cost_index_scan_rows(index, rows)?;
        debug!(
            index = %self.schema.require_index(index)?.name(),
            rows = estimate.row_count(),
            cost = estimate.cost(),
            "index scan estimate"
        );
        Ok(estimate)
    }

    /// Cost of scanning a known number of rows of `index`.
    pub fn cost_index_scan_rows(&self, index: IndexId, rows: f64) -> Result<CostEstimate> {
        let index = self.schema.require_index(index)?;
        let cost = self.model.index_scan(index, rows);
        Ok(self
            .model
            .adjust_cost_estimate(CostEstimate::new(rows, cost)))
    }

    /// Fraction of rows whose column equals `comparand`.
    ///
    /// Without a usable histogram the missing-statistics selectivity is
    /// used. A value unknown at estimation time matches one sampled row. A
    /// VALUES column averages over its values.
    #[must_use]
    pub fn fraction_equal(&self, histogram: Option<&ColumnHistogram>, comparand: &Comparand) -> f64 {
        let Some(histogram) = usable(histogram) else {
            debug!("no histogram, using missing statistics selectivity");
            return self.config.missing_stats_selectivity;
        };
        let sampled = histogram.sampled_count() as f64;
        match comparand {
            Comparand::Values(values) if !values.is_empty() => {
                let total: f64 = values
                    .iter()
                    .map(|v| equal_rows(histogram.histogram(), &self.encoder.encode_value(v)))
                    .sum();
                (total / values.len() as f64 / sampled).min(1.0)
            }
            _ if comparand.is_variable() => (1.0 / sampled).min(1.0),
            _ => comparand.encode(&self.encoder).map_or(0.0, |key| {
                (equal_rows(histogram.histogram(), &key) / sampled).min(1.0)
            }),
        }
    }

    /// Fraction of rows whose column lies between `low` and `high`.
    ///
    /// A missing or variable side is unbounded; when both are, the range
    /// does not restrict anything.
    #[must_use]
    pub fn fraction_between(
        &self,
        histogram: Option<&ColumnHistogram>,
        low: Option<&RangeBound>,
        high: Option<&RangeBound>,
    ) -> f64 {
        let low = low.and_then(|b| b.encode(&self.encoder));
        let high = high.and_then(|b| b.encode(&self.encoder));
        self.fraction_between_keys(histogram, low.as_ref(), high.as_ref())
    }

    fn fraction_between_keys(
        &self,
        histogram: Option<&ColumnHistogram>,
        low: Option<&KeyBound>,
        high: Option<&KeyBound>,
    ) -> f64 {
        if low.is_none() && high.is_none() {
            return 1.0;
        }
        let Some(histogram) = usable(histogram) else {
            debug!("no histogram, using missing statistics selectivity");
            return self.config.missing_stats_selectivity;
        };
        let rows = range_rows(histogram.histogram(), low, high).max(1);
        (rows as f64 / histogram.sampled_count() as f64).min(1.0)
    }

    /// Combined selectivity of a conjunction of conditions on columns of
    /// `table`.
    ///
    /// Conditions on the same column are combined first: an equality wins
    /// over an IN list, which wins over a range built from the tightest
    /// constant bounds. `<>` conditions then remove the equal fraction.
    /// Columns without a histogram contribute the missing-statistics
    /// selectivity once.
    pub fn conditions_selectivity(
        &self,
        table: TableId,
        conditions: &ColumnConditions,
    ) -> Result<f64> {
        let table_ref = self.schema.require_table(table)?;
        let mut selectivity = 1.0;
        for column in conditions.columns() {
            if !table_ref.has_column(column) {
                return Err(Error::UnknownColumn {
                    table: table_ref.name().to_string(),
                    column: column.to_string(),
                });
            }
            let histogram = self.leading_column_histogram(&IndexColumn {
                table,
                column: column.to_string(),
            });
            let fraction = if usable(histogram.as_ref()).is_some() {
                self.column_selectivity(histogram.as_ref(), conditions.on(column))
            } else {
                self.config.missing_stats_selectivity
            };
            trace!(table = %table_ref.name(), column, fraction, "condition selectivity");
            selectivity *= fraction;
        }
        Ok(selectivity)
    }

    fn column_selectivity<'a>(
        &self,
        histogram: Option<&ColumnHistogram>,
        conditions: impl Iterator<Item = &'a ColumnCondition>,
    ) -> f64 {
        let mut equality = None;
        let mut in_list: Vec<&Comparand> = Vec::new();
        let mut not_equal: Vec<&Comparand> = Vec::new();
        let mut low: Option<KeyBound> = None;
        let mut high: Option<KeyBound> = None;

        for condition in conditions {
            match condition {
                ColumnCondition::Eq(c) => equality = equality.or(Some(c)),
                ColumnCondition::In(list) => in_list.extend(list),
                ColumnCondition::Ne(c) => not_equal.push(c),
                ColumnCondition::Gt(c) | ColumnCondition::Ge(c) => {
                    let inclusive = matches!(condition, ColumnCondition::Ge(_));
                    if let Some(key) = c.encode(&self.encoder) {
                        let bound = KeyBound { key, inclusive };
                        low = Some(match low {
                            Some(current) if tighter_low(&current, &bound) => current,
                            _ => bound,
                        });
                    }
                }
                ColumnCondition::Lt(c) | ColumnCondition::Le(c) => {
                    let inclusive = matches!(condition, ColumnCondition::Le(_));
                    if let Some(key) = c.encode(&self.encoder) {
                        let bound = KeyBound { key, inclusive };
                        high = Some(match high {
                            Some(current) if tighter_high(&current, &bound) => current,
                            _ => bound,
                        });
                    }
                }
            }
        }

        let mut fraction = if let Some(c) = equality {
            self.fraction_equal(histogram, c)
        } else if !in_list.is_empty() {
            in_list
                .iter()
                .map(|c| self.fraction_equal(histogram, c))
                .sum::<f64>()
                .min(1.0)
        } else {
            self.fraction_between_keys(histogram, low.as_ref(), high.as_ref())
        };
        for c in not_equal {
            fraction *= (1.0 - self.fraction_equal(histogram, c)).max(0.0);
        }
        fraction
    }

    /// Applies a filter of the given selectivity to `input`.
    #[must_use]
    pub fn cost_select(&self, input: CostEstimate, selectivity: f64) -> CostEstimate {
        let rows = input.row_count() * selectivity.clamp(0.0, 1.0);
        CostEstimate::new(rows, input.cost() + self.model.select(input.row_count()))
    }

    /// Fully sorts `input`.
    #[must_use]
    pub fn cost_sort(&self, input: CostEstimate, mixed_mode: bool) -> CostEstimate {
        CostEstimate::new(
            input.row_count(),
            input.cost() + self.model.sort(input.row_count(), mixed_mode),
        )
    }

    /// Sorts `input` keeping at most `limit` rows.
    #[must_use]
    pub fn cost_sort_with_limit(
        &self,
        input: CostEstimate,
        limit: u64,
        sort_fields: usize,
    ) -> CostEstimate {
        CostEstimate::new(
            input.row_count().min(limit as f64),
            input.cost() + self.model.sort_with_limit(input.row_count(), sort_fields),
        )
    }

    /// Reads every row of a group.
    pub fn cost_group_scan(&self, group: GroupId) -> Result<CostEstimate> {
        let group_ref = self
            .schema
            .group(group)
            .ok_or_else(|| Error::UnknownGroup(group.to_string()))?;
        let rows: u64 = self
            .schema
            .group_tables(group)
            .map(|t| self.table_row_count(t.id()))
            .sum();
        let estimate = CostEstimate::new(rows as f64, self.model.full_group_scan(group));
        debug!(group = %group_ref.name(), rows, cost = estimate.cost(), "group scan estimate");
        Ok(estimate)
    }

    /// Histogram for one key column of `index`: the index's own single
    /// column histogram, else one from another index led by the column.
    fn index_column_histogram(&self, index: &Index, position: usize) -> Option<ColumnHistogram> {
        self.statistics
            .index_statistics(index.id())
            .and_then(|stats| stats.column_histogram(position, 1))
            .filter(|h| !h.histogram().is_empty())
            .or_else(|| self.leading_column_histogram(&index.columns()[position]))
    }

    /// Histogram of the first column of a table index, then of a group
    /// index, led by `column`.
    fn leading_column_histogram(&self, column: &IndexColumn) -> Option<ColumnHistogram> {
        let table = self.schema.table(column.table)?;
        let table_indexes = self.schema.table_indexes(table.id());
        let group_indexes = self.schema.group_indexes(table.group());
        table_indexes
            .chain(group_indexes)
            .filter(|i| i.leading_column() == column)
            .find_map(|i| {
                self.statistics
                    .index_statistics(i.id())
                    .and_then(|stats| stats.column_histogram(0, 1))
                    .filter(|h| !h.histogram().is_empty())
            })
    }

    fn leads_with_table(&self, index: IndexId, table: TableId) -> bool {
        self.schema
            .index(index)
            .is_some_and(|i| i.leading_column().table == table)
    }

    fn check_row_count_changed(&self, table: TableId, histogram: &ColumnHistogram, live: f64) {
        let analyzed = histogram.row_count() as f64;
        if analyzed * 2.0 < live || live * 2.0 < analyzed {
            warn!(
                table = %self.schema.table_name(table),
                analyzed,
                live,
                "row count changed since statistics were gathered"
            );
        }
    }
}

fn usable(histogram: Option<&ColumnHistogram>) -> Option<&ColumnHistogram> {
    histogram.filter(|h| !h.histogram().is_empty() && h.sampled_count() > 0)
}

fn tighter_low(current: &KeyBound, candidate: &KeyBound) -> bool {
    current.key > candidate.key || (current.key == candidate.key && !current.inclusive)
}

fn tighter_high(current: &KeyBound, candidate: &KeyBound) -> bool {
    current.key < candidate.key || (current.key == candidate.key && !current.inclusive)
}

#[cfg(test)]
mod tests;
