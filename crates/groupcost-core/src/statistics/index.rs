//! Per-index statistics.

use std::sync::Arc;

use super::Histogram;
use groupcost_common::IndexId;

/// Analyzed statistics for one index.
///
/// `row_count` is the number of index entries when the statistics were
/// gathered; `sampled_count` is how many of them the histograms summarize.
#[derive(Debug, Clone)]
pub struct IndexStatistics {
    index: IndexId,
    row_count: u64,
    sampled_count: u64,
    analysis_timestamp: Option<u64>,
    histograms: Vec<Histogram>,
}

impl IndexStatistics {
    /// Creates statistics with no histograms.
    #[must_use]
    pub fn new(index: IndexId, row_count: u64, sampled_count: u64) -> Self {
        Self {
            index,
            row_count,
            sampled_count,
            analysis_timestamp: None,
            histograms: Vec::new(),
        }
    }

    /// Sets the analysis timestamp (milliseconds since the epoch).
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.analysis_timestamp = Some(timestamp);
        self
    }

    /// Adds a histogram, replacing any previous one over the same columns.
    #[must_use]
    pub fn with_histogram(mut self, histogram: Histogram) -> Self {
        self.histograms.retain(|h| {
            (h.first_column(), h.column_count())
                != (histogram.first_column(), histogram.column_count())
        });
        self.histograms.push(histogram);
        self
    }

    /// The index these statistics describe.
    #[must_use]
    pub fn index(&self) -> IndexId {
        self.index
    }

    /// Index entries when analyzed.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Entries summarized by the histograms.
    #[must_use]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count
    }

    /// When the statistics were gathered, if known.
    #[must_use]
    pub fn analysis_timestamp(&self) -> Option<u64> {
        self.analysis_timestamp
    }

    /// All histograms.
    #[must_use]
    pub fn histograms(&self) -> &[Histogram] {
        &self.histograms
    }

    /// The histogram over `column_count` columns starting at
    /// `first_column`.
    #[must_use]
    pub fn histogram(&self, first_column: usize, column_count: usize) -> Option<&Histogram> {
        self.histograms
            .iter()
            .find(|h| h.first_column() == first_column && h.column_count() == column_count)
    }

    /// Like [`histogram`](Self::histogram) but returns a shareable handle
    /// that keeps the statistics alive.
    #[must_use]
    pub fn column_histogram(
        self: &Arc<Self>,
        first_column: usize,
        column_count: usize,
    ) -> Option<ColumnHistogram> {
        let position = self
            .histograms
            .iter()
            .position(|h| h.first_column() == first_column && h.column_count() == column_count)?;
        Some(ColumnHistogram {
            statistics: Arc::clone(self),
            position,
        })
    }
}

/// A histogram together with the statistics it came from.
#[derive(Debug, Clone)]
pub struct ColumnHistogram {
    statistics: Arc<IndexStatistics>,
    position: usize,
}

impl ColumnHistogram {
    /// The histogram.
    #[must_use]
    pub fn histogram(&self) -> &Histogram {
        &self.statistics.histograms[self.position]
    }

    /// The statistics owning the histogram.
    #[must_use]
    pub fn statistics(&self) -> &IndexStatistics {
        &self.statistics
    }

    /// The index the histogram was built over.
    #[must_use]
    pub fn source_index(&self) -> IndexId {
        self.statistics.index
    }

    /// Entries the histogram summarizes.
    #[must_use]
    pub fn sampled_count(&self) -> u64 {
        self.statistics.sampled_count
    }

    /// Index entries when analyzed.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.statistics.row_count
    }

    /// Returns true when more than 90% of the sampled keys are distinct.
    #[must_use]
    pub fn is_mostly_distinct(&self) -> bool {
        let distinct = u128::from(self.histogram().total_distinct_count());
        distinct * 10 > u128::from(self.sampled_count()) * 9
    }
}
