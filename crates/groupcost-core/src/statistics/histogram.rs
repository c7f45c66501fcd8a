//! Histograms over encoded index keys.

use bytes::Bytes;
use groupcost_common::{Error, Result};

/// One histogram entry.
///
/// A bucket summarizes the sampled rows whose key is at most `key`: rows
/// equal to the boundary, and rows strictly between the previous boundary
/// and this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramBucket {
    /// Encoded boundary key.
    pub key: Bytes,
    /// Rows whose key equals the boundary.
    pub equal_count: u64,
    /// Rows strictly between the previous boundary and this one.
    pub less_count: u64,
    /// Distinct keys strictly between the previous boundary and this one.
    pub distinct_count: u64,
}

impl HistogramBucket {
    /// Creates a bucket.
    #[must_use]
    pub fn new(key: impl Into<Bytes>, equal_count: u64, less_count: u64, distinct_count: u64) -> Self {
        Self {
            key: key.into(),
            equal_count,
            less_count,
            distinct_count,
        }
    }

    /// Rows covered by this bucket, boundary included.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.equal_count.saturating_add(self.less_count)
    }
}

/// Where a key falls in a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketPosition {
    /// The key equals the boundary of this bucket.
    Exact(usize),
    /// The key lies strictly between the previous boundary and this one.
    Within(usize),
    /// The key sorts after every boundary.
    PastEnd,
}

/// Histogram over a prefix of an index's key columns.
///
/// Buckets are strictly ordered by boundary key. Instances are immutable;
/// a statistics refresh replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    first_column: usize,
    column_count: usize,
    buckets: Vec<HistogramBucket>,
}

impl Histogram {
    /// Creates a histogram over `column_count` index columns starting at
    /// `first_column`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHistogram`] if `column_count` is 0 or the
    /// boundary keys are not strictly increasing.
    pub fn new(
        first_column: usize,
        column_count: usize,
        buckets: Vec<HistogramBucket>,
    ) -> Result<Self> {
        if column_count == 0 {
            return Err(Error::InvalidHistogram(
                "histogram must cover at least one column".to_string(),
            ));
        }
        if let Some(pos) = buckets.windows(2).position(|w| w[0].key >= w[1].key) {
            return Err(Error::InvalidHistogram(format!(
                "bucket {} key does not sort after bucket {pos}",
                pos + 1
            )));
        }
        Ok(Self {
            first_column,
            column_count,
            buckets,
        })
    }

    /// Position of the first covered index column.
    #[must_use]
    pub fn first_column(&self) -> usize {
        self.first_column
    }

    /// Number of covered index columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Buckets in key order.
    #[must_use]
    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    /// Returns true if the histogram has no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total sampled rows summarized by the histogram.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.buckets
            .iter()
            .fold(0u64, |acc, b| acc.saturating_add(b.row_count()))
    }

    /// Total distinct keys: each bucket's interior distinct count plus one
    /// for every boundary key that has rows.
    #[must_use]
    pub fn total_distinct_count(&self) -> u64 {
        self.buckets.iter().fold(0u64, |acc, b| {
            acc.saturating_add(b.distinct_count)
                .saturating_add(u64::from(b.equal_count > 0))
        })
    }

    /// Locates `key` by binary search over the boundaries.
    #[must_use]
    pub fn locate(&self, key: &[u8]) -> BucketPosition {
        match self.buckets.binary_search_by(|b| b.key.as_ref().cmp(key)) {
            Ok(i) => BucketPosition::Exact(i),
            Err(i) if i < self.buckets.len() => BucketPosition::Within(i),
            Err(_) => BucketPosition::PastEnd,
        }
    }

    /// Boundary key of the bucket before `bucket`, or the empty key (start
    /// of the key space) for the first bucket.
    #[must_use]
    pub fn previous_key(&self, bucket: usize) -> &[u8] {
        match bucket.checked_sub(1) {
            Some(prev) => self.buckets.get(prev).map_or(&[][..], |b| b.key.as_ref()),
            None => &[],
        }
    }
}
