//! Loading statistics documents.
//!
//! A document is a JSON array with one entry per analyzed index:
//!
//! ```json
//! [
//!   {
//!     "table": "items",
//!     "index": "sku",
//!     "row_count": 20000,
//!     "sampled_count": 20000,
//!     "timestamp": 1700000000000,
//!     "statistics": [
//!       {
//!         "first_column": 0,
//!         "columns": 1,
//!         "histogram": [
//!           { "key": ["0254"], "eq": 110, "lt": 0, "distinct": 0 }
//!         ]
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! `index` names a table index of `table` or a group index of its group.
//! `sampled_count` defaults to `row_count`.

use std::path::Path;

use serde::Deserialize;

use super::{Histogram, HistogramBucket, IndexStatistics, StatisticsSnapshot};
use crate::key::KeyEncoder;
use crate::schema::Schema;
use groupcost_common::{Error, Result, Value};

#[derive(Debug, Deserialize)]
struct IndexEntry {
    table: String,
    index: String,
    row_count: u64,
    #[serde(default)]
    sampled_count: Option<u64>,
    #[serde(default)]
    timestamp: Option<u64>,
    #[serde(default)]
    statistics: Vec<HistogramEntry>,
}

#[derive(Debug, Deserialize)]
struct HistogramEntry {
    #[serde(default)]
    first_column: usize,
    columns: usize,
    #[serde(default)]
    histogram: Vec<BucketEntry>,
}

#[derive(Debug, Deserialize)]
struct BucketEntry {
    key: Vec<Value>,
    eq: u64,
    lt: u64,
    distinct: u64,
}

/// Reads statistics documents against a schema.
#[derive(Debug, Clone)]
pub struct StatisticsLoader<'a> {
    schema: &'a Schema,
    encoder: KeyEncoder,
    ignore_missing_indexes: bool,
}

impl<'a> StatisticsLoader<'a> {
    /// Creates a loader for `schema`.
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            encoder: KeyEncoder::new(),
            ignore_missing_indexes: false,
        }
    }

    /// Skips entries whose index does not exist instead of failing.
    #[must_use]
    pub fn ignore_missing_indexes(mut self, ignore: bool) -> Self {
        self.ignore_missing_indexes = ignore;
        self
    }

    /// Loads a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`load_str`](Self::load_str).
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<StatisticsSnapshot> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let snapshot = self.load_str(&text)?;
        tracing::info!(
            path = %path.display(),
            indexes = snapshot.len(),
            "loaded index statistics"
        );
        Ok(snapshot)
    }

    /// Loads JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed documents,
    /// [`Error::UnknownTable`] for an unknown table, [`Error::UnknownIndex`]
    /// for an unknown index unless missing indexes are ignored, and
    /// [`Error::InvalidStatistics`] or [`Error::InvalidHistogram`] for
    /// entries that do not fit their index.
    pub fn load_str(&self, text: &str) -> Result<StatisticsSnapshot> {
        let entries: Vec<IndexEntry> = serde_json::from_str(text)?;
        let mut snapshot = StatisticsSnapshot::new();
        for entry in entries {
            if let Some(statistics) = self.index_statistics(entry)? {
                if snapshot.get(statistics.index()).is_some() {
                    return Err(Error::Duplicate {
                        kind: "index statistics",
                        name: statistics.index().to_string(),
                    });
                }
                snapshot.insert(statistics);
            }
        }
        Ok(snapshot)
    }

    fn index_statistics(&self, entry: IndexEntry) -> Result<Option<IndexStatistics>> {
        if self.schema.table_by_name(&entry.table).is_none() {
            return Err(Error::UnknownTable(entry.table));
        }
        let Some(index) = self.schema.index_by_name(&entry.table, &entry.index) else {
            if self.ignore_missing_indexes {
                tracing::debug!(
                    table = %entry.table,
                    index = %entry.index,
                    "skipping statistics for missing index"
                );
                return Ok(None);
            }
            return Err(Error::UnknownIndex(format!("{}.{}", entry.table, entry.index)));
        };

        let sampled_count = entry.sampled_count.unwrap_or(entry.row_count);
        let mut statistics = IndexStatistics::new(index.id(), entry.row_count, sampled_count);
        if let Some(timestamp) = entry.timestamp {
            statistics = statistics.with_timestamp(timestamp);
        }

        for histogram in entry.statistics {
            if histogram.columns == 0
                || histogram.first_column + histogram.columns > index.key_column_count()
            {
                return Err(Error::InvalidStatistics(format!(
                    "histogram over columns {}..{} does not fit index {} with {} columns",
                    histogram.first_column,
                    histogram.first_column + histogram.columns,
                    index.name(),
                    index.key_column_count()
                )));
            }
            let buckets = histogram
                .histogram
                .iter()
                .map(|bucket| {
                    if bucket.key.len() != histogram.columns {
                        return Err(Error::InvalidStatistics(format!(
                            "bucket key has {} values, expected {} for index {}",
                            bucket.key.len(),
                            histogram.columns,
                            index.name()
                        )));
                    }
                    Ok(HistogramBucket::new(
                        self.encoder.encode(&bucket.key),
                        bucket.eq,
                        bucket.lt,
                        bucket.distinct,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            statistics = statistics.with_histogram(Histogram::new(
                histogram.first_column,
                histogram.columns,
                buckets,
            )?);
        }
        Ok(Some(statistics))
    }
}
