//! Histogram-based row estimates for a single column.
//!
//! Every function here works on sampled rows; callers divide by the
//! sampled count to get a selectivity.

use std::cmp::Ordering;

use super::KeyBound;
use groupcost_core::{BucketPosition, Histogram, uniform_portion};

/// Sampled rows equal to `key`.
///
/// A boundary key contributes its equal count. A key strictly inside a
/// bucket is assumed to be one of the bucket's distinct values, each
/// holding an equal share of the bucket's rows; a bucket with no interior
/// distinct values matches nothing. A key past the last boundary is
/// assumed to match a single row.
#[must_use]
pub fn equal_rows(histogram: &Histogram, key: &[u8]) -> f64 {
    match histogram.locate(key) {
        BucketPosition::Exact(i) => histogram.buckets()[i].equal_count as f64,
        BucketPosition::Within(i) => {
            let bucket = &histogram.buckets()[i];
            if bucket.distinct_count == 0 {
                0.0
            } else {
                bucket.less_count as f64 / bucket.distinct_count as f64
            }
        }
        BucketPosition::PastEnd => 1.0,
    }
}

/// Returns true if no key can satisfy both bounds: the low bound sorts
/// after the high bound, or they are equal and not both inclusive.
#[must_use]
pub fn is_empty_range(low: Option<&KeyBound>, high: Option<&KeyBound>) -> bool {
    match (low, high) {
        (Some(lo), Some(hi)) => match lo.key.cmp(&hi.key) {
            Ordering::Greater => true,
            Ordering::Equal => !(lo.inclusive && hi.inclusive),
            Ordering::Less => false,
        },
        _ => false,
    }
}

/// Sampled rows inside the range `[low, high]`, honoring inclusivity.
/// A `None` side is unbounded.
///
/// Bounds that fall strictly inside a bucket take the share of the
/// bucket's interior rows given by [`uniform_portion`] between the
/// previous boundary and the bucket's own boundary. An empty range (see
/// [`is_empty_range`]) has no rows.
#[must_use]
pub fn range_rows(histogram: &Histogram, low: Option<&KeyBound>, high: Option<&KeyBound>) -> u64 {
    if is_empty_range(low, high) {
        return 0;
    }

    let mut rows = 0u64;
    let mut before = low.is_some();
    for (i, bucket) in histogram.buckets().iter().enumerate() {
        let start = histogram.previous_key(i);
        let end = bucket.key.as_ref();
        let mut portion_start = 0u64;

        if before {
            if let Some(lo) = low {
                match lo.key.as_ref().cmp(end) {
                    Ordering::Greater => continue,
                    Ordering::Equal => {
                        before = false;
                        if lo.inclusive {
                            rows = rows.saturating_add(bucket.equal_count);
                        }
                        continue;
                    }
                    Ordering::Less => {
                        before = false;
                        portion_start = uniform_portion(start, end, &lo.key, bucket.less_count);
                    }
                }
            }
        }

        if let Some(hi) = high {
            match hi.key.as_ref().cmp(end) {
                Ordering::Equal => {
                    rows = rows.saturating_add(bucket.less_count.saturating_sub(portion_start));
                    if hi.inclusive {
                        rows = rows.saturating_add(bucket.equal_count);
                    }
                    break;
                }
                Ordering::Less => {
                    let portion_end = uniform_portion(start, end, &hi.key, bucket.less_count);
                    rows = rows.saturating_add(portion_end.saturating_sub(portion_start));
                    break;
                }
                Ordering::Greater => {}
            }
        }

        rows = rows.saturating_add(bucket.row_count().saturating_sub(portion_start));
    }
    rows
}
