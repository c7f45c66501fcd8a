//! Row count and cost pairs.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Estimated output rows and abstract cost of an operation.
///
/// Both values are always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEstimate {
    row_count: f64,
    cost: f64,
}

impl CostEstimate {
    /// Creates an estimate. Non-finite or negative inputs become 0.
    #[must_use]
    pub fn new(row_count: f64, cost: f64) -> Self {
        Self {
            row_count: sanitize(row_count),
            cost: sanitize(cost),
        }
    }

    /// No rows, no cost.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            row_count: 0.0,
            cost: 0.0,
        }
    }

    /// Estimated output rows.
    #[must_use]
    pub fn row_count(&self) -> f64 {
        self.row_count
    }

    /// Estimated cost.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Combines with work done once per row of `self`: rows multiply and
    /// the inner cost is paid once per outer row.
    #[must_use]
    pub fn nest(self, inner: CostEstimate) -> CostEstimate {
        CostEstimate::new(
            self.row_count * inner.row_count,
            self.cost + self.row_count * inner.cost,
        )
    }

    /// Combines with an operation consuming this one's output: costs add
    /// and the row count is the consumer's.
    #[must_use]
    pub fn sequence(self, next: CostEstimate) -> CostEstimate {
        CostEstimate::new(next.row_count, self.cost + next.cost)
    }

    /// Orders by cost, then by row count.
    #[must_use]
    pub fn compare(&self, other: &CostEstimate) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.row_count.total_cmp(&other.row_count))
    }
}

impl Default for CostEstimate {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rows = {:.0}, cost = {:.4}", self.row_count, self.cost)
    }
}

fn sanitize(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 { x } else { 0.0 }
}
