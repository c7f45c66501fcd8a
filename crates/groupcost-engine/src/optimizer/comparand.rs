//! Predicate operands and index scan shapes.

use bytes::Bytes;
use groupcost_common::Value;
use groupcost_core::KeyEncoder;
use smallvec::SmallVec;

/// The right-hand side of a column comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparand {
    /// A constant.
    Literal(Value),
    /// A query parameter, with its value if already bound.
    Parameter(Option<Value>),
    /// One column of a VALUES list; estimated as the average over its rows.
    Values(Vec<Value>),
    /// An expression whose value is only known at run time.
    Expression(String),
}

impl Comparand {
    /// A literal comparand.
    pub fn literal(value: impl Into<Value>) -> Self {
        Comparand::Literal(value.into())
    }

    /// The constant value, if known at estimation time.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Comparand::Literal(v) | Comparand::Parameter(Some(v)) => Some(v),
            _ => None,
        }
    }

    /// Returns true if the value is unknown at estimation time.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Comparand::Parameter(None) | Comparand::Expression(_))
    }

    /// Encodes the constant value as a single-column key.
    #[must_use]
    pub fn encode(&self, encoder: &KeyEncoder) -> Option<Bytes> {
        self.value().map(|v| encoder.encode_value(v))
    }
}

impl From<Value> for Comparand {
    fn from(value: Value) -> Self {
        Comparand::Literal(value)
    }
}

/// One side of a range condition.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    /// The bounding value.
    pub comparand: Comparand,
    /// Whether rows equal to the bound match.
    pub inclusive: bool,
}

impl RangeBound {
    /// An inclusive bound.
    pub fn inclusive(comparand: impl Into<Comparand>) -> Self {
        Self {
            comparand: comparand.into(),
            inclusive: true,
        }
    }

    /// An exclusive bound.
    pub fn exclusive(comparand: impl Into<Comparand>) -> Self {
        Self {
            comparand: comparand.into(),
            inclusive: false,
        }
    }

    /// Encodes a constant bound; variable bounds encode to `None`, which
    /// leaves that side unrestricted.
    #[must_use]
    pub fn encode(&self, encoder: &KeyEncoder) -> Option<KeyBound> {
        self.comparand.encode(encoder).map(|key| KeyBound {
            key,
            inclusive: self.inclusive,
        })
    }
}

/// An encoded range bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBound {
    /// Encoded key.
    pub key: Bytes,
    /// Whether keys equal to `key` are inside the range.
    pub inclusive: bool,
}

impl KeyBound {
    /// Creates a bound.
    pub fn new(key: impl Into<Bytes>, inclusive: bool) -> Self {
        Self {
            key: key.into(),
            inclusive,
        }
    }
}

/// Conditions an index scan applies: equalities on the leading key
/// columns, then an optional range on the next column. Later columns are
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexScanShape {
    /// One comparand per leading index column.
    pub equalities: SmallVec<[Comparand; 4]>,
    /// Lower bound of the range column.
    pub low: Option<RangeBound>,
    /// Upper bound of the range column.
    pub high: Option<RangeBound>,
}

impl IndexScanShape {
    /// A scan with no conditions, used only for its ordering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality on the next index column.
    pub fn eq(mut self, comparand: impl Into<Comparand>) -> Self {
        self.equalities.push(comparand.into());
        self
    }

    /// Sets the lower bound of the range column.
    pub fn low(mut self, comparand: impl Into<Comparand>, inclusive: bool) -> Self {
        self.low = Some(RangeBound {
            comparand: comparand.into(),
            inclusive,
        });
        self
    }

    /// Sets the upper bound of the range column.
    pub fn high(mut self, comparand: impl Into<Comparand>, inclusive: bool) -> Self {
        self.high = Some(RangeBound {
            comparand: comparand.into(),
            inclusive,
        });
        self
    }

    /// Returns true if the shape has a range column.
    #[must_use]
    pub fn has_range(&self) -> bool {
        self.low.is_some() || self.high.is_some()
    }

    /// Returns true if the scan applies no conditions.
    #[must_use]
    pub fn is_ordering_only(&self) -> bool {
        self.equalities.is_empty() && !self.has_range()
    }

    /// Index columns the shape constrains.
    #[must_use]
    pub fn constrained_columns(&self) -> usize {
        self.equalities.len() + usize::from(self.has_range())
    }
}

/// A comparison on one column, as seen by a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnCondition {
    /// `column = x`
    Eq(Comparand),
    /// `column <> x`
    Ne(Comparand),
    /// `column < x`
    Lt(Comparand),
    /// `column <= x`
    Le(Comparand),
    /// `column > x`
    Gt(Comparand),
    /// `column >= x`
    Ge(Comparand),
    /// `column IN (x, y, ...)`
    In(Vec<Comparand>),
}

/// Conjunction of conditions on columns of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnConditions {
    conditions: Vec<(String, ColumnCondition)>,
}

impl ColumnConditions {
    /// An empty conjunction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition on `column`.
    pub fn with(mut self, column: &str, condition: ColumnCondition) -> Self {
        self.conditions.push((column.to_string(), condition));
        self
    }

    /// Returns true if there are no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Distinct columns in first-mention order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        let mut seen: SmallVec<[&str; 8]> = SmallVec::new();
        for (column, _) in &self.conditions {
            if !seen.contains(&column.as_str()) {
                seen.push(column);
            }
        }
        seen.into_iter()
    }

    /// Conditions on `column`.
    pub fn on<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a ColumnCondition> {
        self.conditions
            .iter()
            .filter(move |(c, _)| c == column)
            .map(|(_, condition)| condition)
    }
}
