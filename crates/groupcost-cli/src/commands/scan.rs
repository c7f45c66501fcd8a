//! Index scan estimate command.

use anyhow::{Context, Result};
use groupcost_core::Schema;
use groupcost_engine::{Comparand, IndexScanShape};
use serde::Serialize;

use super::{load_estimator, parse_value};
use crate::output::{self, Format};
use crate::{ModelArgs, OutputFormat};

/// Conditions of the scan as given on the command line.
pub struct ScanRequest {
    pub index: String,
    pub equalities: Vec<String>,
    /// Bound text and whether it is inclusive.
    pub low: Option<(String, bool)>,
    pub high: Option<(String, bool)>,
}

/// Scan estimate.
#[derive(Serialize)]
struct ScanOutput {
    index: String,
    table: String,
    equalities: usize,
    range: bool,
    row_count: f64,
    cost: f64,
}

/// Run the scan command.
pub fn run(args: &ModelArgs, request: &ScanRequest, format: OutputFormat, quiet: bool) -> Result<()> {
    let (schema, estimator) = load_estimator(args)?;
    let index = resolve_index(&schema, &request.index)?;
    let shape = build_shape(request);

    let estimate = estimator.cost_index_scan(index, &shape)?;
    let index_ref = schema.require_index(index)?;
    let result = ScanOutput {
        index: request.index.clone(),
        table: schema.table_name(index_ref.leaf_table()),
        equalities: shape.equalities.len(),
        range: shape.has_range(),
        row_count: estimate.row_count(),
        cost: estimate.cost(),
    };
    let items = [
        ("Index", result.index.clone()),
        ("Table", result.table.clone()),
        ("Equalities", result.equalities.to_string()),
        ("Range", result.range.to_string()),
        ("Rows", output::number(result.row_count)),
        ("Cost", output::number(result.cost)),
    ];
    output::print_report(&result, &items, Format::from(format), quiet)
}

/// Resolves `TABLE.INDEX`, or a bare group index name.
fn resolve_index(schema: &Schema, name: &str) -> Result<groupcost_common::IndexId> {
    let index = match name.split_once('.') {
        Some((table, index)) => schema.index_by_name(table, index),
        None => schema.group_index_by_name(name),
    };
    index
        .map(|i| i.id())
        .with_context(|| format!("unknown index {name}"))
}

fn build_shape(request: &ScanRequest) -> IndexScanShape {
    let mut shape = IndexScanShape::new();
    for value in &request.equalities {
        shape = shape.eq(Comparand::Literal(parse_value(value)));
    }
    if let Some((value, inclusive)) = &request.low {
        shape = shape.low(Comparand::Literal(parse_value(value)), *inclusive);
    }
    if let Some((value, inclusive)) = &request.high {
        shape = shape.high(Comparand::Literal(parse_value(value)), *inclusive);
    }
    shape
}
