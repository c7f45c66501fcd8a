//! Flatten estimate command.

use anyhow::{Context, Result};
use groupcost_common::TableId;
use groupcost_core::Schema;
use groupcost_engine::TableGroupJoinTree;
use serde::Serialize;

use super::load_estimator;
use crate::output::{self, Format};
use crate::{ModelArgs, OutputFormat};

/// Flatten estimate per index row.
#[derive(Serialize)]
struct FlattenOutput {
    index_table: String,
    required: Vec<String>,
    tree: Vec<String>,
    row_count: f64,
    cost: f64,
}

/// Run the flatten command.
pub fn run(
    args: &ModelArgs,
    index_table: &str,
    require: &[String],
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let (schema, estimator) = load_estimator(args)?;
    let start = table_id(&schema, index_table)?;
    let required = require
        .iter()
        .map(|name| table_id(&schema, name.trim()))
        .collect::<Result<Vec<_>>>()?;

    let mut members = required.clone();
    members.push(start);
    let tree = TableGroupJoinTree::for_tables(&schema, &members)?;
    let estimate = estimator.cost_flatten(&tree, start, &required)?;

    let result = FlattenOutput {
        index_table: index_table.to_string(),
        required: required.iter().map(|t| schema.table_name(*t)).collect(),
        tree: tree.iter().into_iter().map(|n| schema.table_name(tree.table(n))).collect(),
        row_count: estimate.row_count(),
        cost: estimate.cost(),
    };
    let items = [
        ("Index Table", result.index_table.clone()),
        ("Required", result.required.join(", ")),
        ("Join Tree", result.tree.join(", ")),
        ("Rows per Index Row", output::number(result.row_count)),
        ("Cost per Index Row", output::number(result.cost)),
    ];
    output::print_report(&result, &items, Format::from(format), quiet)
}

fn table_id(schema: &Schema, name: &str) -> Result<TableId> {
    schema
        .table_by_name(name)
        .map(|t| t.id())
        .with_context(|| format!("unknown table {name}"))
}
