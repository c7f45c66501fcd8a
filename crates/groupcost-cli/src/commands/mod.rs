//! CLI command implementations.

pub mod flatten;
pub mod portion;
pub mod scan;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use groupcost_common::Value;
use groupcost_core::{RowCounts, Schema, SchemaDefinition, StatisticsLoader};
use groupcost_engine::{CostEstimator, EstimatorConfig};
use tracing::info;

use crate::ModelArgs;

/// Loads the schema, statistics, configuration and row counts named on
/// the command line into an estimator.
pub fn load_estimator(args: &ModelArgs) -> Result<(Arc<Schema>, CostEstimator)> {
    let schema = SchemaDefinition::from_path(&args.schema)
        .and_then(|definition| definition.build())
        .with_context(|| format!("loading schema {}", args.schema.display()))?;
    let schema = Arc::new(schema);

    let statistics = StatisticsLoader::new(&schema)
        .load_path(&args.stats)
        .with_context(|| format!("loading statistics {}", args.stats.display()))?;
    let statistics = Arc::new(statistics);

    let config = match &args.config {
        Some(path) => EstimatorConfig::from_path(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => EstimatorConfig::default(),
    };

    let mut row_counts = RowCounts::from_statistics(&schema, statistics.as_ref());
    if let Some(path) = &args.counts {
        for (table, rows) in read_counts(path)? {
            let id = schema
                .table_by_name(&table)
                .map(|t| t.id())
                .with_context(|| format!("row counts name unknown table {table}"))?;
            row_counts.set(id, rows);
        }
    }

    info!(
        tables = schema.tables().len(),
        indexes = schema.indexes().len(),
        analyzed = statistics.len(),
        "estimator loaded"
    );
    let estimator = CostEstimator::new(
        Arc::clone(&schema),
        statistics,
        Arc::new(row_counts),
        config,
    );
    Ok((schema, estimator))
}

fn read_counts(path: &Path) -> Result<BTreeMap<String, u64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading row counts {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing row counts {}", path.display()))
}

/// Parses a command-line value as a JSON literal, falling back to text.
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
