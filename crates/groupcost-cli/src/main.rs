//! groupcost CLI - diagnostic tool for groupcost estimates.
//!
//! Loads a schema and a statistics document and prints the estimates the
//! planner would see: byte-key interpolation, index scan sizes and costs,
//! and flatten costs.

mod commands;
mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// groupcost estimate inspection tool.
#[derive(Parser)]
#[command(name = "groupcost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Suppress output and info messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Output format options.
#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Inputs shared by the estimating commands.
#[derive(Args)]
struct ModelArgs {
    /// Schema document (JSON)
    #[arg(long)]
    schema: PathBuf,

    /// Statistics document (JSON)
    #[arg(long)]
    stats: PathBuf,

    /// Estimator configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Live table row counts (JSON object of table name to count)
    #[arg(long)]
    counts: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Interpolate the position of a key between two bounds
    Portion {
        /// Lower bound key
        low: String,
        /// Upper bound key
        high: String,
        /// Key to place between the bounds
        target: String,
        /// Rows between the bounds
        total: u64,
        /// Read the keys as hex bytes instead of text
        #[arg(long)]
        hex: bool,
    },

    /// Estimate rows and cost of an index scan
    Scan {
        #[command(flatten)]
        model: ModelArgs,

        /// Index as TABLE.INDEX, or the name of a group index
        #[arg(long)]
        index: String,

        /// Equality on the next index column (JSON literal or text)
        #[arg(long = "eq")]
        equalities: Vec<String>,

        /// Lower bound of the range column
        #[arg(long)]
        low: Option<String>,

        /// Exclude rows equal to the lower bound
        #[arg(long, requires = "low")]
        low_exclusive: bool,

        /// Upper bound of the range column
        #[arg(long)]
        high: Option<String>,

        /// Exclude rows equal to the upper bound
        #[arg(long, requires = "high")]
        high_exclusive: bool,
    },

    /// Estimate the cost of flattening a table group from an index table
    Flatten {
        #[command(flatten)]
        model: ModelArgs,

        /// Table of the scanned index
        #[arg(long)]
        index_table: String,

        /// Tables needed in the output
        #[arg(long, value_delimiter = ',', required = true)]
        require: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else if !cli.quiet {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Commands::Portion {
            low,
            high,
            target,
            total,
            hex,
        } => commands::portion::run(&low, &high, &target, total, hex, cli.format, cli.quiet),
        Commands::Scan {
            model,
            index,
            equalities,
            low,
            high,
            low_exclusive,
            high_exclusive,
        } => {
            let request = commands::scan::ScanRequest {
                index,
                equalities,
                low: low.map(|v| (v, !low_exclusive)),
                high: high.map(|v| (v, !high_exclusive)),
            };
            commands::scan::run(&model, &request, cli.format, cli.quiet)
        }
        Commands::Flatten {
            model,
            index_table,
            require,
        } => commands::flatten::run(&model, &index_table, &require, cli.format, cli.quiet),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
