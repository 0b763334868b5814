// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Standalone trace evaluator
//!
//! Recomputes the metrics of an existing trace file, e.g. one produced by
//! an earlier `factcheck-eval` run.

use anyhow::Result;
use clap::Parser;
use factcheck_eval::metrics::MetricsReport;
use factcheck_eval::trace;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "evaluate-trace")]
#[command(about = "Compute evaluation metrics from a trace file")]
#[command(version)]
struct Args {
    /// Trace file to evaluate
    trace: PathBuf,

    /// Also write the four-line eval file here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let records = trace::read_trace(&args.trace)?;
    tracing::info!("Read {} records from {}", records.len(), args.trace.display());

    let report = MetricsReport::from_records(&records)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.format());
    }

    if let Some(ref path) = args.output {
        trace::write_eval(path, &report)?;
        println!("Eval file saved to: {}", path.display());
    }

    Ok(())
}
