// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Per-item classification records and the plain-text output files
//!
//! Trace file, one line per test item, fields separated by two spaces:
//!
//! ```text
//! 1241490299215634434  no  -2.718540e+01  yes  wrong
//! ```
//!
//! Eval file: accuracy, then precision, recall and F1 pairs (factual first),
//! four decimals each.

use crate::datasets::Label;
use crate::error::TraceError;
use crate::metrics::MetricsReport;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const FIELD_SEPARATOR: &str = "  ";

/// Outcome of classifying one test item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub id: String,
    pub predicted: Label,
    /// Log score of the predicted class
    pub score: f64,
    pub actual: Label,
    pub correct: bool,
}

impl ClassificationRecord {
    pub fn new(id: impl Into<String>, predicted: Label, score: f64, actual: Label) -> Self {
        Self {
            id: id.into(),
            predicted,
            score,
            actual,
            correct: predicted == actual,
        }
    }
}

/// Format like C's `%e`: six fractional digits and a signed, two-digit exponent
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.6e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

impl fmt::Display for ClassificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{id}{sep}{predicted}{sep}{score}{sep}{actual}{sep}{outcome}",
            id = self.id,
            predicted = self.predicted,
            score = format_scientific(self.score),
            actual = self.actual,
            outcome = if self.correct { "correct" } else { "wrong" },
            sep = FIELD_SEPARATOR,
        )
    }
}

impl FromStr for ClassificationRecord {
    type Err = TraceError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != 5 {
            return Err(TraceError::MalformedLine(fields.len()));
        }

        let predicted: Label = fields[1].parse()?;
        let score: f64 = fields[2]
            .parse()
            .map_err(|_| TraceError::InvalidScore(fields[2].to_string()))?;
        let actual: Label = fields[3].parse()?;
        let correct = match fields[4] {
            "correct" => true,
            "wrong" => false,
            other => return Err(TraceError::UnknownOutcome(other.to_string())),
        };

        if correct != (predicted == actual) {
            return Err(TraceError::InconsistentOutcome {
                predicted,
                actual,
                recorded: fields[4].to_string(),
            });
        }

        Ok(Self {
            id: fields[0].to_string(),
            predicted,
            score,
            actual,
            correct,
        })
    }
}

/// `<dir>/trace_<model>.txt`
pub fn trace_path(output_dir: &Path, model_name: &str) -> PathBuf {
    output_dir.join(format!("trace_{}.txt", model_name))
}

/// `<dir>/eval_<model>.txt`
pub fn eval_path(output_dir: &Path, model_name: &str) -> PathBuf {
    output_dir.join(format!("eval_{}.txt", model_name))
}

/// Write one trace line per record, replacing any existing file
pub fn write_trace(path: &Path, records: &[ClassificationRecord]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create trace file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        writeln!(writer, "{}", record)
            .with_context(|| format!("Failed to write trace file: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush trace file: {}", path.display()))?;

    tracing::debug!("Wrote {} trace lines to {}", records.len(), path.display());
    Ok(())
}

/// Read a trace file back; reading stops at the first blank line
pub fn read_trace(path: &Path) -> Result<Vec<ClassificationRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open trace file: {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {} in {}", idx + 1, path.display()))?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }

        let record = line
            .parse::<ClassificationRecord>()
            .with_context(|| format!("Malformed trace line {} in {}", idx + 1, path.display()))?;
        records.push(record);
    }

    Ok(records)
}

/// Write the four-line evaluation summary
pub fn write_eval(path: &Path, report: &MetricsReport) -> Result<()> {
    std::fs::write(path, report.eval_file_contents())
        .with_context(|| format!("Failed to write eval file: {}", path.display()))?;
    Ok(())
}
