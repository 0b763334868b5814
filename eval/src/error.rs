// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error types for the classification core
//!
//! File-level failures are reported through `anyhow` at the I/O boundary;
//! the types here cover the algorithmic failure modes only.

use crate::datasets::Label;
use thiserror::Error;

/// Errors raised while building or training a classifier
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Priors are undefined without at least one training item
    #[error("cannot train on an empty corpus")]
    EmptyTrainingSet,

    #[error("smoothing factor must be positive and finite, got {0}")]
    InvalidSmoothing(f64),
}

/// Errors raised while computing evaluation metrics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// A metric whose denominator is zero for the given batch
    #[error("{metric} is undefined{}: zero denominator", .label.map(|l| format!(" for class '{}'", l)).unwrap_or_default())]
    Degenerate {
        metric: &'static str,
        label: Option<Label>,
    },
}

impl MetricsError {
    pub(crate) fn degenerate(metric: &'static str, label: Option<Label>) -> Self {
        MetricsError::Degenerate { metric, label }
    }
}

/// Errors raised while parsing a trace line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    #[error("expected 5 fields separated by two spaces, found {0}")]
    MalformedLine(usize),

    #[error("unknown class label '{0}'")]
    UnknownLabel(String),

    #[error("invalid score '{0}'")]
    InvalidScore(String),

    #[error("unknown outcome '{0}', expected 'correct' or 'wrong'")]
    UnknownOutcome(String),

    #[error("outcome '{recorded}' contradicts predicted '{predicted}' / actual '{actual}'")]
    InconsistentOutcome {
        predicted: Label,
        actual: Label,
        recorded: String,
    },
}

pub type ClassifierResult<T> = std::result::Result<T, ClassifierError>;
pub type MetricsResult<T> = std::result::Result<T, MetricsError>;
