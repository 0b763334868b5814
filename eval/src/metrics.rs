// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation metrics for the binary fact-checking task
//!
//! Implements:
//! - Confusion matrix (factual is the positive class)
//! - Accuracy
//! - Per-class precision, recall and F-beta (F1 by default)
//!
//! A metric whose denominator is zero is reported as
//! [`MetricsError::Degenerate`]; no value is substituted.

use crate::datasets::Label;
use crate::error::{MetricsError, MetricsResult};
use crate::trace::ClassificationRecord;
use serde::{Deserialize, Serialize};

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Factual predicted as factual
    pub tp: usize,
    /// Not factual predicted as not factual
    pub tn: usize,
    /// Not factual predicted as factual
    pub fp: usize,
    /// Factual predicted as not factual
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Tally predicted/actual pairs of a batch of records
    pub fn from_records(records: &[ClassificationRecord]) -> Self {
        let mut matrix = Self::default();
        for record in records {
            matrix.add(record.predicted, record.actual);
        }
        matrix
    }

    fn add(&mut self, predicted: Label, actual: Label) {
        match (predicted, actual) {
            (Label::Factual, Label::Factual) => self.tp += 1,
            (Label::NotFactual, Label::NotFactual) => self.tn += 1,
            (Label::Factual, Label::NotFactual) => self.fp += 1,
            (Label::NotFactual, Label::Factual) => self.fn_ += 1,
        }
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Number of correct predictions
    pub fn correct(&self) -> usize {
        self.tp + self.tn
    }

    /// Items correctly predicted as `label`
    pub fn true_positives(&self, label: Label) -> usize {
        match label {
            Label::Factual => self.tp,
            Label::NotFactual => self.tn,
        }
    }

    /// Items predicted as `label`
    pub fn predicted(&self, label: Label) -> usize {
        match label {
            Label::Factual => self.tp + self.fp,
            Label::NotFactual => self.tn + self.fn_,
        }
    }

    /// Items whose ground truth is `label`
    pub fn support(&self, label: Label) -> usize {
        match label {
            Label::Factual => self.tp + self.fn_,
            Label::NotFactual => self.tn + self.fp,
        }
    }

    /// Accuracy: (TP + TN) / Total
    pub fn accuracy(&self) -> MetricsResult<f64> {
        ratio(self.correct(), self.total())
            .ok_or_else(|| MetricsError::degenerate("accuracy", None))
    }

    /// Precision: correctly predicted as `label` / predicted as `label`
    pub fn precision(&self, label: Label) -> MetricsResult<f64> {
        ratio(self.true_positives(label), self.predicted(label))
            .ok_or_else(|| MetricsError::degenerate("precision", Some(label)))
    }

    /// Recall: correctly predicted as `label` / actually `label`
    pub fn recall(&self, label: Label) -> MetricsResult<f64> {
        ratio(self.true_positives(label), self.support(label))
            .ok_or_else(|| MetricsError::degenerate("recall", Some(label)))
    }

    /// F-beta Score: (1 + beta^2) * (Precision * Recall) / (beta^2 * Precision + Recall)
    ///
    /// `beta > 1` weighs recall higher, `beta < 1` weighs precision higher.
    pub fn f_beta_score(&self, label: Label, beta: f64) -> MetricsResult<f64> {
        let precision = self.precision(label)?;
        let recall = self.recall(label)?;
        let beta_sq = beta * beta;
        let denom = beta_sq * precision + recall;
        if denom == 0.0 {
            return Err(MetricsError::degenerate("f-score", Some(label)));
        }
        Ok((1.0 + beta_sq) * precision * recall / denom)
    }

    /// F1 Score: harmonic mean of precision and recall
    pub fn f1_score(&self, label: Label) -> MetricsResult<f64> {
        self.f_beta_score(label, 1.0)
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64)
}

/// Metrics for a single class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_confusion_matrix(cm: &ConfusionMatrix, label: Label) -> MetricsResult<Self> {
        Ok(Self {
            precision: cm.precision(label)?,
            recall: cm.recall(label)?,
            f1_score: cm.f1_score(label)?,
            support: cm.support(label),
        })
    }
}

/// Full report for one model over one batch of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub factual: ClassMetrics,
    pub not_factual: ClassMetrics,
}

impl MetricsReport {
    /// Generate full report from confusion matrix
    pub fn from_confusion_matrix(cm: ConfusionMatrix) -> MetricsResult<Self> {
        Ok(Self {
            accuracy: cm.accuracy()?,
            factual: ClassMetrics::from_confusion_matrix(&cm, Label::Factual)?,
            not_factual: ClassMetrics::from_confusion_matrix(&cm, Label::NotFactual)?,
            confusion_matrix: cm,
        })
    }

    /// Generate report from a complete batch of classification records
    pub fn from_records(records: &[ClassificationRecord]) -> MetricsResult<Self> {
        Self::from_confusion_matrix(ConfusionMatrix::from_records(records))
    }

    pub fn class(&self, label: Label) -> &ClassMetrics {
        match label {
            Label::Factual => &self.factual,
            Label::NotFactual => &self.not_factual,
        }
    }

    /// Contents of the eval file: accuracy, then precision, recall and F1
    /// pairs with the factual class first
    pub fn eval_file_contents(&self) -> String {
        let (f, n) = (&self.factual, &self.not_factual);
        format!(
            "{:.4}\n{:.4}  {:.4}\n{:.4}  {:.4}\n{:.4}  {:.4}\n",
            self.accuracy, f.precision, n.precision, f.recall, n.recall, f.f1_score, n.f1_score
        )
    }

    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let cm = &self.confusion_matrix;
        format!(
            r#"Classification Report
=====================
Accuracy:  {:.4} ({:.2}%)
Support:   {}

Class        Precision    Recall        F1   Support
factual      {:>9.4} {:>9.4} {:>9.4} {:>9}
not factual  {:>9.4} {:>9.4} {:>9.4} {:>9}

Confusion Matrix:
                      Predicted
                      Factual   Not factual
Actual Factual       {:>6}    {:>6}
       Not factual   {:>6}    {:>6}
"#,
            self.accuracy, self.accuracy * 100.0,
            cm.total(),
            self.factual.precision, self.factual.recall, self.factual.f1_score, self.factual.support,
            self.not_factual.precision, self.not_factual.recall, self.not_factual.f1_score, self.not_factual.support,
            cm.tp, cm.fn_,
            cm.fp, cm.tn,
        )
    }
}
