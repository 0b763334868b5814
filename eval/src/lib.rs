// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Bag-of-words Naive Bayes fact-checking classifier
//!
//! This crate provides:
//! - Corpus loading (tab-separated, `yes`/`no` labels) and a synthetic corpus
//! - Vocabulary construction, with optional removal of single-occurrence terms
//! - A smoothed Naive Bayes model scored in base-10 log space
//! - Evaluation metrics (Accuracy, per-class Precision, Recall, F1)
//! - Trace and eval file formats
//! - An evaluation pipeline running the NB-BOW-OV and NB-BOW-FV variants

pub mod datasets;
pub mod error;
pub mod metrics;
pub mod naive_bayes;
pub mod pipeline;
pub mod trace;
pub mod vocabulary;

pub use datasets::{Dataset, Label, Sample};
pub use error::{ClassifierError, MetricsError, TraceError};
pub use metrics::{ClassMetrics, ConfusionMatrix, MetricsReport};
pub use naive_bayes::{NaiveBayesClassifier, TrainedClassifier, DEFAULT_SMOOTHING};
pub use pipeline::{Pipeline, PipelineConfig, PipelineResults};
pub use trace::ClassificationRecord;
pub use vocabulary::{tokenize, Vocabulary, VocabularyMode};
