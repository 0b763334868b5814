// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Reproducible evaluation pipeline for the fact-checking classifier
//!
//! Orchestrates:
//! - Corpus loading
//! - Output directory cleanup
//! - Training and testing of both model variants (NB-BOW-OV, NB-BOW-FV)
//! - Trace and eval file writing
//! - Metrics computation
//! - Results serialization

use crate::datasets::{Dataset, Label, Sample};
use crate::metrics::MetricsReport;
use crate::naive_bayes::{NaiveBayesClassifier, DEFAULT_SMOOTHING};
use crate::trace::{self, ClassificationRecord};
use crate::vocabulary::{Vocabulary, VocabularyMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Configuration for the evaluation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Training corpus (tab-separated)
    pub training_path: String,
    /// Test corpus (tab-separated)
    pub test_path: String,
    pub train_has_headers: bool,
    pub test_has_headers: bool,
    /// Use a generated corpus instead of the files above
    pub synthetic: bool,
    /// Size of the generated corpus
    pub synthetic_samples: usize,
    /// Random seed for the generated corpus
    pub seed: u64,
    /// Additive smoothing for term counts
    pub smoothing: f64,
    /// Directory receiving trace and eval files
    pub output_dir: String,
    /// Keep the sorted vocabulary of each model in the results
    pub include_vocabulary: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            training_path: "datasets/covid_training.tsv".to_string(),
            test_path: "datasets/covid_test_public.tsv".to_string(),
            train_has_headers: true,
            test_has_headers: false,
            synthetic: false,
            synthetic_samples: 1000,
            seed: 42,
            smoothing: DEFAULT_SMOOTHING,
            output_dir: "outputs".to_string(),
            include_vocabulary: false,
        }
    }
}

/// Results from a single model variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub model_name: String,
    pub vocabulary_mode: VocabularyMode,
    pub vocabulary_size: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vocabulary: Vec<String>,
    pub training_samples: usize,
    pub eval_samples: usize,
    /// `None` when a metric was undefined for this batch
    pub metrics: Option<MetricsReport>,
    pub metrics_error: Option<String>,
    pub elapsed_ms: f64,
    pub trace_file: String,
    pub eval_file: Option<String>,
    pub predictions_sample: Vec<ClassificationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub total_samples: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub label_distribution: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub best_model: String,
    pub best_accuracy: f64,
}

impl PipelineSummary {
    /// Pick the most accurate model; the earlier model wins a tie.
    /// `best_model` is `"None"` only when no model has metrics.
    pub fn from_models(models: &[ModelResult]) -> Self {
        let mut best: Option<(&str, f64)> = None;
        for result in models {
            if let Some(ref metrics) = result.metrics {
                if best.map_or(true, |(_, accuracy)| metrics.accuracy > accuracy) {
                    best = Some((result.model_name.as_str(), metrics.accuracy));
                }
            }
        }

        match best {
            Some((name, accuracy)) => Self {
                best_model: name.to_string(),
                best_accuracy: accuracy,
            },
            None => Self {
                best_model: "None".to_string(),
                best_accuracy: 0.0,
            },
        }
    }
}

/// Complete results of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResults {
    pub config: PipelineConfig,
    pub dataset_info: DatasetInfo,
    pub models: Vec<ModelResult>,
    pub summary: PipelineSummary,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Main evaluation pipeline
pub struct Pipeline {
    config: PipelineConfig,
    dataset: Option<Dataset>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            dataset: None,
        }
    }

    /// Use an already loaded dataset instead of reading the configured files
    pub fn with_dataset(config: PipelineConfig, dataset: Dataset) -> Self {
        Self {
            config,
            dataset: Some(dataset),
        }
    }

    /// Load dataset based on configuration
    pub fn load_dataset(&mut self) -> Result<()> {
        let dataset = if self.config.synthetic {
            tracing::info!(
                "Generating synthetic corpus ({} samples, seed={})",
                self.config.synthetic_samples,
                self.config.seed
            );
            Dataset::load_synthetic(self.config.synthetic_samples, self.config.seed)
        } else {
            tracing::info!(
                "Loading corpus: train={}, test={}",
                self.config.training_path,
                self.config.test_path
            );
            Dataset::load_with_headers(
                Path::new(&self.config.training_path),
                self.config.train_has_headers,
                Path::new(&self.config.test_path),
                self.config.test_has_headers,
            )?
        };

        tracing::info!(
            "Dataset loaded: {} samples (train={}, test={})",
            dataset.total_samples(),
            dataset.train.len(),
            dataset.test.len()
        );

        self.dataset = Some(dataset);
        Ok(())
    }

    /// Remove `*.txt` files left in `output_dir` by a previous run.
    ///
    /// Creates the directory if needed. Files that cannot be removed are
    /// logged and skipped. Returns the number of files removed.
    pub fn clear_outputs(output_dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

        let mut removed = 0;
        let entries = std::fs::read_dir(output_dir)
            .with_context(|| format!("Failed to list output directory: {}", output_dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "txt") {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
            }
        }

        Ok(removed)
    }

    /// Train, test and evaluate a single model variant
    fn evaluate_model(&self, mode: VocabularyMode, train: &[Sample], test: &[Sample]) -> Result<ModelResult> {
        let output_dir = Path::new(&self.config.output_dir);
        let model_name = mode.model_name();
        let start = Instant::now();

        let vocabulary = Vocabulary::build_for(train.iter().map(|s| s.text.as_str()), mode);
        tracing::debug!("{}: vocabulary of {} terms", model_name, vocabulary.len());

        let sorted_vocabulary = if self.config.include_vocabulary {
            vocabulary.sorted().into_iter().map(String::from).collect()
        } else {
            Vec::new()
        };
        let vocabulary_size = vocabulary.len();

        let classifier = NaiveBayesClassifier::with_smoothing(vocabulary, self.config.smoothing)
            .train_samples(train)
            .with_context(|| format!("Failed to train {}", model_name))?;
        let records = classifier.classify_batch(test);

        let trace_file = trace::trace_path(output_dir, model_name);
        trace::write_trace(&trace_file, &records)?;

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!("{}: classified {} items in {:.4} ms", model_name, records.len(), elapsed_ms);

        let (metrics, metrics_error, eval_file) = match MetricsReport::from_records(&records) {
            Ok(report) => {
                let eval_file = trace::eval_path(output_dir, model_name);
                trace::write_eval(&eval_file, &report)?;
                tracing::info!(
                    "  {} - Accuracy: {:.4}, F1(yes): {:.4}, F1(no): {:.4}",
                    model_name,
                    report.accuracy,
                    report.factual.f1_score,
                    report.not_factual.f1_score
                );
                (Some(report), None, Some(eval_file.display().to_string()))
            }
            Err(e) => {
                tracing::warn!("{}: metrics not computed: {}", model_name, e);
                (None, Some(e.to_string()), None)
            }
        };

        Ok(ModelResult {
            model_name: model_name.to_string(),
            vocabulary_mode: mode,
            vocabulary_size,
            vocabulary: sorted_vocabulary,
            training_samples: train.len(),
            eval_samples: test.len(),
            metrics,
            metrics_error,
            elapsed_ms,
            trace_file: trace_file.display().to_string(),
            eval_file,
            predictions_sample: Self::sample_predictions(&records),
        })
    }

    /// First 10 errors and first 10 correct predictions, in input order
    fn sample_predictions(records: &[ClassificationRecord]) -> Vec<ClassificationRecord> {
        let mut samples = Vec::new();
        let mut errors = 0;
        let mut corrects = 0;

        for record in records {
            if record.correct && corrects < 10 {
                corrects += 1;
                samples.push(record.clone());
            } else if !record.correct && errors < 10 {
                errors += 1;
                samples.push(record.clone());
            }
            if errors >= 10 && corrects >= 10 {
                break;
            }
        }

        samples
    }

    /// Run the full evaluation pipeline
    pub fn run(&mut self) -> Result<PipelineResults> {
        if self.dataset.is_none() {
            self.load_dataset()?;
        }
        let dataset = self.dataset.as_ref().context("Dataset not loaded")?;

        let removed = Self::clear_outputs(Path::new(&self.config.output_dir))?;
        if removed > 0 {
            tracing::info!("Removed {} old output files from {}", removed, self.config.output_dir);
        }

        let dataset_info = DatasetInfo {
            name: dataset.name.clone(),
            total_samples: dataset.total_samples(),
            train_samples: dataset.train.len(),
            test_samples: dataset.test.len(),
            label_distribution: Dataset::label_distribution(&dataset.test)
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        };

        let mut models = Vec::new();
        for mode in VocabularyMode::ALL {
            tracing::info!("Evaluating model: {}", mode);
            models.push(self.evaluate_model(mode, &dataset.train, &dataset.test)?);
        }

        let summary = PipelineSummary::from_models(&models);

        Ok(PipelineResults {
            config: self.config.clone(),
            dataset_info,
            models,
            summary,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Save results to JSON file
    pub fn save_results(results: &PipelineResults, output_path: &Path) -> Result<()> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write results: {}", output_path.display()))?;
        tracing::info!("Results saved to {}", output_path.display());
        Ok(())
    }

    /// Generate a markdown report
    pub fn generate_report(results: &PipelineResults) -> String {
        let mut report = String::new();

        report.push_str("# Fact-Checking Classifier Evaluation Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", results.version));

        report.push_str("## Dataset\n\n");
        report.push_str(&format!("- **Name:** {}\n", results.dataset_info.name));
        report.push_str(&format!("- **Total Samples:** {}\n", results.dataset_info.total_samples));
        report.push_str(&format!(
            "- **Split Sizes:** Train={}, Test={}\n",
            results.dataset_info.train_samples, results.dataset_info.test_samples
        ));
        for label in Label::ALL {
            let count = results.dataset_info.label_distribution.get(label.as_str()).copied().unwrap_or(0);
            report.push_str(&format!("- **Test '{}':** {}\n", label, count));
        }
        report.push('\n');

        report.push_str("## Summary\n\n");
        report.push_str(&format!(
            "**Best Model:** {} (Accuracy={:.4})\n\n",
            results.summary.best_model, results.summary.best_accuracy
        ));

        report.push_str("| Model | Vocabulary | Accuracy | P(yes) | P(no) | R(yes) | R(no) | F1(yes) | F1(no) |\n");
        report.push_str("|-------|------------|----------|--------|-------|--------|-------|---------|--------|\n");

        for result in &results.models {
            match result.metrics {
                Some(ref m) => report.push_str(&format!(
                    "| {} | {} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} | {:.4} |\n",
                    result.model_name,
                    result.vocabulary_size,
                    m.accuracy,
                    m.factual.precision,
                    m.not_factual.precision,
                    m.factual.recall,
                    m.not_factual.recall,
                    m.factual.f1_score,
                    m.not_factual.f1_score
                )),
                None => report.push_str(&format!(
                    "| {} | {} | - | - | - | - | - | - | - |\n",
                    result.model_name, result.vocabulary_size
                )),
            }
        }

        report.push_str("\n## Detailed Results\n\n");

        for result in &results.models {
            report.push_str(&format!("### {}\n\n", result.model_name));
            report.push_str(&format!("- Training samples: {}\n", result.training_samples));
            report.push_str(&format!("- Evaluation samples: {}\n", result.eval_samples));
            report.push_str(&format!("- Time: {:.4} ms\n", result.elapsed_ms));
            report.push_str(&format!("- Trace file: `{}`\n\n", result.trace_file));

            match (&result.metrics, &result.metrics_error) {
                (Some(m), _) => report.push_str(&format!("```\n{}\n```\n\n", m.format())),
                (None, Some(e)) => report.push_str(&format!("Metrics unavailable: {}\n\n", e)),
                (None, None) => {}
            }
        }

        report.push_str("## Configuration\n\n");
        report.push_str(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&results.config).unwrap_or_default()
        ));

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ClassMetrics, ConfusionMatrix};

    fn config_for(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            synthetic: true,
            synthetic_samples: 200,
            output_dir: dir.display().to_string(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_pipeline_synthetic() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::new(config_for(dir.path()));

        let results = pipeline.run().expect("Pipeline should succeed");

        assert_eq!(results.models.len(), 2);
        assert_eq!(results.models[0].model_name, "NB-BOW-OV");
        assert_eq!(results.models[1].model_name, "NB-BOW-FV");
        assert!(results.models[1].vocabulary_size <= results.models[0].vocabulary_size);
        assert_eq!(results.dataset_info.test_samples, 40);

        for name in ["NB-BOW-OV", "NB-BOW-FV"] {
            assert!(trace::trace_path(dir.path(), name).exists());
            assert!(trace::eval_path(dir.path(), name).exists());

            let records = trace::read_trace(&trace::trace_path(dir.path(), name)).unwrap();
            assert_eq!(records.len(), 40);
        }

        assert!(results.summary.best_accuracy >= 0.0 && results.summary.best_accuracy <= 1.0);
    }

    #[test]
    fn test_degenerate_metrics_do_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        // Only factual training items: every prediction is factual
        let dataset = Dataset {
            name: "one-sided".to_string(),
            train: vec![
                Sample::new("1", "covid is real", Label::Factual),
                Sample::new("2", "wear a mask", Label::Factual),
            ],
            test: vec![
                Sample::new("3", "covid is fake", Label::NotFactual),
                Sample::new("4", "masks work", Label::Factual),
            ],
        };

        let mut pipeline = Pipeline::with_dataset(config_for(dir.path()), dataset);
        let results = pipeline.run().unwrap();

        for result in &results.models {
            assert!(result.metrics.is_none());
            assert!(result.metrics_error.as_deref().unwrap_or_default().contains("precision"));
            assert!(result.eval_file.is_none());
            assert!(Path::new(&result.trace_file).exists());
        }
        assert_eq!(results.summary.best_model, "None");
    }

    fn model_with_accuracy(name: &str, accuracy: Option<f64>) -> ModelResult {
        let class = ClassMetrics {
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            support: 1,
        };
        ModelResult {
            model_name: name.to_string(),
            vocabulary_mode: VocabularyMode::Original,
            vocabulary_size: 0,
            vocabulary: Vec::new(),
            training_samples: 2,
            eval_samples: 2,
            metrics: accuracy.map(|accuracy| MetricsReport {
                confusion_matrix: ConfusionMatrix::default(),
                accuracy,
                factual: class,
                not_factual: class,
            }),
            metrics_error: None,
            elapsed_ms: 0.0,
            trace_file: format!("trace_{}.txt", name),
            eval_file: None,
            predictions_sample: Vec::new(),
        }
    }

    #[test]
    fn test_best_model_with_zero_accuracy() {
        let models = vec![
            model_with_accuracy("NB-BOW-OV", None),
            model_with_accuracy("NB-BOW-FV", Some(0.0)),
        ];

        let summary = PipelineSummary::from_models(&models);

        assert_eq!(summary.best_model, "NB-BOW-FV");
        assert_eq!(summary.best_accuracy, 0.0);
    }

    #[test]
    fn test_best_model_tie_keeps_first() {
        let models = vec![
            model_with_accuracy("NB-BOW-OV", Some(0.5)),
            model_with_accuracy("NB-BOW-FV", Some(0.5)),
        ];

        assert_eq!(PipelineSummary::from_models(&models).best_model, "NB-BOW-OV");
        assert_eq!(PipelineSummary::from_models(&[]).best_model, "None");
    }

    #[test]
    fn test_clear_outputs_only_removes_text_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("trace_old.txt"), "x").unwrap();
        std::fs::write(dir.path().join("eval_old.txt"), "x").unwrap();
        std::fs::write(dir.path().join("results.json"), "{}").unwrap();

        let removed = Pipeline::clear_outputs(dir.path()).unwrap();

        assert_eq!(removed, 2);
        assert!(dir.path().join("results.json").exists());
        assert!(!dir.path().join("trace_old.txt").exists());
    }

    #[test]
    fn test_clear_outputs_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("outputs");

        assert_eq!(Pipeline::clear_outputs(&nested).unwrap(), 0);
        assert!(nested.is_dir());
    }

    #[test]
    fn test_generate_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::new(config_for(dir.path()));
        let results = pipeline.run().expect("Pipeline should succeed");

        let report = Pipeline::generate_report(&results);

        assert!(report.contains("Fact-Checking Classifier Evaluation Report"));
        assert!(report.contains("NB-BOW-OV"));
        assert!(report.contains("Best Model"));

        let json_path = dir.path().join("results").join("eval.json");
        Pipeline::save_results(&results, &json_path).unwrap();
        let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(saved["models"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_missing_corpus_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            training_path: dir.path().join("missing.tsv").display().to_string(),
            output_dir: dir.path().display().to_string(),
            ..PipelineConfig::default()
        };

        assert!(Pipeline::new(config).run().is_err());
    }
}
