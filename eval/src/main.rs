// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Fact-checking classifier CLI
//!
//! Trains NB-BOW-OV and NB-BOW-FV on the training corpus, classifies the
//! test corpus with each, and writes trace and eval files.
//!
//! Usage:
//!   factcheck-eval --train datasets/covid_training.tsv --test datasets/covid_test_public.tsv
//!   factcheck-eval --synthetic 1000 --seed 42

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use factcheck_eval::pipeline::{Pipeline, PipelineConfig};
use factcheck_eval::DEFAULT_SMOOTHING;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SummaryFormat {
    Json,
    Markdown,
    Both,
    None,
}

impl SummaryFormat {
    fn json(self) -> bool {
        matches!(self, SummaryFormat::Json | SummaryFormat::Both)
    }

    fn markdown(self) -> bool {
        matches!(self, SummaryFormat::Markdown | SummaryFormat::Both)
    }
}

#[derive(Parser, Debug)]
#[command(name = "factcheck-eval")]
#[command(about = "Train and evaluate Naive Bayes fact-checking classifiers")]
#[command(version)]
struct Args {
    /// Training corpus (tab-separated, with header row)
    #[arg(long, default_value = "datasets/covid_training.tsv")]
    train: PathBuf,

    /// Test corpus (tab-separated, no header row)
    #[arg(long, default_value = "datasets/covid_test_public.tsv")]
    test: PathBuf,

    /// The test corpus has a header row
    #[arg(long)]
    test_has_headers: bool,

    /// Use a generated corpus of this many samples instead of the files
    #[arg(long)]
    synthetic: Option<usize>,

    /// Random seed for the generated corpus
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Additive smoothing for term counts
    #[arg(long, default_value_t = DEFAULT_SMOOTHING)]
    smoothing: f64,

    /// Output directory for trace, eval and summary files
    #[arg(short, long, default_value = "outputs")]
    output: PathBuf,

    /// Summary format
    #[arg(short, long, value_enum, default_value_t = SummaryFormat::None)]
    format: SummaryFormat,

    /// Print both vocabularies
    #[arg(long)]
    show_vocabulary: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    tracing::info!("Fact-Checking Classifier");
    tracing::info!("========================");

    let config = PipelineConfig {
        training_path: args.train.to_string_lossy().to_string(),
        test_path: args.test.to_string_lossy().to_string(),
        train_has_headers: true,
        test_has_headers: args.test_has_headers,
        synthetic: args.synthetic.is_some(),
        synthetic_samples: args.synthetic.unwrap_or(1000),
        seed: args.seed,
        smoothing: args.smoothing,
        output_dir: args.output.to_string_lossy().to_string(),
        include_vocabulary: args.show_vocabulary,
    };

    let mut pipeline = Pipeline::new(config);
    let results = pipeline.run()?;

    if args.show_vocabulary {
        println!("\nVocabularies:");
        for result in &results.models {
            println!("{} ({} terms): {:?}", result.model_name, result.vocabulary_size, result.vocabulary);
        }
    }

    // Print summary to console
    println!("\n{}", "=".repeat(70));
    println!("EVALUATION SUMMARY");
    println!("{}", "=".repeat(70));
    println!("{:<12} {:>8} {:>10} {:>10} {:>10} {:>12}", "Model", "Vocab", "Accuracy", "F1(yes)", "F1(no)", "Time (ms)");
    println!("{:-<70}", "");

    for result in &results.models {
        match result.metrics {
            Some(ref m) => println!(
                "{:<12} {:>8} {:>10.4} {:>10.4} {:>10.4} {:>12.4}",
                result.model_name,
                result.vocabulary_size,
                m.accuracy,
                m.factual.f1_score,
                m.not_factual.f1_score,
                result.elapsed_ms
            ),
            None => println!(
                "{:<12} {:>8} {:>10} {:>10} {:>10} {:>12.4}",
                result.model_name, result.vocabulary_size, "-", "-", "-", result.elapsed_ms
            ),
        }
    }
    println!("{:-<70}", "");
    println!("Best Model: {} (Accuracy={:.4})", results.summary.best_model, results.summary.best_accuracy);

    for result in &results.models {
        if let Some(ref e) = result.metrics_error {
            println!("{}: metrics unavailable ({})", result.model_name, e);
        }
    }

    let timestamp = results.timestamp.format("%Y%m%d_%H%M%S");

    if args.format.json() {
        let json_path = args.output.join(format!("results_{}.json", timestamp));
        Pipeline::save_results(&results, &json_path)?;
        println!("\nJSON results saved to: {}", json_path.display());
    }

    if args.format.markdown() {
        let report = Pipeline::generate_report(&results);
        let md_path = args.output.join(format!("report_{}.md", timestamp));
        std::fs::write(&md_path, report)
            .with_context(|| format!("Failed to write report: {}", md_path.display()))?;
        println!("Markdown report saved to: {}", md_path.display());
    }

    println!("\nTrace and eval files written to: {}", args.output.display());

    Ok(())
}
