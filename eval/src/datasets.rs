// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Corpus loading for the fact-checking classifier
//!
//! Corpora are tab-separated files with the columns `id`, `text`, `label`
//! followed by any number of extra columns. Labels are `yes` (factual) or
//! `no` (not factual). Files are Windows-1252 encoded.

use crate::error::TraceError;
use anyhow::{Context, Result};
use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Binary label for fact-checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Content identified as factual
    #[serde(rename = "yes")]
    Factual,
    /// Content identified as not factual
    #[serde(rename = "no")]
    NotFactual,
}

impl Label {
    /// Both classes, factual first
    pub const ALL: [Label; 2] = [Label::Factual, Label::NotFactual];

    /// Corpus / trace representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Factual => "yes",
            Label::NotFactual => "no",
        }
    }

    /// Map a corpus label column to a class.
    ///
    /// Only `yes` (any case) is factual; every other value counts as not
    /// factual, the way the training files have always been read.
    pub fn from_corpus(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("yes") {
            Label::Factual
        } else {
            Label::NotFactual
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = TraceError;

    /// Strict parse, used where an unknown label means a corrupted file
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(Label::Factual),
            "no" => Ok(Label::NotFactual),
            _ => Err(TraceError::UnknownLabel(s.to_string())),
        }
    }
}

/// A single labeled item from a corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unique identifier (tweet id)
    pub id: String,
    /// Raw text content
    pub text: String,
    /// Ground truth label
    pub label: Label,
}

impl Sample {
    pub fn new(id: impl Into<String>, text: impl Into<String>, label: Label) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            label,
        }
    }
}

/// A training corpus and a test corpus
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub train: Vec<Sample>,
    pub test: Vec<Sample>,
}

impl Dataset {
    /// Load the training file (with header row) and the test file (without)
    pub fn load(train_path: &Path, test_path: &Path) -> Result<Self> {
        Self::load_with_headers(train_path, true, test_path, false)
    }

    /// Load both splits, stating explicitly which files carry a header row
    pub fn load_with_headers(
        train_path: &Path,
        train_has_headers: bool,
        test_path: &Path,
        test_has_headers: bool,
    ) -> Result<Self> {
        let train = Self::load_split(train_path, train_has_headers)?;
        let test = Self::load_split(test_path, test_has_headers)?;

        let name = train_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "corpus".to_string());

        Ok(Self { name, train, test })
    }

    /// Load one tab-separated split
    pub fn load_split(path: &Path, has_headers: bool) -> Result<Vec<Sample>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open corpus file: {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(file);

        let mut samples = Vec::new();

        // Byte records: fields are decoded as Windows-1252, not UTF-8
        for (idx, result) in reader.byte_records().enumerate() {
            let record = result
                .with_context(|| format!("Failed to read record {} in {}", idx, path.display()))?;

            if record.len() < 3 {
                tracing::warn!(
                    "Skipping malformed record {} in {}: {} fields",
                    idx,
                    path.display(),
                    record.len()
                );
                continue;
            }

            let field = |i: usize| decode_field(&record[i]);

            samples.push(Sample {
                id: field(0),
                text: field(1),
                label: Label::from_corpus(&field(2)),
            });
        }

        tracing::debug!("Loaded {} samples from {}", samples.len(), path.display());

        Ok(samples)
    }

    /// Generate a deterministic corpus for smoke runs without data files
    pub fn load_synthetic(size: usize, seed: u64) -> Self {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let factual_phrases = [
            "Health officials report new covid cases in the region",
            "The vaccine trial results were published by the ministry",
            "Hospitals confirm covid patients are being treated",
            "The government announced new testing sites today",
            "Official data shows the infection rate is declining",
        ];

        let not_factual_phrases = [
            "Drinking hot water cures covid in one day",
            "5G towers spread the virus to everyone nearby",
            "The virus is a hoax made up by the media",
            "Garlic protects you from covid infection forever",
            "Masks make you sick and the government knows it",
        ];

        let mut samples: Vec<Sample> = (0..size)
            .map(|i| {
                let is_factual = rng.gen_bool(0.5);
                let phrases = if is_factual { &factual_phrases } else { &not_factual_phrases };
                let phrase_idx = rng.gen_range(0..phrases.len());

                Sample {
                    id: format!("{}", 1_000_000 + i),
                    text: format!("{} #covid19 update {}", phrases[phrase_idx], i % 7),
                    label: if is_factual { Label::Factual } else { Label::NotFactual },
                }
            })
            .collect();

        // Split 80/20
        let train_end = (samples.len() as f64 * 0.8) as usize;
        let test = samples.split_off(train_end);

        Self {
            name: "synthetic".to_string(),
            train: samples,
            test,
        }
    }

    /// Get total number of samples across both splits
    pub fn total_samples(&self) -> usize {
        self.train.len() + self.test.len()
    }

    /// Get label distribution for a split
    pub fn label_distribution(samples: &[Sample]) -> HashMap<Label, usize> {
        let mut dist = HashMap::new();
        for sample in samples {
            *dist.entry(sample.label).or_insert(0) += 1;
        }
        dist
    }
}

/// Windows-1252 maps every byte to a distinct character, so distinct
/// byte sequences never collapse into the same token
fn decode_field(bytes: &[u8]) -> String {
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}
