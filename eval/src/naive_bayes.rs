// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Bag-of-words Naive Bayes classifier
//!
//! Training is a one-way transition: an untrained [`NaiveBayesClassifier`]
//! is consumed by [`NaiveBayesClassifier::train`] and yields an immutable
//! [`TrainedClassifier`]. To retrain, build a fresh classifier.
//!
//! Scores are base-10 log probabilities:
//!
//! ```text
//! score(text, c) = log10 P(c) + sum over in-vocabulary tokens t of log10 P(t | c)
//! P(t | c)       = count(t, c) / (items(c) + |V| * smoothing)
//! ```
//!
//! where `count(t, c)` starts at the smoothing factor for every term.

use crate::datasets::{Label, Sample};
use crate::error::{ClassifierError, ClassifierResult};
use crate::trace::ClassificationRecord;
use crate::vocabulary::{tokenize, Vocabulary};
use rayon::prelude::*;
use std::collections::HashMap;

/// Additive smoothing applied to every term count
pub const DEFAULT_SMOOTHING: f64 = 0.01;

fn slot(label: Label) -> usize {
    match label {
        Label::Factual => 0,
        Label::NotFactual => 1,
    }
}

/// A classifier that has not seen any training data yet
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    vocabulary: Vocabulary,
    smoothing: f64,
    /// Term counts per class, seeded at `smoothing`
    term_counts: [HashMap<String, f64>; 2],
}

impl NaiveBayesClassifier {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self::with_smoothing(vocabulary, DEFAULT_SMOOTHING)
    }

    pub fn with_smoothing(vocabulary: Vocabulary, smoothing: f64) -> Self {
        let seeded: HashMap<String, f64> = vocabulary
            .iter()
            .map(|term| (term.to_string(), smoothing))
            .collect();

        Self {
            vocabulary,
            smoothing,
            term_counts: [seeded.clone(), seeded],
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Current count of `term` in the table for `label`, if it is a vocabulary term
    pub fn term_frequency(&self, label: Label, term: &str) -> Option<f64> {
        self.term_counts[slot(label)].get(term).copied()
    }

    /// Train on `(text, label)` pairs in a single pass
    pub fn train<I, S>(mut self, corpus: I) -> ClassifierResult<TrainedClassifier>
    where
        I: IntoIterator<Item = (S, Label)>,
        S: AsRef<str>,
    {
        if !self.smoothing.is_finite() || self.smoothing <= 0.0 {
            return Err(ClassifierError::InvalidSmoothing(self.smoothing));
        }

        let mut class_counts = [0usize; 2];

        for (text, label) in corpus {
            let i = slot(label);
            class_counts[i] += 1;

            let counts = &mut self.term_counts[i];
            for token in tokenize(text.as_ref()) {
                // Out-of-vocabulary tokens are not features
                if let Some(count) = counts.get_mut(&token) {
                    *count += 1.0;
                }
            }
        }

        let total = class_counts[0] + class_counts[1];
        if total == 0 {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let priors = class_counts.map(|count| count as f64 / total as f64);

        // The denominator is the class item count, not its token count
        let vocabulary_mass = self.vocabulary.len() as f64 * self.smoothing;
        let [factual_counts, not_factual_counts] = self.term_counts;
        let conditionals = [
            Self::conditionals(factual_counts, class_counts[0] as f64 + vocabulary_mass),
            Self::conditionals(not_factual_counts, class_counts[1] as f64 + vocabulary_mass),
        ];

        tracing::info!(
            "Trained on {} items (factual={}, not_factual={}, vocabulary={})",
            total,
            class_counts[0],
            class_counts[1],
            self.vocabulary.len()
        );

        Ok(TrainedClassifier {
            vocabulary: self.vocabulary,
            smoothing: self.smoothing,
            class_counts,
            priors,
            conditionals,
        })
    }

    /// Train on labeled samples
    pub fn train_samples(self, samples: &[Sample]) -> ClassifierResult<TrainedClassifier> {
        self.train(samples.iter().map(|s| (s.text.as_str(), s.label)))
    }

    fn conditionals(counts: HashMap<String, f64>, smoothed_total: f64) -> HashMap<String, f64> {
        counts
            .into_iter()
            .map(|(term, count)| (term, count / smoothed_total))
            .collect()
    }
}

/// A trained, immutable classifier
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    vocabulary: Vocabulary,
    smoothing: f64,
    class_counts: [usize; 2],
    priors: [f64; 2],
    conditionals: [HashMap<String, f64>; 2],
}

impl TrainedClassifier {
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Number of training items seen for `label`
    pub fn class_count(&self, label: Label) -> usize {
        self.class_counts[slot(label)]
    }

    pub fn prior(&self, label: Label) -> f64 {
        self.priors[slot(label)]
    }

    /// P(term | label), or `None` for terms outside the vocabulary
    pub fn conditional(&self, label: Label, term: &str) -> Option<f64> {
        self.conditionals[slot(label)].get(term).copied()
    }

    /// Base-10 log score of `text` for `target`.
    ///
    /// Out-of-vocabulary tokens contribute nothing. A class with no
    /// training items scores negative infinity.
    pub fn score(&self, text: &str, target: Label) -> f64 {
        let conditionals = &self.conditionals[slot(target)];

        tokenize(text)
            .iter()
            .filter_map(|token| conditionals.get(token))
            .fold(self.prior(target).log10(), |score, p| score + p.log10())
    }

    /// Pick the class with the strictly greater score; ties go to factual
    pub fn classify(&self, text: &str) -> (Label, f64) {
        let factual = self.score(text, Label::Factual);
        let not_factual = self.score(text, Label::NotFactual);

        if not_factual > factual {
            (Label::NotFactual, not_factual)
        } else {
            (Label::Factual, factual)
        }
    }

    /// Classify a sample against its ground truth
    pub fn classify_sample(&self, sample: &Sample) -> ClassificationRecord {
        let (predicted, score) = self.classify(&sample.text);
        ClassificationRecord::new(sample.id.clone(), predicted, score, sample.label)
    }

    /// Classify many samples in parallel, preserving input order
    pub fn classify_batch(&self, samples: &[Sample]) -> Vec<ClassificationRecord> {
        samples
            .par_iter()
            .map(|sample| self.classify_sample(sample))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covid_corpus() -> Vec<(&'static str, Label)> {
        vec![
            ("covid is real", Label::Factual),
            ("covid is fake", Label::NotFactual),
        ]
    }

    fn trained(corpus: &[(&'static str, Label)], filter: bool) -> TrainedClassifier {
        let vocab = Vocabulary::build(corpus.iter().map(|(text, _)| *text), filter);
        NaiveBayesClassifier::new(vocab)
            .train(corpus.iter().copied())
            .unwrap()
    }

    #[test]
    fn test_smoothing_floor_before_training() {
        let vocab = Vocabulary::build(["covid is real", "covid is fake"], false);
        let classifier = NaiveBayesClassifier::new(vocab);

        for term in ["covid", "is", "real", "fake"] {
            for label in Label::ALL {
                assert_eq!(classifier.term_frequency(label, term), Some(DEFAULT_SMOOTHING));
            }
        }
        assert_eq!(classifier.term_frequency(Label::Factual, "masks"), None);
    }

    #[test]
    fn test_custom_smoothing_carries_into_training() {
        let vocab: Vocabulary = ["covid"].into_iter().collect();
        let classifier = NaiveBayesClassifier::with_smoothing(vocab, 0.5);
        assert_eq!(classifier.smoothing(), 0.5);
        assert_eq!(classifier.term_frequency(Label::NotFactual, "covid"), Some(0.5));

        let model = classifier
            .train([("covid", Label::Factual), ("hoax", Label::NotFactual)])
            .unwrap();

        assert_eq!(model.smoothing(), 0.5);
        // (0.5 + 1) / (1 + 1 * 0.5)
        assert!((model.conditional(Label::Factual, "covid").unwrap() - 1.0).abs() < 1e-12);
        assert!((model.conditional(Label::NotFactual, "covid").unwrap() - 0.5 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_training_counts_in_vocabulary_tokens_only() {
        let vocab: Vocabulary = ["covid", "real"].into_iter().collect();
        let classifier = NaiveBayesClassifier::new(vocab)
            .train([("Covid covid is real", Label::Factual), ("fake news", Label::NotFactual)])
            .unwrap();

        // (0.01 + 2) / (1 + 2 * 0.01)
        let expected = 2.01 / 1.02;
        assert!((classifier.conditional(Label::Factual, "covid").unwrap() - expected).abs() < 1e-12);
        assert_eq!(classifier.conditional(Label::Factual, "is"), None);
        assert_eq!(classifier.conditional(Label::NotFactual, "fake"), None);
        assert!((classifier.conditional(Label::NotFactual, "real").unwrap() - 0.01 / 1.02).abs() < 1e-12);
    }

    #[test]
    fn test_priors_sum_to_one() {
        let corpus = vec![
            ("masks reduce spread", Label::Factual),
            ("vaccines are tested", Label::Factual),
            ("garlic cures covid", Label::NotFactual),
        ];
        let model = trained(&corpus, false);

        assert_eq!(model.class_count(Label::Factual), 2);
        assert_eq!(model.class_count(Label::NotFactual), 1);
        assert!((model.prior(Label::Factual) + model.prior(Label::NotFactual) - 1.0).abs() < 1e-12);
        assert!((model.prior(Label::Factual) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_end_to_end_conditionals() {
        let corpus = covid_corpus();
        let model = trained(&corpus, false);

        assert_eq!(model.vocabulary().sorted(), vec!["covid", "fake", "is", "real"]);

        let real_f = model.conditional(Label::Factual, "real").unwrap();
        let real_nf = model.conditional(Label::NotFactual, "real").unwrap();
        let fake_f = model.conditional(Label::Factual, "fake").unwrap();
        let fake_nf = model.conditional(Label::NotFactual, "fake").unwrap();

        assert!(real_f > real_nf);
        assert!(fake_nf > fake_f);

        assert_eq!(model.classify("covid is real").0, Label::Factual);
        assert_eq!(model.classify("covid is fake").0, Label::NotFactual);
    }

    #[test]
    fn test_score_formula() {
        let model = trained(&covid_corpus(), false);

        // log10(0.5) + log10(1.01 / 1.04) + log10(1.01 / 1.04)
        let expected = 0.5f64.log10() + 2.0 * (1.01f64 / 1.04).log10();
        assert!((model.score("COVID real", Label::Factual) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_tokens_count_each_occurrence() {
        let model = trained(&covid_corpus(), false);

        let once = model.score("fake", Label::Factual);
        let twice = model.score("fake fake", Label::Factual);
        let term = model.conditional(Label::Factual, "fake").unwrap().log10();

        assert!((twice - once - term).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_tokens_are_neutral() {
        let model = trained(&covid_corpus(), false);

        for label in Label::ALL {
            assert_eq!(model.score("5g towers", label), model.prior(label).log10());
        }
    }

    #[test]
    fn test_tie_goes_to_factual() {
        let corpus = vec![("covid a", Label::Factual), ("covid b", Label::NotFactual)];
        let model = trained(&corpus, false);

        // Symmetric term and out-of-vocabulary text both score identically
        for text in ["covid", "nothing known"] {
            assert_eq!(model.score(text, Label::Factual), model.score(text, Label::NotFactual));
            let (label, score) = model.classify(text);
            assert_eq!(label, Label::Factual);
            assert_eq!(score, model.score(text, Label::Factual));
        }
    }

    #[test]
    fn test_empty_vocabulary_compares_priors() {
        let corpus = vec![
            ("one", Label::NotFactual),
            ("two", Label::NotFactual),
            ("three", Label::Factual),
        ];
        let model = NaiveBayesClassifier::new(Vocabulary::default())
            .train(corpus)
            .unwrap();

        let (label, score) = model.classify("one");
        assert_eq!(label, Label::NotFactual);
        assert!((score - (2.0f64 / 3.0).log10()).abs() < 1e-12);
    }

    #[test]
    fn test_missing_class_scores_negative_infinity() {
        let corpus = vec![("covid is real", Label::Factual)];
        let model = trained(&corpus, false);

        assert_eq!(model.prior(Label::NotFactual), 0.0);
        assert_eq!(model.score("covid", Label::NotFactual), f64::NEG_INFINITY);
        assert_eq!(model.classify("covid").0, Label::Factual);
    }

    #[test]
    fn test_empty_training_set_is_rejected() {
        let result = NaiveBayesClassifier::new(Vocabulary::default()).train(Vec::<(String, Label)>::new());
        assert_eq!(result.unwrap_err(), ClassifierError::EmptyTrainingSet);
    }

    #[test]
    fn test_invalid_smoothing_is_rejected() {
        let result = NaiveBayesClassifier::with_smoothing(Vocabulary::default(), 0.0)
            .train(covid_corpus());
        assert_eq!(result.unwrap_err(), ClassifierError::InvalidSmoothing(0.0));
    }

    #[test]
    fn test_classify_batch_preserves_order() {
        let model = trained(&covid_corpus(), false);
        let samples: Vec<Sample> = (0..50)
            .map(|i| {
                let (text, label) = if i % 2 == 0 {
                    ("covid is real", Label::Factual)
                } else {
                    ("covid is fake", Label::NotFactual)
                };
                Sample::new(i.to_string(), text, label)
            })
            .collect();

        let records = model.classify_batch(&samples);

        assert_eq!(records.len(), samples.len());
        for (record, sample) in records.iter().zip(&samples) {
            assert_eq!(record.id, sample.id);
            assert_eq!(record.predicted, sample.label);
            assert!(record.correct);
        }
    }
}
