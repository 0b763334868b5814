// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Vocabulary construction for the bag-of-words classifier
//!
//! Tokenization is deliberately literal: lower-case, then split on every
//! single space. The same rule is applied when building the vocabulary,
//! when training and when scoring.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Split text into lower-cased tokens on single-space boundaries.
///
/// Consecutive spaces yield empty tokens; nothing is trimmed or stripped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase().split(' ').map(String::from).collect()
}

/// Which of the two vocabularies a model is trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VocabularyMode {
    /// Every token seen in the training corpus
    Original,
    /// Tokens seen at least twice
    Filtered,
}

impl VocabularyMode {
    pub const ALL: [VocabularyMode; 2] = [VocabularyMode::Original, VocabularyMode::Filtered];

    pub fn filters_singletons(&self) -> bool {
        matches!(self, VocabularyMode::Filtered)
    }

    /// Name of the model variant trained on this vocabulary
    pub fn model_name(&self) -> &'static str {
        match self {
            VocabularyMode::Original => "NB-BOW-OV",
            VocabularyMode::Filtered => "NB-BOW-FV",
        }
    }
}

impl fmt::Display for VocabularyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

/// Immutable set of terms usable as classification features
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: HashSet<String>,
}

impl Vocabulary {
    /// Build a vocabulary from a corpus of raw texts.
    ///
    /// With `filter_singletons`, terms occurring exactly once in the whole
    /// corpus are dropped.
    pub fn build<I, S>(corpus: I, filter_singletons: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let frequencies = Self::term_frequencies(corpus);
        let total = frequencies.len();

        let terms: HashSet<String> = frequencies
            .into_iter()
            .filter(|(_, count)| !filter_singletons || *count != 1)
            .map(|(term, _)| term)
            .collect();

        tracing::debug!(
            "Built vocabulary: {} of {} distinct terms kept (filter_singletons={})",
            terms.len(),
            total,
            filter_singletons
        );

        Self { terms }
    }

    /// Build the vocabulary for a given model variant
    pub fn build_for<I, S>(corpus: I, mode: VocabularyMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(corpus, mode.filters_singletons())
    }

    /// Count every token occurrence across the corpus
    pub fn term_frequencies<I, S>(corpus: I) -> HashMap<String, usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut frequencies = HashMap::new();
        for text in corpus {
            for token in tokenize(text.as_ref()) {
                *frequencies.entry(token).or_insert(0) += 1;
            }
        }
        frequencies
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    /// Terms in lexicographic order, for stable display
    pub fn sorted(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.iter().collect();
        terms.sort_unstable();
        terms
    }

    /// Whether every term of `self` is also in `other`
    pub fn is_subset(&self, other: &Vocabulary) -> bool {
        self.terms.is_subset(&other.terms)
    }
}

impl<S: Into<String>> FromIterator<S> for Vocabulary {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            terms: iter.into_iter().map(Into::into).collect(),
        }
    }
}
