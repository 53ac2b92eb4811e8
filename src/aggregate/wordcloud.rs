//! Word-frequency model for word cloud sessions
//!
//! Recomputed in full from every entry on each change.
//!
//! Tokenization:
//! 1. Lower-case the entry text
//! 2. Split on runs of whitespace
//! 3. Strip `. , ! ? " ' ( )` from both ends of each token
//! 4. Drop tokens that end up empty or are stop words
//!
//! Terms with equal counts keep the order in which they were first seen.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::Entry;

/// Characters stripped from the edges of every token
const EDGE_PUNCTUATION: &[char] = &['.', ',', '!', '?', '"', '\'', '(', ')'];

/// Common Indonesian function words
const INDONESIAN: &[&str] = &[
    "di", "ke", "dari", "dan", "atau", "tapi", "jika", "maka", "dengan", "untuk", "pada", "saat",
    "seperti", "yang", "ini", "itu", "adalah", "ialah", "sangat", "juga", "hanya", "sudah",
    "belum", "akan", "bisa", "tidak", "bukan", "saya", "anda", "dia", "kita", "kami", "kalian",
    "mereka", "ada", "saja", "lalu",
];

/// Common English function words
const ENGLISH: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "of", "to", "in", "on", "at", "for",
    "with", "by", "from", "is", "are", "be", "it", "this", "that", "i", "you", "we", "they",
    "he", "she", "not", "so", "as", "my", "our", "your",
];

/// Closed set of words excluded from the frequency table
///
/// Words are matched after lower-casing and punctuation stripping, so the set
/// is stored lower-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// An empty set; every token counts
    pub fn none() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary words
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Indonesian function words
    pub fn indonesian() -> Self {
        Self::from_words(INDONESIAN)
    }

    /// English function words
    pub fn english() -> Self {
        Self::from_words(ENGLISH)
    }

    /// Merge another set into this one
    pub fn with(mut self, other: &StopWords) -> Self {
        self.words.extend(other.words.iter().cloned());
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// One ranked term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u32,
}

/// Ranked term-frequency table for a word cloud session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCloud {
    /// Terms sorted by descending count
    pub terms: Vec<TermCount>,
    /// Nothing countable was submitted yet
    pub insufficient: bool,
}

impl WordCloud {
    /// Count of a term, if present
    pub fn count(&self, term: &str) -> Option<u32> {
        self.terms.iter().find(|t| t.term == term).map(|t| t.count)
    }

    /// Highest count in the table (0 when empty)
    pub fn max_count(&self) -> u32 {
        self.terms.first().map_or(0, |t| t.count)
    }
}

/// Split one entry's text into countable terms
pub fn tokenize<'a>(text: &'a str, stop_words: &'a StopWords) -> impl Iterator<Item = String> + 'a {
    text.split_whitespace()
        .map(|raw| raw.to_lowercase())
        .map(|token| token.trim_matches(EDGE_PUNCTUATION).to_string())
        .filter(move |token| !token.is_empty() && !stop_words.contains(token))
}

/// Recompute the frequency table from the complete entry set
pub fn word_frequencies(entries: &[Entry], stop_words: &StopWords) -> WordCloud {
    let mut counts: IndexMap<String, u32> = IndexMap::new();

    for entry in entries {
        for term in tokenize(&entry.text, stop_words) {
            *counts.entry(term).or_insert(0) += 1;
        }
    }

    let mut terms: Vec<TermCount> = counts
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect();

    // Stable: equal counts stay in first-seen order
    terms.sort_by(|a, b| b.count.cmp(&a.count));

    WordCloud {
        insufficient: terms.is_empty(),
        terms,
    }
}
