//! Tokenization and lemmatization.
//!
//! The translator never talks to a stemmer directly; it consumes tokens
//! through the [`Analyzer`] contract, which is deterministic: the same text
//! always yields the same token sequence. Token positions carry the adjacency
//! information windowed matching needs.

use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

/// One token of analyzed text.
#[derive(Debug, Clone)]
pub struct Token {
    /// Original text, lowercased.
    pub text: String,
    /// Normalized base form used for semantic matching.
    pub lemma: String,
    /// Index in the token stream.
    pub position: usize,
    /// True when the token is entirely alphabetic.
    pub is_alpha: bool,
    /// Parsed value when the token is a numeric literal.
    pub numeric: Option<f64>,
}

/// Narrow lemmatizer contract consumed by the translator and the schema
/// registry.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<Token>;

    /// Normalized signature of a field name: the set of lemmatized,
    /// alphabetic tokens.
    fn signature(&self, name: &str) -> HashSet<String> {
        self.analyze(name)
            .into_iter()
            .filter(|t| t.is_alpha)
            .map(|t| t.lemma)
            .collect()
    }
}

/// English Snowball stemmer over a lowercase, punctuation-splitting
/// tokenizer.
pub struct SnowballAnalyzer {
    stemmer: Stemmer,
}

impl SnowballAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Stems a keyword list into a lemma set. Matching keyword sets through
    /// the same stemmer as the input keeps comparisons stem-to-stem.
    pub fn lemma_set(&self, words: &[&str]) -> HashSet<String> {
        words
            .iter()
            .map(|w| self.stemmer.stem(&w.to_lowercase()).into_owned())
            .collect()
    }
}

impl Default for SnowballAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for SnowballAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        text.to_lowercase()
            .split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '.'))
            .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|s| !s.is_empty())
            .enumerate()
            .map(|(position, raw)| {
                let is_alpha = raw.chars().all(char::is_alphabetic);
                let numeric = if is_alpha { None } else { raw.parse::<f64>().ok() };
                let lemma = if is_alpha {
                    self.stemmer.stem(raw).into_owned()
                } else {
                    raw.to_string()
                };
                Token {
                    text: raw.to_string(),
                    lemma,
                    position,
                    is_alpha,
                    numeric,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_is_deterministic() {
        let analyzer = SnowballAnalyzer::new();
        let a = analyzer.analyze("Heart Rate above 80");
        let b = analyzer.analyze("Heart Rate above 80");
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.lemma, y.lemma);
            assert_eq!(x.position, y.position);
        }
    }

    #[test]
    fn numerals_carry_parsed_values() {
        let analyzer = SnowballAnalyzer::new();
        let tokens = analyzer.analyze("top 5, then 80.5");
        let nums: Vec<f64> = tokens.iter().filter_map(|t| t.numeric).collect();
        assert_eq!(nums, vec![5.0, 80.5]);
    }

    #[test]
    fn plural_and_singular_share_a_lemma() {
        let analyzer = SnowballAnalyzer::new();
        let equal = analyzer.analyze("equals")[0].lemma.clone();
        let equals = analyzer.analyze("equal")[0].lemma.clone();
        assert_eq!(equal, equals);
    }

    #[test]
    fn signature_keeps_only_alphabetic_lemmas() {
        let analyzer = SnowballAnalyzer::new();
        let sig = analyzer.signature("Systolic blood pressure (mmHg) 2");
        assert!(sig.contains(&analyzer.analyze("systolic")[0].lemma));
        assert!(sig.contains("blood"));
        assert!(!sig.contains("2"));
    }
}
