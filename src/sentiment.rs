//! # Sentiment Scorer
//! Lexicon-based polarity classification for free-text feedback comments.
//!
//! The lexicon is an embedded JSON map `word -> signed weight`; the algorithm
//! only requires that shape, so the asset can be swapped without code changes.
//! Classification is a total function: every input produces a complete result.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Polarity label derived from the sign of the lexicon score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// Ephemeral output of [`SentimentAnalyzer::classify`]; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Raw lexicon sum, pre-normalization.
    pub score: i32,
    /// Integer percentage. 0 only for empty/absent input ("not evaluated");
    /// any real classification reports at least 10.
    pub confidence: u32,
}

impl SentimentResult {
    /// Result for empty/absent input. Confidence 0 is below the normal floor
    /// of 10 and signals "not evaluated" rather than "weakly neutral".
    pub fn not_evaluated() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0,
            confidence: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Lexicon score for a single lowercased token (0 if unknown).
    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Raw polarity: sum of per-token lexicon weights.
    /// Returns `(score, token_count)`.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let mut score: i32 = 0;
        let mut tokens: usize = 0;
        for tok in tokenize(text) {
            score += self.word_score(&tok);
            tokens += 1;
        }
        (score, tokens)
    }

    /// Classify a comment into `{label, score, confidence}`.
    ///
    /// Confidence deliberately collapses score magnitude to sign only
    /// (any nonzero score counts as fully polarized) and then scales by a
    /// length factor saturating at 10 words. Kept bit-for-bit compatible
    /// with the observed behavior; see DESIGN.md for the open question.
    pub fn classify(&self, text: Option<&str>) -> SentimentResult {
        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => return SentimentResult::not_evaluated(),
        };

        let (score, _tokens) = self.score_text(text);

        let label = match score {
            s if s > 0 => SentimentLabel::Positive,
            s if s < 0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        };

        // sign-only normalization: nonzero score -> 100, zero -> 0
        let confidence_raw: f64 = if score != 0 { 100.0 } else { 0.0 };

        let word_count = text.split_whitespace().count();
        let length_factor = (word_count as f64 / 10.0).min(1.0);

        // Non-empty text always reports at least 10%: any signal is weak
        // evidence, never zero.
        let confidence = (confidence_raw * length_factor).round() as u32;
        SentimentResult {
            label,
            score,
            confidence: confidence.max(10),
        }
    }
}

/// Alphanumeric tokens, lower-cased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}
