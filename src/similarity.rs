// src/similarity.rs
//! Token-sort-ratio title similarity on a 0–100 scale.
//!
//! Both strings are lowercased, non-alphanumeric characters become spaces, the
//! whitespace tokens are sorted and rejoined, and the two resulting strings are
//! compared with a normalized edit-distance ratio. Word order and case do not
//! affect the score.
//!
//! The default metric is the indel ratio (insertions/deletions only):
//! `100 * (len_a + len_b - indel) / (len_a + len_b)`. Levenshtein variants from
//! `strsim` are available for callers that want a stricter score.

use serde::Deserialize;
use strsim::{normalized_damerau_levenshtein, normalized_levenshtein};

/// Edit-distance flavour applied after token sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Indel,
    Levenshtein,
    DamerauLevenshtein,
}

impl SimilarityMetric {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "indel" => Some(Self::Indel),
            "levenshtein" => Some(Self::Levenshtein),
            "damerau_levenshtein" | "damerau" => Some(Self::DamerauLevenshtein),
            _ => None,
        }
    }
}

/// Anything that can score two titles on a 0–100 scale.
pub trait TitleScorer {
    fn score(&self, a: &str, b: &str) -> f64;
}

impl<F> TitleScorer for F
where
    F: Fn(&str, &str) -> f64,
{
    fn score(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// The production scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenSortRatio {
    pub metric: SimilarityMetric,
}

impl TokenSortRatio {
    pub fn new(metric: SimilarityMetric) -> Self {
        Self { metric }
    }
}

impl TitleScorer for TokenSortRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        token_sort_ratio_with(self.metric, a, b)
    }
}

/// Token-sort-ratio with the default (indel) metric.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    token_sort_ratio_with(SimilarityMetric::Indel, a, b)
}

pub fn token_sort_ratio_with(metric: SimilarityMetric, a: &str, b: &str) -> f64 {
    let a = sort_tokens(a);
    let b = sort_tokens(b);
    match metric {
        SimilarityMetric::Indel => indel_ratio(&a, &b),
        SimilarityMetric::Levenshtein => normalized_levenshtein(&a, &b) * 100.0,
        SimilarityMetric::DamerauLevenshtein => normalized_damerau_levenshtein(&a, &b) * 100.0,
    }
}

/// Lowercase, fold punctuation to spaces, sort the tokens, rejoin.
pub fn sort_tokens(s: &str) -> String {
    let folded: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    let mut tokens: Vec<&str> = folded.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = lcs_len(&a, &b);
    // indel distance = total - 2 * lcs
    100.0 * (2 * lcs) as f64 / total as f64
}

// Two-row DP, O(len_a * len_b) time, O(len_b) space.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
