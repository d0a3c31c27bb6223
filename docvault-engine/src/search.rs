//! Fuzzy full-text scoring over document snapshots.
//!
//! This utility lives outside the transactional and indexing paths: it
//! consumes a snapshot of the document map (see
//! [`Store::documents`](crate::store::Store::documents)) and scores string
//! fields against a search term by bounded Levenshtein distance. Closer
//! tokens contribute more; per-field weights bias the score.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

use docvault_core::document::Document;

/// A scored search hit.
#[derive(Debug, Clone)]
pub struct FuzzyMatch<T> {
    /// The matching document.
    pub document: Document<T>,
    /// The accumulated relevance score; higher is better.
    pub score: f64,
}

/// Configurable fuzzy search over string fields.
#[derive(Debug, Clone)]
pub struct FuzzySearch {
    max_distance: usize,
    ngram: usize,
    limit: Option<usize>,
    field_weights: HashMap<String, f64>,
}

impl FuzzySearch {
    /// Creates a search accepting tokens within `max_distance` edits.
    pub fn new(max_distance: usize) -> Self {
        Self {
            max_distance,
            ngram: 1,
            limit: None,
            field_weights: HashMap::new(),
        }
    }

    /// Tokenizes fields into n-grams of `n` words instead of single words.
    pub fn ngram(mut self, n: usize) -> Self {
        self.ngram = n.max(1);
        self
    }

    /// Caps the number of results returned.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Weights matches in `field` by `weight` (default 1.0).
    pub fn weight(mut self, field: impl Into<String>, weight: f64) -> Self {
        self.field_weights.insert(field.into(), weight);
        self
    }

    /// Scores every document's string values for `fields` against `term`
    /// and returns the hits sorted by descending score.
    pub fn search<T: Serialize + Clone>(
        &self,
        documents: &[Document<T>],
        term: &str,
        fields: &[&str],
    ) -> Vec<FuzzyMatch<T>> {
        let term_tokens = tokenize(&normalize(term), self.ngram);
        let mut matches = Vec::new();

        for doc in documents {
            let Ok(projected) = doc.fields() else {
                continue;
            };
            let mut score = 0.0;
            for field in fields {
                let Some(Value::String(text)) = projected.get(*field) else {
                    continue;
                };
                let weight = self.field_weights.get(*field).copied().unwrap_or(1.0);
                let field_tokens = tokenize(&normalize(text), self.ngram);
                for token in &term_tokens {
                    for candidate in &field_tokens {
                        let distance = bounded_levenshtein(token, candidate, self.max_distance);
                        if distance <= self.max_distance {
                            score += (self.max_distance - distance) as f64 * weight;
                        }
                    }
                }
            }
            if score > 0.0 {
                matches.push(FuzzyMatch {
                    document: doc.clone(),
                    score,
                });
            }
        }

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        if let Some(limit) = self.limit {
            matches.truncate(limit);
        }
        matches
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_owned()
}

fn tokenize(text: &str, n: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if n <= 1 {
        return words.into_iter().map(str::to_owned).collect();
    }
    if words.len() < n {
        return Vec::new();
    }
    words.windows(n).map(|gram| gram.join(" ")).collect()
}

/// Two-row Levenshtein distance with an early exit: when the length
/// difference alone exceeds `max`, the result is reported as `max + 1`
/// without running the full computation.
fn bounded_levenshtein(a: &str, b: &str, max: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return max + 1;
    }
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=a.len()).collect();
    let mut curr: Vec<usize> = vec![0; a.len() + 1];

    for (i, bc) in b.iter().enumerate() {
        curr[0] = i + 1;
        for (j, ac) in a.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[a.len()]
}
