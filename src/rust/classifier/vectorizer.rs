use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::utils::{l1_normalize, l2_normalize};

lazy_static! {
    /// Words of two or more word characters, the trainer's default token pattern.
    static ref TOKEN: Regex = Regex::new(r"\b\w\w+\b").expect("token pattern is valid");
}

/// Vector normalization applied after IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// A fitted TF-IDF vectorizer exported from the offline trainer.
///
/// Maps text to a sparse feature vector in the vocabulary's index space:
/// 1. Tokenizes with the `\b\w\w+\b` word pattern (after lower-casing if enabled)
/// 2. Drops stop words, then forms space-joined n-grams
/// 3. Counts vocabulary hits, optionally as `1 + ln(count)`
/// 4. Multiplies by IDF and normalizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default)]
    stop_words: HashSet<String>,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default = "default_norm")]
    norm: Option<Norm>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_lowercase() -> bool {
    true
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

impl TfidfVectorizer {
    /// Size of the feature space this vectorizer produces.
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Checks the internal consistency of a deserialized vectorizer.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(format!("invalid ngram_range ({}, {})", min_n, max_n));
        }
        if self.vocabulary.len() != self.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but idf has {} weights",
                self.vocabulary.len(),
                self.idf.len()
            ));
        }
        let mut seen = vec![false; self.idf.len()];
        for (term, &idx) in &self.vocabulary {
            match seen.get_mut(idx) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(format!("feature index {} is used twice", idx)),
                None => {
                    return Err(format!(
                        "term {:?} has index {} outside {} features",
                        term,
                        idx,
                        self.idf.len()
                    ))
                }
            }
        }
        Ok(())
    }

    /// Splits text into the terms the vocabulary is keyed by.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = TOKEN
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    /// Transforms text into a sparse TF-IDF vector sorted by feature index.
    pub fn transform(&self, text: &str) -> Vec<(usize, f32)> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in self.analyze(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut features: Vec<(usize, f32)> = counts.into_iter().collect();
        features.sort_unstable_by_key(|&(idx, _)| idx);

        let mut values: Vec<f32> = features
            .iter()
            .map(|&(idx, count)| {
                let tf = if self.sublinear_tf { 1.0 + count.ln() } else { count };
                tf * self.idf[idx]
            })
            .collect();
        match self.norm {
            Some(Norm::L2) => l2_normalize(&mut values),
            Some(Norm::L1) => l1_normalize(&mut values),
            None => {}
        }

        features
            .into_iter()
            .zip(values)
            .map(|((idx, _), value)| (idx, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vectorizer(extra: serde_json::Value) -> TfidfVectorizer {
        let mut base = json!({
            "vocabulary": {"password": 0, "reset": 1, "password reset": 2, "login": 3},
            "idf": [1.0, 1.0, 2.0, 1.5],
            "ngram_range": [1, 2],
            "stop_words": ["my", "the"]
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let v: TfidfVectorizer = serde_json::from_value(base).unwrap();
        v.validate().unwrap();
        v
    }

    #[test]
    fn test_defaults() {
        let v: TfidfVectorizer = serde_json::from_value(json!({
            "vocabulary": {"a1": 0},
            "idf": [1.0]
        }))
        .unwrap();
        assert_eq!(v.ngram_range, (1, 1));
        assert!(v.lowercase);
        assert_eq!(v.norm, Some(Norm::L2));
        assert!(!v.sublinear_tf);
    }

    #[test]
    fn test_analyze_drops_stop_words_before_ngrams() {
        let v = vectorizer(json!({}));
        assert_eq!(
            v.analyze("Reset my Password"),
            vec!["reset", "password", "reset password"]
        );
        // single characters are not tokens
        assert_eq!(v.analyze("a b c"), Vec::<String>::new());
    }

    #[test]
    fn test_transform_weights_and_normalizes() {
        let v = vectorizer(json!({}));
        let features = v.transform("password reset");
        // password=1, reset=1, "password reset"=2 before normalization
        let norm = (1.0f32 + 1.0 + 4.0).sqrt();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].0, 0);
        assert!((features[0].1 - 1.0 / norm).abs() < 1e-6);
        assert_eq!(features[2].0, 2);
        assert!((features[2].1 - 2.0 / norm).abs() < 1e-6);
    }

    #[test]
    fn test_transform_repeated_terms() {
        let raw = vectorizer(json!({"norm": null, "ngram_range": [1, 1]}));
        assert_eq!(raw.transform("login login login"), vec![(3, 4.5)]);

        let sublinear = vectorizer(json!({"norm": null, "ngram_range": [1, 1], "sublinear_tf": true}));
        let features = sublinear.transform("login login");
        assert!((features[0].1 - 1.5 * (1.0 + 2.0f32.ln())).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_text_is_empty_vector() {
        let v = vectorizer(json!({}));
        assert!(v.transform("printer on fire").is_empty());
        assert!(v.transform("").is_empty());
    }

    #[test]
    fn test_validate_rejects_inconsistent_artifacts() {
        let short_idf: TfidfVectorizer = serde_json::from_value(json!({
            "vocabulary": {"aa": 0, "bb": 1},
            "idf": [1.0]
        }))
        .unwrap();
        assert!(short_idf.validate().is_err());

        let out_of_range: TfidfVectorizer = serde_json::from_value(json!({
            "vocabulary": {"aa": 0, "bb": 5},
            "idf": [1.0, 1.0]
        }))
        .unwrap();
        assert!(out_of_range.validate().is_err());

        let bad_ngrams: TfidfVectorizer = serde_json::from_value(json!({
            "vocabulary": {"aa": 0},
            "idf": [1.0],
            "ngram_range": [2, 1]
        }))
        .unwrap();
        assert!(bad_ngrams.validate().is_err());
    }
}
