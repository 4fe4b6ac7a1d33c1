use std::fmt;

use ndarray::{Array1, Array2};
use serde::Deserialize;

use super::utils::{matrix_from_rows, sparse_dot};
use super::vectorizer::TfidfVectorizer;

/// A text model that maps already-normalized text to a raw class id.
///
/// The id is whatever the underlying classifier emits; resolving it against a
/// label sequence (and rejecting ids with no label) is the caller's job.
///
/// Implementations must be `Send + Sync` so a loaded model can be shared
/// across request handlers behind an `Arc`.
pub trait TextModel: Send + Sync + fmt::Debug {
    /// Predicts the class id for `text`.
    fn predict_id(&self, text: &str) -> i64;

    /// Every class id this model can emit.
    fn class_ids(&self) -> &[i64];

    /// Size of the feature space the model scores.
    fn n_features(&self) -> usize;
}

/// Serialized form of a fitted logistic regression.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearClassifierArtifact {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

/// Serialized form of a vectorizer + classifier pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineArtifact {
    pub vectorizer: TfidfVectorizer,
    pub classifier: LinearClassifierArtifact,
}

/// A fitted linear classifier over sparse feature vectors.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: Vec<i64>,
    coef: Array2<f32>,
    intercept: Array1<f32>,
}

impl LinearClassifier {
    /// Builds a classifier from its serialized form, checking that the
    /// coefficient matrix, intercepts and classes agree in shape.
    pub fn from_artifact(artifact: LinearClassifierArtifact) -> Result<Self, String> {
        let coef = matrix_from_rows(artifact.coef)?;
        let (rows, _) = coef.dim();
        if rows == 0 {
            return Err("classifier has no coefficient rows".to_string());
        }
        if artifact.intercept.len() != rows {
            return Err(format!(
                "classifier has {} coefficient rows but {} intercepts",
                rows,
                artifact.intercept.len()
            ));
        }
        let binary = rows == 1 && artifact.classes.len() == 2;
        if !binary && artifact.classes.len() != rows {
            return Err(format!(
                "classifier has {} classes but {} coefficient rows",
                artifact.classes.len(),
                rows
            ));
        }

        Ok(Self {
            classes: artifact.classes,
            coef,
            intercept: Array1::from(artifact.intercept),
        })
    }

    pub fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Raw decision values, one per coefficient row.
    pub fn decision_function(&self, features: &[(usize, f32)]) -> Array1<f32> {
        self.coef
            .rows()
            .into_iter()
            .zip(self.intercept.iter())
            .map(|(row, &b)| sparse_dot(row, features) + b)
            .collect()
    }

    /// Predicts the class id for a sparse feature vector.
    ///
    /// A single-row model is binary: a positive decision value selects the
    /// second class. Otherwise the highest scoring row wins, ties going to
    /// the lowest row.
    pub fn predict(&self, features: &[(usize, f32)]) -> i64 {
        let scores = self.decision_function(features);
        if scores.len() == 1 && self.classes.len() == 2 {
            let idx = usize::from(scores[0] > 0.0);
            return self.classes[idx];
        }

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if score > scores[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

/// TF-IDF features scored by a linear classifier.
///
/// Topic and priority ship as a single pipeline artifact; routing ships the
/// two halves separately and they are paired here.
#[derive(Debug, Clone)]
pub struct TfidfPipeline {
    vectorizer: TfidfVectorizer,
    classifier: LinearClassifier,
}

impl TfidfPipeline {
    /// Pairs a vectorizer with a classifier, requiring that the classifier
    /// expects exactly the feature space the vectorizer produces.
    pub fn new(vectorizer: TfidfVectorizer, classifier: LinearClassifier) -> Result<Self, String> {
        vectorizer.validate()?;
        if vectorizer.n_features() != classifier.n_features() {
            return Err(format!(
                "vectorizer produces {} features but classifier expects {}",
                vectorizer.n_features(),
                classifier.n_features()
            ));
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self, String> {
        let classifier = LinearClassifier::from_artifact(artifact.classifier)?;
        Self::new(artifact.vectorizer, classifier)
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LinearClassifier {
        &self.classifier
    }
}

impl TextModel for TfidfPipeline {
    fn predict_id(&self, text: &str) -> i64 {
        let features = self.vectorizer.transform(text);
        self.classifier.predict(&features)
    }

    fn class_ids(&self) -> &[i64] {
        self.classifier.classes()
    }

    fn n_features(&self) -> usize {
        self.vectorizer.n_features()
    }
}

// Compile-time verification of thread-safety
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TfidfPipeline>();
};
