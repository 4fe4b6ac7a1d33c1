use std::fmt;

use serde::Serialize;

mod error;
mod labels;
mod model;
mod normalize;
mod utils;
mod vectorizer;
#[allow(clippy::module_inception)]
mod classifier;

pub use classifier::{ClassificationResult, TicketClassifier};
pub use error::{ClassifierError, StartupError};
pub use labels::{load_labels, parse_labels, LabelFormatError, LabelShape};
pub(crate) use labels::labels_from_slice;
pub use model::{
    LinearClassifier, LinearClassifierArtifact, PipelineArtifact, TextModel, TfidfPipeline,
};
pub use normalize::{normalize, normalize_display};
pub use vectorizer::{Norm, TfidfVectorizer};

/// The independent axes a ticket is classified along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Subject-matter category
    Topic,
    /// Urgency
    Priority,
    /// Queue or team the ticket is sent to
    Routing,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Topic, Dimension::Priority, Dimension::Routing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Priority => "priority",
            Self::Routing => "routing",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dimension's answer: the resolved label and the raw class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub label: String,
    pub id: usize,
}
