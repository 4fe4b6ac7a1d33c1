use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::{ClassifierError, StartupError};
use super::normalize::normalize;
use crate::config::ModelPaths;
use crate::registry::ModelRegistry;

/// The combined answer for one ticket: a label and class id per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub topic: String,
    pub topic_id: usize,
    pub priority: String,
    pub priority_id: usize,
    pub routing: String,
    pub routing_id: usize,
}

/// Classifies tickets along topic, priority and routing at once.
///
/// Cloning is cheap: clones share the same loaded registry.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use helpsort::{ModelPaths, TicketClassifier};
///
/// let classifier = TicketClassifier::load(&ModelPaths::from_dir("models"))?;
/// let result = classifier.classify_all("Cannot log in after the password reset")?;
/// println!("{} / {} / {}", result.topic, result.priority, result.routing);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TicketClassifier {
    registry: Arc<ModelRegistry>,
}

impl TicketClassifier {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Loads all artifacts from `paths` and wraps them in a classifier.
    pub fn load(paths: &ModelPaths) -> Result<Self, StartupError> {
        Ok(Self::new(Arc::new(ModelRegistry::load(paths)?)))
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Normalizes `raw_text` once and runs all three models on the result.
    ///
    /// The caller is expected to reject empty input; this method does no
    /// validation of its own.
    ///
    /// # Errors
    /// - `IndexOutOfRange` if any model emits an id with no label
    pub fn classify_all(&self, raw_text: &str) -> Result<ClassificationResult, ClassifierError> {
        let cleaned = normalize(raw_text);
        debug!("Normalized input: {:?}", cleaned);

        let topic = self.registry.predict_topic(&cleaned)?;
        let priority = self.registry.predict_priority(&cleaned)?;
        let routing = self.registry.predict_routing(&cleaned)?;

        Ok(ClassificationResult {
            topic: topic.label,
            topic_id: topic.id,
            priority: priority.label,
            priority_id: priority.id,
            routing: routing.label,
            routing_id: routing.id,
        })
    }

    pub fn topic_labels(&self) -> &[String] {
        self.registry.topic_labels()
    }

    pub fn priority_labels(&self) -> &[String] {
        self.registry.priority_labels()
    }

    pub fn routing_labels(&self) -> &[String] {
        self.registry.routing_labels()
    }
}
