use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::classifier::{
    labels_from_slice, ClassifierError, Dimension, LinearClassifier, LinearClassifierArtifact,
    PipelineArtifact, Prediction, StartupError, TextModel, TfidfPipeline, TfidfVectorizer,
};
use crate::config::ModelPaths;

/// Where an artifact was loaded from and the digest of the bytes read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub sha256: String,
}

/// What was loaded for one classification dimension.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionInfo {
    pub dimension: Dimension,
    pub artifacts: Vec<ArtifactInfo>,
    pub labels: Option<ArtifactInfo>,
    pub num_labels: usize,
    pub num_features: usize,
}

/// Summary of every loaded artifact, for startup logs and diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryInfo {
    pub dimensions: Vec<DimensionInfo>,
}

/// One dimension's model paired with the labels its class ids index into.
#[derive(Debug)]
pub struct DimensionModel {
    dimension: Dimension,
    model: Box<dyn TextModel>,
    labels: Vec<String>,
}

impl DimensionModel {
    pub fn new(dimension: Dimension, model: impl TextModel + 'static, labels: Vec<String>) -> Self {
        Self {
            dimension,
            model: Box::new(model),
            labels,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Runs the model on already-normalized text and resolves its class id.
    ///
    /// # Errors
    /// - `IndexOutOfRange` if the id has no label; the id is never clamped
    pub fn predict(&self, normalized: &str) -> Result<Prediction, ClassifierError> {
        let index = self.model.predict_id(normalized);
        usize::try_from(index)
            .ok()
            .and_then(|id| {
                self.labels.get(id).map(|label| Prediction {
                    label: label.clone(),
                    id,
                })
            })
            .ok_or(ClassifierError::IndexOutOfRange {
                dimension: self.dimension,
                index,
                len: self.labels.len(),
            })
    }

    /// Fails if any class id the model can emit has no label.
    fn check_labels(&self, labels_path: &Path) -> Result<(), StartupError> {
        let len = self.labels.len();
        if let Some(&class_id) = self
            .model
            .class_ids()
            .iter()
            .find(|&&id| usize::try_from(id).map_or(true, |id| id >= len))
        {
            return Err(StartupError::LabelMismatch {
                dimension: self.dimension,
                class_id,
                len,
                labels_path: labels_path.to_path_buf(),
            });
        }
        let num_classes = self.model.class_ids().len();
        if num_classes < len {
            warn!(
                "{} label map {:?} has {} labels but the classifier knows only {} classes",
                self.dimension, labels_path, len, num_classes
            );
        }
        Ok(())
    }

    fn info(&self, artifacts: Vec<ArtifactInfo>, labels: Option<ArtifactInfo>) -> DimensionInfo {
        DimensionInfo {
            dimension: self.dimension,
            artifacts,
            labels,
            num_labels: self.labels.len(),
            num_features: self.model.n_features(),
        }
    }
}

/// The three trained models and their label sequences.
///
/// Loaded once before the server accepts traffic and read-only afterwards,
/// so it can be shared across request handlers with an `Arc` and no locking.
#[derive(Debug)]
pub struct ModelRegistry {
    topic: DimensionModel,
    priority: DimensionModel,
    routing: DimensionModel,
    info: RegistryInfo,
}

// Compile-time verification of thread-safety
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ModelRegistry>();
};

impl ModelRegistry {
    /// Loads every artifact and label map, failing on the first problem.
    ///
    /// # Errors
    /// - `Io` if a file is missing or unreadable
    /// - `Parse` if a file is not valid JSON of the expected structure
    /// - `InvalidArtifact` if an artifact is internally inconsistent, or the
    ///   routing classifier does not match the routing vectorizer
    /// - `LabelFormat` if a label map matches none of the known shapes
    /// - `LabelMismatch` if a classifier can emit an id with no label
    pub fn load(paths: &ModelPaths) -> Result<Self, StartupError> {
        info!("Loading models");

        let (topic_artifact, topic_file) = read_json::<PipelineArtifact>(&paths.topic_model)?;
        let topic_model = TfidfPipeline::from_artifact(topic_artifact)
            .map_err(|reason| StartupError::invalid(&paths.topic_model, reason))?;
        let (topic, topic_info) =
            load_dimension(Dimension::Topic, topic_model, vec![topic_file], &paths.topic_labels)?;

        let (priority_artifact, priority_file) =
            read_json::<PipelineArtifact>(&paths.priority_model)?;
        let priority_model = TfidfPipeline::from_artifact(priority_artifact)
            .map_err(|reason| StartupError::invalid(&paths.priority_model, reason))?;
        let (priority, priority_info) = load_dimension(
            Dimension::Priority,
            priority_model,
            vec![priority_file],
            &paths.priority_labels,
        )?;

        let (vectorizer, vectorizer_file) =
            read_json::<TfidfVectorizer>(&paths.routing_vectorizer)?;
        vectorizer
            .validate()
            .map_err(|reason| StartupError::invalid(&paths.routing_vectorizer, reason))?;
        let (classifier_artifact, classifier_file) =
            read_json::<LinearClassifierArtifact>(&paths.routing_model)?;
        let classifier = LinearClassifier::from_artifact(classifier_artifact)
            .map_err(|reason| StartupError::invalid(&paths.routing_model, reason))?;
        let routing_model = TfidfPipeline::new(vectorizer, classifier)
            .map_err(|reason| StartupError::invalid(&paths.routing_model, reason))?;
        let (routing, routing_info) = load_dimension(
            Dimension::Routing,
            routing_model,
            vec![vectorizer_file, classifier_file],
            &paths.routing_labels,
        )?;

        info!("All models loaded");
        Ok(Self {
            topic,
            priority,
            routing,
            info: RegistryInfo {
                dimensions: vec![topic_info, priority_info, routing_info],
            },
        })
    }

    /// Builds a registry from already constructed models.
    pub fn from_models(
        topic: DimensionModel,
        priority: DimensionModel,
        routing: DimensionModel,
    ) -> Self {
        let info = RegistryInfo {
            dimensions: [&topic, &priority, &routing]
                .iter()
                .map(|model| model.info(Vec::new(), None))
                .collect(),
        };
        Self {
            topic,
            priority,
            routing,
            info,
        }
    }

    pub fn model(&self, dimension: Dimension) -> &DimensionModel {
        match dimension {
            Dimension::Topic => &self.topic,
            Dimension::Priority => &self.priority,
            Dimension::Routing => &self.routing,
        }
    }

    pub fn predict_topic(&self, normalized: &str) -> Result<Prediction, ClassifierError> {
        self.topic.predict(normalized)
    }

    pub fn predict_priority(&self, normalized: &str) -> Result<Prediction, ClassifierError> {
        self.priority.predict(normalized)
    }

    pub fn predict_routing(&self, normalized: &str) -> Result<Prediction, ClassifierError> {
        self.routing.predict(normalized)
    }

    pub fn topic_labels(&self) -> &[String] {
        self.topic.labels()
    }

    pub fn priority_labels(&self) -> &[String] {
        self.priority.labels()
    }

    pub fn routing_labels(&self) -> &[String] {
        self.routing.labels()
    }

    pub fn info(&self) -> &RegistryInfo {
        &self.info
    }
}

fn load_dimension(
    dimension: Dimension,
    model: TfidfPipeline,
    artifacts: Vec<ArtifactInfo>,
    labels_path: &Path,
) -> Result<(DimensionModel, DimensionInfo), StartupError> {
    let (bytes, labels_file) = read_file(labels_path)?;
    let labels = labels_from_slice(labels_path, &bytes)?;

    let model = DimensionModel::new(dimension, model, labels);
    model.check_labels(labels_path)?;

    let info = model.info(artifacts, Some(labels_file));
    info!(
        "Loaded {} model: {} features, {} labels",
        dimension, info.num_features, info.num_labels
    );
    for artifact in info.artifacts.iter().chain(info.labels.iter()) {
        info!("  {:?} (sha256 {})", artifact.path, artifact.sha256);
    }
    Ok((model, info))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<(T, ArtifactInfo), StartupError> {
    let (bytes, file) = read_file(path)?;
    let value = serde_json::from_slice(&bytes).map_err(|source| StartupError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((value, file))
}

fn read_file(path: &Path) -> Result<(Vec<u8>, ArtifactInfo), StartupError> {
    info!("Reading {:?}", path);
    let bytes = fs::read(path).map_err(|source| StartupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = format!("{:x}", hasher.finalize());
    Ok((
        bytes,
        ArtifactInfo {
            path: path.to_path_buf(),
            sha256,
        },
    ))
}
