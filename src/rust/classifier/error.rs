use std::io;
use std::path::PathBuf;

use super::labels::LabelFormatError;
use super::Dimension;

/// Errors raised while answering a classification request.
///
/// These are server-side faults: by the time a request reaches the
/// classifier its input has already been validated by the caller.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The model produced a class id with no entry in its label sequence.
    /// This means the deployed artifact and label map have drifted apart.
    #[error("{dimension} classifier produced index {index}, but only {len} labels are loaded")]
    IndexOutOfRange {
        dimension: Dimension,
        index: i64,
        len: usize,
    },
}

/// Fatal errors raised while loading artifacts at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid artifact {path:?}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },
    #[error("Unsupported label map format in {path:?}: {source}")]
    LabelFormat {
        path: PathBuf,
        #[source]
        source: LabelFormatError,
    },
    #[error("{dimension} classifier declares class id {class_id}, but {labels_path:?} has only {len} labels")]
    LabelMismatch {
        dimension: Dimension,
        class_id: i64,
        len: usize,
        labels_path: PathBuf,
    },
}

impl StartupError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
