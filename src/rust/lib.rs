//! Support ticket classification along topic, priority and routing queue.
//!
//! Three independently trained TF-IDF + linear classifiers are loaded once at
//! startup into a [`ModelRegistry`]. Each request is normalized once and run
//! through all three, and the raw class ids are resolved back to labels
//! through each model's label map.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use helpsort::{ModelPaths, TicketClassifier};
//!
//! let classifier = TicketClassifier::load(&ModelPaths::from_dir("models"))?;
//! let result = classifier.classify_all("The invoice total is wrong, please refund")?;
//! println!("topic={} priority={} routing={}", result.topic, result.priority, result.routing);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The registry is immutable after loading. [`TicketClassifier`] holds it in
//! an `Arc`, so clones are cheap and can be handed to any number of threads
//! or request handlers without locking.

pub mod classifier;
pub mod config;
pub mod registry;
pub mod server;

pub use classifier::{
    load_labels, normalize, normalize_display, parse_labels, ClassificationResult,
    ClassifierError, Dimension, LabelFormatError, LabelShape, Prediction, StartupError,
    TextModel, TicketClassifier,
};
pub use config::{ModelPaths, ServerConfig};
pub use registry::{DimensionModel, ModelRegistry, RegistryInfo};

/// Initializes `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
