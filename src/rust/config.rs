use std::env;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

/// Environment variable overriding the default models directory.
pub const MODELS_DIR_ENV: &str = "HELPSORT_MODELS";

/// Locations of every trained artifact the registry loads at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub topic_model: PathBuf,
    pub topic_labels: PathBuf,
    pub priority_model: PathBuf,
    pub priority_labels: PathBuf,
    pub routing_vectorizer: PathBuf,
    pub routing_model: PathBuf,
    pub routing_labels: PathBuf,
}

impl ModelPaths {
    /// Lays out the artifact paths under a single models directory, the way
    /// the training jobs write them.
    pub fn from_dir<P: AsRef<Path>>(models_dir: P) -> Self {
        let dir = models_dir.as_ref();
        let topic = dir.join("tfidf_topic");
        let priority = dir.join("tfidf_priority");
        let routing = dir.join("tfidf_routing");
        Self {
            topic_model: topic.join("topic_tfidf_model.json"),
            topic_labels: topic.join("topic_label_map.json"),
            priority_model: priority.join("priority_tfidf_model.json"),
            priority_labels: priority.join("priority_label_map.json"),
            routing_vectorizer: routing.join("vectorizer.json"),
            routing_model: routing.join("model.json"),
            routing_labels: routing.join("routing_labels.json"),
        }
    }

    /// Resolves the models directory from the environment or platform defaults.
    pub fn default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(MODELS_DIR_ENV) {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("helpsort").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("helpsort").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("helpsort").join("models")
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::from_dir(Self::default_models_dir())
    }
}

/// Settings for the HTTP facade.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            models_dir: ModelPaths::default_models_dir(),
        }
    }
}

impl ServerConfig {
    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths::from_dir(&self.models_dir)
    }

    /// Resolves the listen address. The host may be an IPv4 or IPv6
    /// literal or a name such as `localhost`.
    pub fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port).to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} resolved to no addresses", self.host),
            ));
        }
        Ok(addrs)
    }
}
