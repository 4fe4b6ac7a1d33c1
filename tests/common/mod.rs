#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use helpsort::{ModelPaths, TicketClassifier};

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("models")
}

pub fn fixture_paths() -> ModelPaths {
    ModelPaths::from_dir(fixtures_dir())
}

pub fn setup_test_classifier() -> TicketClassifier {
    TicketClassifier::load(&fixture_paths()).expect("Failed to load fixture models")
}

/// Copies the fixture models into `dst` so a test can break one of them.
pub fn copy_fixtures(dst: &Path) -> io::Result<ModelPaths> {
    for dimension in ["tfidf_topic", "tfidf_priority", "tfidf_routing"] {
        let from = fixtures_dir().join(dimension);
        let to = dst.join(dimension);
        fs::create_dir_all(&to)?;
        for entry in fs::read_dir(&from)? {
            let entry = entry?;
            fs::copy(entry.path(), to.join(entry.file_name()))?;
        }
    }
    Ok(ModelPaths::from_dir(dst))
}
