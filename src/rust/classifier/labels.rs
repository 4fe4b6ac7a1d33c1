use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde_json::{Map, Value};

use super::error::StartupError;

/// Reasons a label-metadata document could not be turned into a label sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelFormatError {
    #[error("expected a label list, an id2label/label2id mapping or a numeric-keyed mapping")]
    UnrecognizedShape,
    #[error("field `{0}` has the wrong type")]
    WrongType(&'static str),
    #[error("label for id {0} is not a string")]
    NonStringLabel(String),
    #[error("`{0}` is not a valid label id")]
    InvalidId(String),
    #[error("label id {0} appears more than once")]
    DuplicateId(usize),
    #[error("label ids must cover 0..{len}, but id {missing} is missing")]
    NonContiguous { missing: usize, len: usize },
    #[error("label map is empty")]
    Empty,
}

/// The serialization shapes a label map can arrive in.
///
/// Training scripts evolved independently and each writes label metadata
/// differently. Detection happens once, in a fixed priority order, and every
/// shape reduces to the same dense, id-ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelShape {
    /// `["a", "b"]` or `{"labels": ["a", "b"]}`
    List(Vec<Value>),
    /// `{"id2label": {"0": "a", "1": "b"}}`
    IdToLabel(Map<String, Value>),
    /// `{"label2id": {"a": 0, "b": 1}}`
    LabelToId(Map<String, Value>),
    /// `{"0": "a", "1": "b"}`
    BareNumeric(Map<String, Value>),
}

impl LabelShape {
    /// Detects the shape of a parsed label-metadata document.
    pub fn detect(value: Value) -> Result<Self, LabelFormatError> {
        let mut meta = match value {
            Value::Array(items) => return Ok(Self::List(items)),
            Value::Object(meta) => meta,
            _ => return Err(LabelFormatError::UnrecognizedShape),
        };

        if let Some(labels) = meta.remove("labels") {
            return match labels {
                Value::Array(items) => Ok(Self::List(items)),
                _ => Err(LabelFormatError::WrongType("labels")),
            };
        }
        if let Some(id2label) = meta.remove("id2label") {
            return match id2label {
                Value::Object(map) => Ok(Self::IdToLabel(map)),
                _ => Err(LabelFormatError::WrongType("id2label")),
            };
        }
        if let Some(label2id) = meta.remove("label2id") {
            return match label2id {
                Value::Object(map) => Ok(Self::LabelToId(map)),
                _ => Err(LabelFormatError::WrongType("label2id")),
            };
        }
        if meta.keys().all(|key| is_numeric_key(key)) {
            return Ok(Self::BareNumeric(meta));
        }

        Err(LabelFormatError::UnrecognizedShape)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::IdToLabel(_) => "id2label",
            Self::LabelToId(_) => "label2id",
            Self::BareNumeric(_) => "numeric-keyed",
        }
    }

    /// Reconstructs the ordered label sequence.
    pub fn into_labels(self) -> Result<Vec<String>, LabelFormatError> {
        let labels = match self {
            Self::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(id, item)| match item {
                    Value::String(label) => Ok(label),
                    _ => Err(LabelFormatError::NonStringLabel(id.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Self::IdToLabel(map) | Self::BareNumeric(map) => {
                let mut by_id = BTreeMap::new();
                for (key, value) in map {
                    let id = parse_id(&key)?;
                    let label = match value {
                        Value::String(label) => label,
                        _ => return Err(LabelFormatError::NonStringLabel(key)),
                    };
                    if by_id.insert(id, label).is_some() {
                        return Err(LabelFormatError::DuplicateId(id));
                    }
                }
                densify(by_id)?
            }
            Self::LabelToId(map) => {
                let mut by_id = BTreeMap::new();
                for (label, value) in map {
                    let id = match &value {
                        Value::Number(n) => n
                            .as_u64()
                            .and_then(|n| usize::try_from(n).ok())
                            .ok_or_else(|| LabelFormatError::InvalidId(n.to_string()))?,
                        Value::String(s) => parse_id(s)?,
                        other => return Err(LabelFormatError::InvalidId(other.to_string())),
                    };
                    if by_id.insert(id, label).is_some() {
                        return Err(LabelFormatError::DuplicateId(id));
                    }
                }
                densify(by_id)?
            }
        };

        if labels.is_empty() {
            return Err(LabelFormatError::Empty);
        }
        Ok(labels)
    }
}

/// Parses a label-metadata document into an ordered label sequence.
///
/// # Example
/// ```
/// use helpsort::parse_labels;
/// use serde_json::json;
///
/// let from_list = parse_labels(json!({"labels": ["a", "b", "c"]})).unwrap();
/// let from_ids = parse_labels(json!({"0": "a", "1": "b", "2": "c"})).unwrap();
/// let from_labels = parse_labels(json!({"label2id": {"a": 0, "b": 1, "c": 2}})).unwrap();
/// assert_eq!(from_list, vec!["a", "b", "c"]);
/// assert_eq!(from_list, from_ids);
/// assert_eq!(from_list, from_labels);
/// ```
pub fn parse_labels(value: Value) -> Result<Vec<String>, LabelFormatError> {
    LabelShape::detect(value)?.into_labels()
}

/// Reads and parses the label-metadata file at `path`.
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<String>, StartupError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| StartupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    labels_from_slice(path, &bytes)
}

/// Parses label metadata already read from `path`.
pub(crate) fn labels_from_slice(path: &Path, bytes: &[u8]) -> Result<Vec<String>, StartupError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|source| StartupError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let label_error = |source| StartupError::LabelFormat {
        path: path.to_path_buf(),
        source,
    };
    let shape = LabelShape::detect(value).map_err(label_error)?;
    debug!("Label map {:?} detected as {} shape", path, shape.name());
    shape.into_labels().map_err(label_error)
}

fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

fn parse_id(key: &str) -> Result<usize, LabelFormatError> {
    if !is_numeric_key(key) {
        return Err(LabelFormatError::InvalidId(key.to_string()));
    }
    key.parse()
        .map_err(|_| LabelFormatError::InvalidId(key.to_string()))
}

fn densify(by_id: BTreeMap<usize, String>) -> Result<Vec<String>, LabelFormatError> {
    let len = by_id.len();
    by_id
        .into_iter()
        .enumerate()
        .map(|(expected, (id, label))| {
            if id == expected {
                Ok(label)
            } else {
                Err(LabelFormatError::NonContiguous { missing: expected, len })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_priority() {
        // "labels" wins over the mappings the routing trainer also writes
        let value = json!({
            "labels": ["x", "y"],
            "label2id": {"y": 0, "x": 1},
            "id2label": {"0": "y", "1": "x"}
        });
        assert_eq!(LabelShape::detect(value.clone()).unwrap().name(), "list");
        assert_eq!(parse_labels(value).unwrap(), vec!["x", "y"]);

        let value = json!({
            "label2id": {"b": 1, "a": 0},
            "id2label": {"0": "a", "1": "b"}
        });
        assert_eq!(LabelShape::detect(value).unwrap().name(), "id2label");
    }

    #[test]
    fn test_top_level_array() {
        assert_eq!(parse_labels(json!(["low", "high"])).unwrap(), vec!["low", "high"]);
    }

    #[test]
    fn test_numeric_ordering_not_lexical() {
        let value = json!({"10": "k", "2": "c", "0": "a", "1": "b", "3": "d", "4": "e",
            "5": "f", "6": "g", "7": "h", "8": "i", "9": "j"});
        let labels = parse_labels(value).unwrap();
        assert_eq!(labels[2], "c");
        assert_eq!(labels[10], "k");
    }

    #[test]
    fn test_label2id_accepts_string_ids() {
        let labels = parse_labels(json!({"label2id": {"b": "1", "a": "0"}})).unwrap();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn test_rejects_gaps_and_duplicates() {
        assert_eq!(
            parse_labels(json!({"0": "a", "2": "c"})),
            Err(LabelFormatError::NonContiguous { missing: 1, len: 2 })
        );
        assert_eq!(
            parse_labels(json!({"label2id": {"a": 0, "b": 0}})),
            Err(LabelFormatError::DuplicateId(0))
        );
        assert_eq!(
            parse_labels(json!({"id2label": {"1": "a", "01": "b"}})),
            Err(LabelFormatError::DuplicateId(1))
        );
    }

    #[test]
    fn test_rejects_unknown_shapes() {
        assert_eq!(
            parse_labels(json!({"classes": ["a"]})),
            Err(LabelFormatError::UnrecognizedShape)
        );
        assert_eq!(parse_labels(json!("a,b,c")), Err(LabelFormatError::UnrecognizedShape));
        assert_eq!(
            parse_labels(json!({"labels": "a,b"})),
            Err(LabelFormatError::WrongType("labels"))
        );
        assert_eq!(
            parse_labels(json!({"label2id": {"a": -1}})),
            Err(LabelFormatError::InvalidId("-1".to_string()))
        );
    }

    #[test]
    fn test_rejects_non_string_labels_and_empty_maps() {
        assert_eq!(
            parse_labels(json!(["a", 7])),
            Err(LabelFormatError::NonStringLabel("1".to_string()))
        );
        assert_eq!(parse_labels(json!({})), Err(LabelFormatError::Empty));
        assert_eq!(parse_labels(json!({"labels": []})), Err(LabelFormatError::Empty));
    }
}
