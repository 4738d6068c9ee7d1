//! JSON corpus manifest (`{"utts": {id: {...}}}`).

use crate::error::{ManifestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One input or output stream of an utterance.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct IoInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `[length, dim]`
    pub shape: Vec<usize>,
    /// Path to a `.npy` feature matrix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feat: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
    /// Space-separated token ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl IoInfo {
    /// Sequence length, `shape[0]`.
    pub fn len(&self) -> Option<usize> {
        self.shape.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.len().is_none_or(|len| len == 0)
    }

    /// Per-step dimension, `shape[1]`.
    pub fn dim(&self) -> Option<usize> {
        self.shape.get(1).copied()
    }
}

/// Manifest entry of one utterance.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Utterance {
    pub input: Vec<IoInfo>,
    pub output: Vec<IoInfo>,
    /// Utterances of different categories never share a minibatch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Which side of an utterance a stream lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Input => "input",
            Side::Output => "output",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Side::Input => Side::Output,
            Side::Output => Side::Input,
        }
    }
}

impl Utterance {
    pub fn streams(&self, side: Side) -> &[IoInfo] {
        match side {
            Side::Input => &self.input,
            Side::Output => &self.output,
        }
    }

    /// First stream of `side`.
    pub fn stream(&self, id: &str, side: Side) -> Result<&IoInfo> {
        self.streams(side).first().ok_or_else(|| {
            ManifestError::MissingField {
                id: id.to_string(),
                what: format!("{}[0]", side.as_str()),
            }
            .into()
        })
    }

    /// Length of the first stream of `side`.
    pub fn len_of(&self, id: &str, side: Side) -> Result<usize> {
        self.stream(id, side)?.len().ok_or_else(|| {
            ManifestError::MissingField {
                id: id.to_string(),
                what: format!("{}[0].shape[0]", side.as_str()),
            }
            .into()
        })
    }

    /// Dimension of the first stream of `side`.
    pub fn dim_of(&self, id: &str, side: Side) -> Result<usize> {
        self.stream(id, side)?.dim().ok_or_else(|| {
            ManifestError::MissingField {
                id: id.to_string(),
                what: format!("{}[0].shape[1]", side.as_str()),
            }
            .into()
        })
    }
}

/// Utterance id paired with its entry.
pub type Entry = (String, Utterance);

/// Corpus manifest, ordered by utterance id.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Manifest {
    pub utts: BTreeMap<String, Utterance>,
}

impl Manifest {
    /// Load a manifest from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Self = serde_json::from_str(&text)?;

        tracing::info!(path = %path.display(), utts = manifest.len(), "loaded manifest");
        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.utts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.utts.keys().map(String::as_str)
    }

    /// Entries in id order.
    pub fn entries(&self) -> Vec<Entry> {
        self.utts
            .iter()
            .map(|(id, utt)| (id.clone(), utt.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "utts": {
            "utt_b": {
                "input": [{"name": "input1", "shape": [120, 40], "feat": "b.npy"}],
                "output": [{"name": "target1", "shape": [5, 30], "tokenid": "1 2 3 4 5"}]
            },
            "utt_a": {
                "input": [{"name": "input1", "shape": [80, 40], "feat": "a.npy"}],
                "output": [{"name": "target1", "shape": [3, 30], "tokenid": "7 8 9"}],
                "category": "read"
            }
        }
    }"#;

    #[test]
    fn orders_by_id() {
        let manifest: Manifest = serde_json::from_str(MANIFEST).unwrap();

        assert_eq!(manifest.ids().collect::<Vec<_>>(), vec!["utt_a", "utt_b"]);
        assert_eq!(manifest.utts["utt_a"].category.as_deref(), Some("read"));
    }

    #[test]
    fn stream_lengths() {
        let manifest: Manifest = serde_json::from_str(MANIFEST).unwrap();
        let utt = &manifest.utts["utt_b"];

        assert_eq!(utt.len_of("utt_b", Side::Input).unwrap(), 120);
        assert_eq!(utt.dim_of("utt_b", Side::Input).unwrap(), 40);
        assert_eq!(utt.len_of("utt_b", Side::Output).unwrap(), 5);
    }

    #[test]
    fn missing_stream_is_reported() {
        let utt = Utterance::default();

        let err = utt.len_of("empty", Side::Input).unwrap_err();
        assert!(err.to_string().contains("input[0]"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let first = Manifest::from_file(&path).unwrap();
        let second = Manifest::from_file(&path).unwrap();

        assert!(first.ids().eq(second.ids()));
    }
}
