//! Provider capability boundary.
//!
//! Every AI backend implements the same four-operation interface; the
//! client orchestrates on top without knowing which backend it talks to.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

/// The four AI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Summarize,
    Rewrite,
    Interpret,
    ExplainFolder,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Rewrite => "rewrite",
            Self::Interpret => "interpret",
            Self::ExplainFolder => "explainFolder",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured interpretation of a natural-language query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// What the user wants, e.g. `open_app` or `create_folder`.
    pub action: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Operation-specific parameters, e.g. a target path.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Intent {
    /// The "no idea" intent used as the fallback result.
    pub fn unknown() -> Self {
        Self {
            action: "unknown".to_string(),
            confidence: 0.0,
            parameters: BTreeMap::new(),
        }
    }
}

/// Explanation of a folder's contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderExplanation {
    pub description: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub path: String,
}

/// Flat snapshot of a folder handed to `explain_folder`.
///
/// Decoupled from the VFS listing type so providers stay independent of the
/// filesystem crate; the shell does the bridging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSnapshot {
    pub path: String,
    pub entries: Vec<FolderSnapshotEntry>,
}

/// One entry of a folder snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSnapshotEntry {
    pub name: String,
    pub kind: String,
    pub size: u64,
}

impl FolderSnapshot {
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.kind == "file").count()
    }

    pub fn folder_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.kind == "folder").count()
    }
}

/// AI backend interface.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name for logging and diagnostics.
    fn name(&self) -> &str;

    /// Condense text into a short summary.
    async fn summarize(&self, text: &str) -> Result<String, AiError>;

    /// Rewrite text, optionally in a named style ("formal", "casual", ...).
    async fn rewrite(&self, text: &str, style: Option<&str>) -> Result<String, AiError>;

    /// Map a natural-language query to a structured intent.
    async fn interpret(&self, query: &str) -> Result<Intent, AiError>;

    /// Describe a folder and suggest how to organize it.
    async fn explain_folder(&self, folder: &FolderSnapshot) -> Result<FolderExplanation, AiError>;
}
