//! Node types for the in-memory filesystem tree.
//!
//! Nodes live in an arena keyed by `NodeId`; parent links are plain ids so
//! the child map stays the only owner of a subtree.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque node identifier, unique within one filesystem instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// Kind-specific payload.
#[derive(Debug, Clone)]
pub(crate) enum NodePayload {
    File {
        content: String,
    },
    Folder {
        /// Child name -> child id. `BTreeMap` keeps serialization
        /// deterministic; listings apply their own sort contract.
        children: BTreeMap<String, NodeId>,
    },
}

/// One file or folder in the tree.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub id: NodeId,
    /// Path segment, unique among siblings.
    pub name: String,
    /// Normalized absolute path; kept consistent with the parent chain.
    pub path: String,
    /// None only for the root.
    pub parent: Option<NodeId>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub payload: NodePayload,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.payload {
            NodePayload::File { .. } => NodeKind::File,
            NodePayload::Folder { .. } => NodeKind::Folder,
        }
    }

    /// Content byte length for files, 0 for folders.
    pub fn size(&self) -> u64 {
        match &self.payload {
            NodePayload::File { content } => content.len() as u64,
            NodePayload::Folder { .. } => 0,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.payload {
            NodePayload::Folder { children } => Some(children),
            NodePayload::File { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut BTreeMap<String, NodeId>> {
        match &mut self.payload {
            NodePayload::Folder { children } => Some(children),
            NodePayload::File { .. } => None,
        }
    }
}

/// One entry of a non-recursive folder listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderEntry {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    /// Content byte length; 0 for folders.
    pub size: u64,
    pub modified_at: DateTime<Utc>,
    /// Display-icon tag for the explorer view.
    pub icon: &'static str,
    /// File extension, when the name has one.
    pub extension: Option<String>,
}

/// Metadata for a single node.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Extension of a file name, if it has a non-empty stem and suffix.
pub(crate) fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| ext)
}

/// Display-icon tag for the explorer view.
pub(crate) fn icon_for(kind: NodeKind, name: &str) -> &'static str {
    match kind {
        NodeKind::Folder => "folder",
        NodeKind::File => match extension(name) {
            Some("txt" | "md" | "log") => "text",
            Some("bmp" | "gif" | "jpg" | "jpeg" | "png" | "ico") => "image",
            Some("exe" | "bat" | "com") => "program",
            Some("ini" | "cfg" | "toml") => "settings",
            _ => "file",
        },
    }
}
