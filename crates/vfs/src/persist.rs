//! Whole-tree JSON persistence.
//!
//! The tree is stored as one recursive JSON document: timestamps as RFC 3339
//! strings, folder children as a name-keyed object. Parent back-references,
//! node ids, and the path index are not stored; they are rebuilt during
//! deserialization.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::node::{NodeId, NodeKind, NodePayload};
use crate::tree::VfsTree;

/// Serialized form of one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersistedNode {
    pub name: String,
    pub kind: NodeKind,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, PersistedNode>>,
}

/// Top-level persisted document.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedTree {
    pub root: PersistedNode,
}

/// Serialize the whole tree to a JSON string.
pub(crate) fn encode(tree: &VfsTree) -> Option<String> {
    let root = encode_node(tree, tree.root)?;
    serde_json::to_string(&PersistedTree { root }).ok()
}

fn encode_node(tree: &VfsTree, id: NodeId) -> Option<PersistedNode> {
    let node = tree.node(id)?;
    let (content, children) = match &node.payload {
        NodePayload::File { content } => (Some(content.clone()), None),
        NodePayload::Folder { children } => {
            let mut encoded = BTreeMap::new();
            for (name, child) in children {
                encoded.insert(name.clone(), encode_node(tree, *child)?);
            }
            (None, Some(encoded))
        }
    };
    Some(PersistedNode {
        name: node.name.clone(),
        kind: node.kind(),
        created_at: node.created_at,
        modified_at: node.modified_at,
        content,
        children,
    })
}

/// Deserialize a stored document back into a tree.
///
/// Returns `None` for unparseable JSON or a structurally incomplete payload
/// (root missing or not a folder, files without content, folders without a
/// child map); callers fall back to the default tree.
pub(crate) fn decode(raw: &str) -> Option<VfsTree> {
    let doc: PersistedTree = serde_json::from_str(raw).ok()?;
    if doc.root.kind != NodeKind::Folder {
        return None;
    }

    let mut tree = VfsTree::new();
    {
        let root = tree.root;
        let root_node = tree.node_mut(root)?;
        root_node.created_at = doc.root.created_at;
        root_node.modified_at = doc.root.modified_at;
    }
    let root = tree.root;
    let root_children = doc.root.children?;
    for (name, child) in &root_children {
        decode_into(&mut tree, root, name, child)?;
    }
    Some(tree)
}

fn decode_into(
    tree: &mut VfsTree,
    parent: NodeId,
    name: &str,
    persisted: &PersistedNode,
) -> Option<()> {
    let payload = match persisted.kind {
        NodeKind::File => NodePayload::File {
            content: persisted.content.clone()?,
        },
        NodeKind::Folder => NodePayload::Folder {
            children: BTreeMap::new(),
        },
    };
    let id = tree.insert_child(parent, name, payload).ok()?;
    if let Some(node) = tree.node_mut(id) {
        node.created_at = persisted.created_at;
        node.modified_at = persisted.modified_at;
    }
    if persisted.kind == NodeKind::Folder {
        let children = persisted.children.as_ref()?;
        for (child_name, child) in children {
            decode_into(tree, id, child_name, child)?;
        }
    }
    Some(())
}
