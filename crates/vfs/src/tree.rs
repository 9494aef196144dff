//! Arena-backed filesystem tree.
//!
//! Owns every node plus a flat path index mirroring the reachable set, so
//! path resolution is a single map lookup instead of a walk. Structural
//! operations here keep both views consistent; the `VirtualFileSystem`
//! facade layers locking, events, and persistence on top.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;

use crate::error::{VfsError, VfsResult};
use crate::node::{Node, NodeId, NodePayload};
use crate::path;

/// The in-memory tree: node arena plus path index.
pub(crate) struct VfsTree {
    pub nodes: HashMap<NodeId, Node>,
    pub by_path: HashMap<String, NodeId>,
    pub root: NodeId,
    next_id: u64,
}

impl VfsTree {
    /// Create a tree holding only the root folder.
    pub fn new() -> Self {
        let root = NodeId(0);
        let now = Utc::now();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                id: root,
                name: "/".to_string(),
                path: "/".to_string(),
                parent: None,
                created_at: now,
                modified_at: now,
                payload: NodePayload::Folder {
                    children: BTreeMap::new(),
                },
            },
        );
        let mut by_path = HashMap::new();
        by_path.insert("/".to_string(), root);
        Self {
            nodes,
            by_path,
            root,
            next_id: 1,
        }
    }

    /// Create the default tree shipped on first run (and when stored data
    /// is unreadable): a few folders and sample documents.
    pub fn default_tree() -> Self {
        let mut tree = Self::new();
        for folder in ["/documents", "/pictures", "/programs", "/documents/work"] {
            let parent = tree.ensure_folder(&path::dirname(folder)).unwrap_or(tree.root);
            let _ = tree.insert_child(
                parent,
                &path::basename(folder),
                NodePayload::Folder {
                    children: BTreeMap::new(),
                },
            );
        }
        let samples = [
            (
                "/documents/welcome.txt",
                "Welcome to RetroDesk!\r\n\r\nDouble-click a file to open it in Notepad.\r\n",
            ),
            (
                "/documents/readme.txt",
                "RetroDesk tips:\r\n- Right-click the desktop for options\r\n- Files live in My Documents\r\n- Everything is saved automatically\r\n",
            ),
            (
                "/documents/work/todo.txt",
                "TODO:\r\n[ ] Defragment hard drive\r\n[ ] Reply to email\r\n[x] Install RetroDesk\r\n",
            ),
        ];
        for (file, content) in samples {
            let parent = tree.ensure_folder(&path::dirname(file)).unwrap_or(tree.root);
            let _ = tree.insert_child(
                parent,
                &path::basename(file),
                NodePayload::File {
                    content: content.to_string(),
                },
            );
        }
        tree
    }

    pub fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Resolve a normalized path to a node id.
    pub fn resolve(&self, normalized: &str) -> Option<NodeId> {
        self.by_path.get(normalized).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Attach a new node under `parent`. The caller has already checked for
    /// name collisions; a colliding insert replaces nothing and fails.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        name: &str,
        payload: NodePayload,
    ) -> VfsResult<NodeId> {
        if name.is_empty() || name == "/" || name.contains('/') {
            return Err(VfsError::InvalidName(name.to_string()));
        }
        let parent_path = self
            .node(parent)
            .map(|node| node.path.clone())
            .ok_or_else(|| VfsError::NotFound(name.to_string()))?;
        let child_path = path::join([parent_path.as_str(), name]);
        if self.by_path.contains_key(&child_path) {
            return Err(VfsError::NameAlreadyExists(name.to_string()));
        }

        let id = self.alloc_id();
        let now = Utc::now();
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.to_string(),
                path: child_path.clone(),
                parent: Some(parent),
                created_at: now,
                modified_at: now,
                payload,
            },
        );
        self.by_path.insert(child_path, id);
        if let Some(children) = self.nodes.get_mut(&parent).and_then(Node::children_mut) {
            children.insert(name.to_string(), id);
        }
        Ok(id)
    }

    /// Resolve a folder path, creating every missing ancestor on the way.
    ///
    /// Fails with `NotAFolder` when a path component exists as a file.
    pub fn ensure_folder(&mut self, normalized: &str) -> VfsResult<NodeId> {
        let mut current = self.root;
        let mut current_path = String::from("/");
        for segment in path::split(normalized) {
            current_path = path::join([current_path.as_str(), segment.as_str()]);
            match self.resolve(&current_path) {
                Some(id) => {
                    let node = self
                        .node(id)
                        .ok_or_else(|| VfsError::NotFound(current_path.clone()))?;
                    if node.children().is_none() {
                        return Err(VfsError::NotAFolder(current_path));
                    }
                    current = id;
                }
                None => {
                    current = self.insert_child(
                        current,
                        &segment,
                        NodePayload::Folder {
                            children: BTreeMap::new(),
                        },
                    )?;
                }
            }
        }
        Ok(current)
    }

    /// Detach a node from its parent's child map and bump the parent's
    /// modified time. The node itself stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some((parent, name)) = self
            .node(id)
            .and_then(|node| node.parent.map(|parent| (parent, node.name.clone())))
        else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.modified_at = Utc::now();
            if let Some(children) = parent_node.children_mut() {
                children.remove(&name);
            }
        }
    }

    /// Remove a node and its entire subtree from the arena and path index.
    pub fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                self.by_path.remove(&node.path);
                if let NodePayload::Folder { children } = node.payload {
                    stack.extend(children.into_values());
                }
            }
        }
    }

    /// Rewrite the paths of `id` and every descendant to sit under
    /// `new_path`, reindexing the path map as it goes.
    pub fn reindex_subtree(&mut self, id: NodeId, new_path: String) {
        let mut stack = vec![(id, new_path)];
        while let Some((id, new_path)) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&id) {
                let old_path = std::mem::replace(&mut node.path, new_path.clone());
                if let Some(children) = node.children() {
                    for (name, child) in children {
                        stack.push((*child, path::join([new_path.as_str(), name.as_str()])));
                    }
                }
                self.by_path.remove(&old_path);
                self.by_path.insert(new_path, id);
            }
        }
    }

    /// True when `candidate` is `ancestor` itself or sits below it.
    pub fn is_self_or_descendant(&self, ancestor_path: &str, candidate_path: &str) -> bool {
        candidate_path == ancestor_path
            || candidate_path.starts_with(&format!("{ancestor_path}/"))
            || ancestor_path == "/"
    }
}
