//! Path-addressed CRUD facade over the in-memory tree.
//!
//! Owns persistence and change notification: every successful mutation is
//! serialized to storage (best effort) and broadcast to subscribers. The
//! tree sits behind an `RwLock`; operations are synchronous and never hold
//! the lock across an await point.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::warn;

use retrodesk_storage::{StorageBackend, VFS_DATA_KEY};

use crate::error::{VfsError, VfsResult};
use crate::event::{EventBus, VfsEvent, VfsEventKind};
use crate::node::{extension, icon_for, FolderEntry, Metadata, Node, NodeKind, NodePayload};
use crate::path;
use crate::persist;
use crate::tree::VfsTree;

/// The virtual filesystem.
pub struct VirtualFileSystem {
    tree: RwLock<VfsTree>,
    storage: Arc<dyn StorageBackend>,
    events: EventBus,
}

impl VirtualFileSystem {
    /// Load the tree from storage, falling back to the default tree when
    /// the stored payload is missing or unreadable.
    pub fn load(storage: Arc<dyn StorageBackend>) -> Self {
        let (tree, needs_persist) = match storage.get(VFS_DATA_KEY) {
            Some(raw) => match persist::decode(&raw) {
                Some(tree) => (tree, false),
                None => {
                    warn!("stored filesystem data is unreadable, starting from the default tree");
                    (VfsTree::default_tree(), true)
                }
            },
            None => (VfsTree::default_tree(), true),
        };

        let fs = Self {
            tree: RwLock::new(tree),
            storage,
            events: EventBus::new(),
        };
        if needs_persist {
            let tree = fs.read_tree();
            fs.persist(&tree);
        }
        fs
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<VfsEvent> {
        self.events.subscribe()
    }

    /// Non-recursive listing of a folder, folders before files, then
    /// case-sensitive name order. The ordering is a contract the explorer
    /// view relies on.
    pub fn read_folder(&self, folder_path: &str) -> VfsResult<Vec<FolderEntry>> {
        let folder_path = path::normalize(folder_path);
        let tree = self.read_tree();
        let id = tree
            .resolve(&folder_path)
            .ok_or_else(|| VfsError::NotFound(folder_path.clone()))?;
        let node = tree
            .node(id)
            .ok_or_else(|| VfsError::NotFound(folder_path.clone()))?;
        let children = node
            .children()
            .ok_or_else(|| VfsError::NotAFolder(folder_path.clone()))?;

        let mut entries: Vec<FolderEntry> = children
            .values()
            .filter_map(|child_id| tree.node(*child_id))
            .map(|child| FolderEntry {
                id: child.id,
                name: child.name.clone(),
                path: child.path.clone(),
                kind: child.kind(),
                size: child.size(),
                modified_at: child.modified_at,
                icon: icon_for(child.kind(), &child.name),
                extension: match child.kind() {
                    NodeKind::File => extension(&child.name).map(String::from),
                    NodeKind::Folder => None,
                },
            })
            .collect();

        let rank = |entry: &FolderEntry| match entry.kind {
            NodeKind::Folder => 0,
            NodeKind::File => 1,
        };
        entries.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Read a file's content.
    pub fn read_file(&self, file_path: &str) -> VfsResult<String> {
        let file_path = path::normalize(file_path);
        let tree = self.read_tree();
        let id = tree
            .resolve(&file_path)
            .ok_or_else(|| VfsError::NotFound(file_path.clone()))?;
        match tree.node(id).map(|node| &node.payload) {
            Some(NodePayload::File { content }) => Ok(content.clone()),
            Some(NodePayload::Folder { .. }) => Err(VfsError::NotAFile(file_path)),
            None => Err(VfsError::NotFound(file_path)),
        }
    }

    /// Create or overwrite a file, creating missing parent folders as
    /// needed.
    pub fn write_file(&self, file_path: &str, content: &str) -> VfsResult<()> {
        let file_path = path::normalize(file_path);
        let mut tree = self.write_tree();

        let kind = match tree.resolve(&file_path) {
            Some(id) => {
                let node = tree
                    .node_mut(id)
                    .ok_or_else(|| VfsError::NotFound(file_path.clone()))?;
                match &mut node.payload {
                    NodePayload::File { content: existing } => {
                        *existing = content.to_string();
                        node.modified_at = Utc::now();
                        VfsEventKind::FileModified
                    }
                    NodePayload::Folder { .. } => return Err(VfsError::NotAFile(file_path)),
                }
            }
            None => {
                let parent = tree.ensure_folder(&path::dirname(&file_path))?;
                tree.insert_child(
                    parent,
                    &path::basename(&file_path),
                    NodePayload::File {
                        content: content.to_string(),
                    },
                )?;
                VfsEventKind::FileCreated
            }
        };

        self.persist(&tree);
        self.events.emit(kind, file_path);
        Ok(())
    }

    /// Create a folder, creating missing ancestors as needed.
    pub fn create_folder(&self, folder_path: &str) -> VfsResult<()> {
        let folder_path = path::normalize(folder_path);
        let mut tree = self.write_tree();
        if tree.resolve(&folder_path).is_some() {
            return Err(VfsError::AlreadyExists(folder_path));
        }
        tree.ensure_folder(&folder_path)?;

        self.persist(&tree);
        self.events.emit(VfsEventKind::FolderCreated, folder_path);
        Ok(())
    }

    /// Delete a file or folder. Deleting a folder removes every descendant
    /// with a single event for the folder itself.
    pub fn delete_item(&self, item_path: &str) -> VfsResult<()> {
        let item_path = path::normalize(item_path);
        if item_path == "/" {
            return Err(VfsError::CannotDeleteRoot);
        }
        let mut tree = self.write_tree();
        let id = tree
            .resolve(&item_path)
            .ok_or_else(|| VfsError::NotFound(item_path.clone()))?;
        let kind = match tree.node(id).map(Node::kind) {
            Some(kind) => kind,
            None => return Err(VfsError::NotFound(item_path)),
        };

        tree.detach(id);
        tree.remove_subtree(id);

        let event = match kind {
            NodeKind::File => VfsEventKind::FileDeleted,
            NodeKind::Folder => VfsEventKind::FolderDeleted,
        };
        self.persist(&tree);
        self.events.emit(event, item_path);
        Ok(())
    }

    /// Rename a file or folder in place. Every descendant path is
    /// rewritten.
    pub fn rename_item(&self, item_path: &str, new_name: &str) -> VfsResult<()> {
        let item_path = path::normalize(item_path);
        if item_path == "/" {
            return Err(VfsError::CannotRenameRoot);
        }
        if new_name.is_empty() || new_name.contains('/') {
            return Err(VfsError::InvalidName(new_name.to_string()));
        }

        let mut tree = self.write_tree();
        let id = tree
            .resolve(&item_path)
            .ok_or_else(|| VfsError::NotFound(item_path.clone()))?;
        let parent = match tree.node(id).and_then(|node| node.parent) {
            Some(parent) => parent,
            None => return Err(VfsError::CannotRenameRoot),
        };
        let parent_path = tree
            .node(parent)
            .map(|node| node.path.clone())
            .ok_or_else(|| VfsError::NotFound(item_path.clone()))?;
        let has_sibling = tree
            .node(parent)
            .and_then(|node| node.children())
            .is_some_and(|children| children.contains_key(new_name));
        if has_sibling {
            return Err(VfsError::NameAlreadyExists(new_name.to_string()));
        }

        tree.detach(id);
        let new_path = path::join([parent_path.as_str(), new_name]);
        if let Some(node) = tree.node_mut(id) {
            node.name = new_name.to_string();
            node.modified_at = Utc::now();
        }
        tree.reindex_subtree(id, new_path.clone());
        if let Some(children) = tree.node_mut(parent).and_then(Node::children_mut) {
            children.insert(new_name.to_string(), id);
        }

        self.persist(&tree);
        self.events.emit(VfsEventKind::ItemRenamed, new_path);
        Ok(())
    }

    /// Move a file or folder under another folder, keeping its name.
    pub fn move_item(&self, source_path: &str, dest_folder: &str) -> VfsResult<()> {
        let source_path = path::normalize(source_path);
        let dest_folder = path::normalize(dest_folder);

        let mut tree = self.write_tree();
        let source = tree
            .resolve(&source_path)
            .ok_or_else(|| VfsError::NotFound(source_path.clone()))?;
        let dest = tree
            .resolve(&dest_folder)
            .ok_or_else(|| VfsError::DestinationNotFound(dest_folder.clone()))?;
        if tree.node(dest).and_then(|node| node.children()).is_none() {
            return Err(VfsError::DestinationNotAFolder(dest_folder));
        }
        if tree.is_self_or_descendant(&source_path, &dest_folder) {
            return Err(VfsError::CannotMoveIntoSelf(source_path));
        }

        let name = tree
            .node(source)
            .map(|node| node.name.clone())
            .ok_or_else(|| VfsError::NotFound(source_path.clone()))?;
        let collision = tree
            .node(dest)
            .and_then(|node| node.children())
            .is_some_and(|children| children.contains_key(&name));
        if collision {
            return Err(VfsError::DestinationAlreadyExists(path::join([
                dest_folder.as_str(),
                name.as_str(),
            ])));
        }

        tree.detach(source);
        if let Some(node) = tree.node_mut(source) {
            node.parent = Some(dest);
        }
        if let Some(dest_node) = tree.node_mut(dest) {
            dest_node.modified_at = Utc::now();
            if let Some(children) = dest_node.children_mut() {
                children.insert(name.clone(), source);
            }
        }
        let new_path = path::join([dest_folder.as_str(), name.as_str()]);
        tree.reindex_subtree(source, new_path.clone());

        self.persist(&tree);
        self.events.emit(VfsEventKind::ItemMoved, new_path);
        Ok(())
    }

    /// True when a node exists at the path. Never errors, whatever the
    /// input looks like.
    pub fn exists(&self, item_path: &str) -> bool {
        let item_path = path::normalize(item_path);
        self.read_tree().resolve(&item_path).is_some()
    }

    /// Metadata for a single node.
    pub fn metadata(&self, item_path: &str) -> VfsResult<Metadata> {
        let item_path = path::normalize(item_path);
        let tree = self.read_tree();
        let id = tree
            .resolve(&item_path)
            .ok_or_else(|| VfsError::NotFound(item_path.clone()))?;
        let node = tree
            .node(id)
            .ok_or_else(|| VfsError::NotFound(item_path))?;
        Ok(Metadata {
            name: node.name.clone(),
            path: node.path.clone(),
            kind: node.kind(),
            size: node.size(),
            created_at: node.created_at,
            modified_at: node.modified_at,
        })
    }

    fn read_tree(&self) -> RwLockReadGuard<'_, VfsTree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tree(&self) -> RwLockWriteGuard<'_, VfsTree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best-effort persistence: a failed save is logged and swallowed, the
    /// in-memory tree stays authoritative for the rest of the session.
    fn persist(&self, tree: &VfsTree) {
        match persist::encode(tree) {
            Some(raw) => {
                if let Err(err) = self.storage.set(VFS_DATA_KEY, &raw) {
                    warn!("failed to persist filesystem tree: {err:#}");
                }
            }
            None => warn!("failed to serialize filesystem tree"),
        }
    }
}
