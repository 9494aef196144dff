//! Filesystem change events.
//!
//! Mutating operations broadcast a `VfsEvent` so UI collaborators (file
//! explorer, notepad) can refresh their views. Subscribers that lag or drop
//! their receiver never affect the mutation or other subscribers.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VfsEventKind {
    FileCreated,
    FileModified,
    FileDeleted,
    FolderCreated,
    FolderDeleted,
    ItemRenamed,
    ItemMoved,
}

/// A single filesystem change notification.
#[derive(Debug, Clone)]
pub struct VfsEvent {
    pub kind: VfsEventKind,
    /// Path of the affected node (the new path for renames and moves).
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// Broadcast bus for filesystem events.
pub(crate) struct EventBus {
    tx: broadcast::Sender<VfsEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VfsEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, kind: VfsEventKind, path: impl Into<String>) {
        // No receivers is fine; delivery never affects the mutation.
        let _ = self.tx.send(VfsEvent {
            kind,
            path: path.into(),
            timestamp: Utc::now(),
        });
    }
}
