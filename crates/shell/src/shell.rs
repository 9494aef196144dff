//! Dependency wiring for the desktop core.
//!
//! One `Shell` owns the filesystem and the AI client, both built from a
//! single `Config` and sharing one storage backend. UI layers receive the
//! `Shell` by injection; nothing in the workspace is a global.

use std::sync::Arc;

use anyhow::{Context, Result};

use retrodesk_ai::{AiClient, AiConfig, FolderSnapshot, FolderSnapshotEntry, ProviderKind};
use retrodesk_storage::{MemoryStorage, SqliteStorage, StorageBackend};
use retrodesk_vfs::{NodeKind, VfsResult, VirtualFileSystem};

use crate::config::Config;

/// The wired-up desktop core.
pub struct Shell {
    vfs: Arc<VirtualFileSystem>,
    ai: AiClient,
}

impl Shell {
    /// Build the core from configuration: open storage, load the
    /// filesystem, construct the AI client.
    pub fn init(config: &Config) -> Result<Self> {
        let storage: Arc<dyn StorageBackend> = match &config.storage.path {
            Some(path) => Arc::new(
                SqliteStorage::open(path)
                    .with_context(|| format!("opening storage at {}", path.display()))?,
            ),
            None => Arc::new(SqliteStorage::new().context("opening default storage")?),
        };

        let vfs = Arc::new(VirtualFileSystem::load(storage.clone()));
        let ai = AiClient::new(config.to_ai_config(), storage);
        Ok(Self { vfs, ai })
    }

    /// Fully in-memory core (mock provider, ephemeral storage) for tests
    /// and demos.
    pub fn in_memory() -> Self {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let vfs = Arc::new(VirtualFileSystem::load(storage.clone()));
        let ai = AiClient::new(
            AiConfig {
                provider: ProviderKind::Mock,
                ..AiConfig::default()
            },
            storage,
        );
        Self { vfs, ai }
    }

    pub fn vfs(&self) -> &VirtualFileSystem {
        &self.vfs
    }

    /// Shared handle for UI collaborators that outlive a borrow.
    pub fn vfs_handle(&self) -> Arc<VirtualFileSystem> {
        self.vfs.clone()
    }

    pub fn ai(&self) -> &AiClient {
        &self.ai
    }

    /// Bridge a folder listing into the snapshot shape `explain_folder`
    /// consumes.
    pub fn snapshot_folder(&self, folder_path: &str) -> VfsResult<FolderSnapshot> {
        let entries = self.vfs.read_folder(folder_path)?;
        Ok(FolderSnapshot {
            path: retrodesk_vfs::path::normalize(folder_path),
            entries: entries
                .into_iter()
                .map(|entry| FolderSnapshotEntry {
                    name: entry.name,
                    kind: match entry.kind {
                        NodeKind::File => "file".to_string(),
                        NodeKind::Folder => "folder".to_string(),
                    },
                    size: entry.size,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrodesk_ai::CancellationToken;

    #[test]
    fn test_in_memory_shell_has_default_tree() {
        let shell = Shell::in_memory();
        assert!(shell.vfs().exists("/documents"));
        assert_eq!(shell.ai().provider_name(), "mock");
    }

    #[test]
    fn test_snapshot_folder_bridges_listing() {
        let shell = Shell::in_memory();
        shell.vfs().write_file("/snap/a.txt", "abc").unwrap();
        shell.vfs().create_folder("/snap/sub").unwrap();

        let snapshot = shell.snapshot_folder("/snap").unwrap();
        assert_eq!(snapshot.path, "/snap");
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.folder_count(), 1);
        assert_eq!(snapshot.file_count(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_explain() {
        let shell = Shell::in_memory();
        let snapshot = shell.snapshot_folder("/documents").unwrap();
        let cancel = CancellationToken::new();
        let explanation = shell.ai().explain_folder(&snapshot, &cancel).await.unwrap();
        assert_eq!(explanation.path, "/documents");
        assert!(!explanation.description.is_empty());
    }
}
