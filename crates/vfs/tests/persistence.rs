//! Persistence behavior across filesystem instances sharing one store.

use std::sync::Arc;

use retrodesk_storage::{MemoryStorage, StorageBackend, VFS_DATA_KEY};
use retrodesk_vfs::{NodeKind, VirtualFileSystem};

/// A store whose writes always fail, for checking that persistence errors
/// never surface through filesystem operations.
struct BrokenStorage;

impl StorageBackend for BrokenStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("disk on fire")
    }

    fn remove(&self, _key: &str) -> anyhow::Result<()> {
        anyhow::bail!("disk on fire")
    }
}

#[test]
fn state_survives_reload_from_shared_storage() {
    let storage = Arc::new(MemoryStorage::new());

    {
        let fs = VirtualFileSystem::load(storage.clone());
        fs.write_file("/documents/memo.txt", "multi-byte ✓ コンテンツ")
            .unwrap();
        fs.create_folder("/documents/archive").unwrap();
    }

    let fs = VirtualFileSystem::load(storage);
    assert_eq!(
        fs.read_file("/documents/memo.txt").unwrap(),
        "multi-byte ✓ コンテンツ"
    );
    assert_eq!(fs.metadata("/documents/archive").unwrap().kind, NodeKind::Folder);
}

#[test]
fn reload_preserves_timestamps() {
    let storage = Arc::new(MemoryStorage::new());

    let created = {
        let fs = VirtualFileSystem::load(storage.clone());
        fs.write_file("/stamp.txt", "x").unwrap();
        fs.metadata("/stamp.txt").unwrap().created_at
    };

    let fs = VirtualFileSystem::load(storage);
    assert_eq!(fs.metadata("/stamp.txt").unwrap().created_at, created);
}

#[test]
fn corrupt_stored_data_falls_back_to_default_tree() {
    let storage = Arc::new(MemoryStorage::with_entries(vec![(
        VFS_DATA_KEY,
        "{ this is not json",
    )]));

    let fs = VirtualFileSystem::load(storage.clone());
    assert!(fs.exists("/documents"));

    // The default tree was persisted back
    let raw = storage.get(VFS_DATA_KEY).unwrap();
    assert!(raw.contains("documents"));
}

#[test]
fn storage_failure_does_not_fail_mutations() {
    let fs = VirtualFileSystem::load(Arc::new(BrokenStorage));

    fs.write_file("/still/works.txt", "in memory").unwrap();
    assert_eq!(fs.read_file("/still/works.txt").unwrap(), "in memory");

    fs.delete_item("/still").unwrap();
    assert!(!fs.exists("/still/works.txt"));
}
