//! Key-value persistence for retrodesk
//!
//! The desktop core persists a small number of opaque blobs: the serialized
//! filesystem tree and the AI usage statistics. Everything goes through the
//! `StorageBackend` trait so the rest of the workspace never touches disk
//! directly:
//!
//! - `SqliteStorage`: durable store in the user's config directory
//! - `MemoryStorage`: ephemeral store for tests and throwaway sessions

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use anyhow::Result;

/// Storage key for the serialized filesystem tree.
pub const VFS_DATA_KEY: &str = "vfs-data";

/// Storage key for the AI usage statistics.
pub const USAGE_STATS_KEY: &str = "ai-usage-stats";

/// Key-value storage boundary.
///
/// Writes are best-effort from the caller's point of view: the VFS and the
/// usage tracker catch and log `set` failures rather than rolling back
/// in-memory state.
pub trait StorageBackend: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<()>;
}
