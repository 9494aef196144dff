//! AI usage accounting.
//!
//! Counts operations and BPE tokens, persisted after every mutation so the
//! numbers survive restarts.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;
use tracing::warn;

use retrodesk_storage::{StorageBackend, USAGE_STATS_KEY};

/// Shared tokenizer; building the BPE tables is expensive, parse once.
static BPE: Lazy<Option<CoreBPE>> = Lazy::new(|| tiktoken_rs::cl100k_base().ok());

/// Count BPE tokens in `text`, falling back to a bytes/4 estimate if the
/// tokenizer could not be built.
pub fn count_tokens(text: &str) -> u64 {
    match BPE.as_ref() {
        Some(bpe) => bpe.encode_ordinary(text).len() as u64,
        None => (text.len() / 4) as u64,
    }
}

/// Aggregate usage numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_operations: u64,
    pub total_tokens: u64,
    #[serde(default)]
    pub operations_by_type: BTreeMap<String, u64>,
    pub last_updated: DateTime<Utc>,
}

impl Default for UsageStats {
    fn default() -> Self {
        Self {
            total_operations: 0,
            total_tokens: 0,
            operations_by_type: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

/// Tracks per-operation usage, persisted under `ai-usage-stats`.
pub struct UsageTracker {
    stats: Mutex<UsageStats>,
    storage: Arc<dyn StorageBackend>,
}

impl UsageTracker {
    /// Rehydrate stats from storage; absent or corrupt data starts from
    /// zero.
    pub fn load(storage: Arc<dyn StorageBackend>) -> Self {
        let stats = storage
            .get(USAGE_STATS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            stats: Mutex::new(stats),
            storage,
        }
    }

    /// Record one operation and its token count, then persist.
    pub fn track(&self, operation: &str, tokens: u64) {
        let snapshot = {
            let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
            stats.total_operations += 1;
            stats.total_tokens += tokens;
            *stats.operations_by_type.entry(operation.to_string()).or_insert(0) += 1;
            stats.last_updated = Utc::now();
            stats.clone()
        };
        self.persist(&snapshot);
    }

    /// Current stats snapshot.
    pub fn stats(&self) -> UsageStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn persist(&self, stats: &UsageStats) {
        match serde_json::to_string(stats) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(USAGE_STATS_KEY, &raw) {
                    warn!("failed to persist usage stats: {err:#}");
                }
            }
            Err(err) => warn!("failed to serialize usage stats: {err}"),
        }
    }
}
