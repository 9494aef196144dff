//! AI assistance layer for retrodesk.
//!
//! Four operations (summarize, rewrite, interpret, explain-folder) over a
//! swappable provider, orchestrated with caching, timeout racing,
//! cooperative cancellation, usage tracking, and typed fallbacks.

pub mod cache;
pub mod client;
pub mod error;
pub mod provider;
pub mod providers;
pub mod usage;

pub use cache::ResponseCache;
pub use client::{AiClient, AiConfig, ProviderKind};
pub use error::AiError;
pub use provider::{
    AiProvider, FolderExplanation, FolderSnapshot, FolderSnapshotEntry, Intent, Operation,
};
pub use providers::{MockProvider, OpenAiProvider, TestProvider};
pub use usage::{UsageStats, UsageTracker};

// Cancellation is part of the public operation surface.
pub use tokio_util::sync::CancellationToken;
