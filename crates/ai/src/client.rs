//! AI operation orchestration.
//!
//! `AiClient` wraps a provider with caching, timeout racing, cooperative
//! cancellation, usage tracking, and typed fallbacks. Callers never see an
//! error other than `Cancelled`: everything else degrades to an
//! operation-specific fallback value.

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use retrodesk_storage::StorageBackend;

use crate::cache::{ResponseCache, DEFAULT_CACHE_SIZE};
use crate::error::AiError;
use crate::provider::{AiProvider, FolderExplanation, FolderSnapshot, Intent, Operation};
use crate::providers::{MockProvider, OpenAiProvider, TestProvider};
use crate::usage::{count_tokens, UsageStats, UsageTracker};

/// Which backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Mock,
    Test,
    OpenAi,
    /// Declared but not implemented; maps to the mock provider.
    Anthropic,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mock" => Ok(Self::Mock),
            "test" => Ok(Self::Test),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: ProviderKind,
    /// Required for `openai`; absence falls back to the mock provider.
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Declared by the configuration surface but not consumed by the
    /// orchestration path; kept so existing configs round-trip.
    pub max_retries: u32,
    pub enable_cache: bool,
    pub cache_size: usize,
    pub enable_usage_tracking: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            enable_cache: true,
            cache_size: DEFAULT_CACHE_SIZE,
            enable_usage_tracking: true,
        }
    }
}

/// Orchestrating client over a swappable provider.
pub struct AiClient {
    provider: Arc<dyn AiProvider>,
    cache: Option<Mutex<ResponseCache>>,
    usage: Option<UsageTracker>,
    config: AiConfig,
}

impl AiClient {
    /// Build a client, constructing the provider from the config selector.
    pub fn new(config: AiConfig, storage: Arc<dyn StorageBackend>) -> Self {
        let provider = build_provider(&config);
        Self::with_provider(provider, config, storage)
    }

    /// Build a client around an injected provider (tests, embedders).
    pub fn with_provider(
        provider: Arc<dyn AiProvider>,
        config: AiConfig,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let cache = config
            .enable_cache
            .then(|| Mutex::new(ResponseCache::new(config.cache_size)));
        let usage = config
            .enable_usage_tracking
            .then(|| UsageTracker::load(storage));
        Self {
            provider,
            cache,
            usage,
            config,
        }
    }

    /// Name of the active provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Current usage stats, when tracking is enabled.
    pub fn usage_stats(&self) -> Option<UsageStats> {
        self.usage.as_ref().map(UsageTracker::stats)
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        if let Some(cache) = self.cache.as_ref() {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    /// Summarize a document.
    ///
    /// Cancel via the token; every failure other than cancellation resolves
    /// to a user-facing fallback sentence.
    pub async fn summarize(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AiError> {
        let input = json!({ "text": text });
        if let Some(hit) = self.cache_get::<String>(Operation::Summarize, &input) {
            return Ok(hit);
        }

        match self.race(cancel, self.provider.summarize(text)).await {
            Ok(summary) => {
                self.cache_put(Operation::Summarize, &input, &summary);
                self.track(Operation::Summarize, &[text, &summary]);
                Ok(summary)
            }
            Err(err) if err.is_cancelled() => Err(AiError::Cancelled),
            Err(err) => {
                warn!("summarize degraded to fallback: {err}");
                Ok("The document could not be summarized right now. Try again in a moment."
                    .to_string())
            }
        }
    }

    /// Rewrite text, optionally in a named style.
    pub async fn rewrite(
        &self,
        text: &str,
        style: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, AiError> {
        let input = json!({ "text": text, "style": style });
        if let Some(hit) = self.cache_get::<String>(Operation::Rewrite, &input) {
            return Ok(hit);
        }

        match self.race(cancel, self.provider.rewrite(text, style)).await {
            Ok(rewritten) => {
                self.cache_put(Operation::Rewrite, &input, &rewritten);
                self.track(Operation::Rewrite, &[text, &rewritten]);
                Ok(rewritten)
            }
            Err(err) if err.is_cancelled() => Err(AiError::Cancelled),
            Err(err) => {
                warn!("rewrite degraded to fallback: {err}");
                Ok("The text could not be rewritten right now. The original is unchanged."
                    .to_string())
            }
        }
    }

    /// Map a natural-language query to an intent.
    pub async fn interpret(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Intent, AiError> {
        let input = json!({ "query": query });
        if let Some(hit) = self.cache_get::<Intent>(Operation::Interpret, &input) {
            return Ok(hit);
        }

        match self.race(cancel, self.provider.interpret(query)).await {
            Ok(intent) => {
                self.cache_put(Operation::Interpret, &input, &intent);
                let rendered = serde_json::to_string(&intent).unwrap_or_default();
                self.track(Operation::Interpret, &[query, &rendered]);
                Ok(intent)
            }
            Err(err) if err.is_cancelled() => Err(AiError::Cancelled),
            Err(err) => {
                warn!("interpret degraded to fallback: {err}");
                Ok(Intent::unknown())
            }
        }
    }

    /// Describe a folder and suggest organization.
    pub async fn explain_folder(
        &self,
        folder: &FolderSnapshot,
        cancel: &CancellationToken,
    ) -> Result<FolderExplanation, AiError> {
        let input = json!(folder);
        if let Some(hit) = self.cache_get::<FolderExplanation>(Operation::ExplainFolder, &input) {
            return Ok(hit);
        }

        match self.race(cancel, self.provider.explain_folder(folder)).await {
            Ok(explanation) => {
                self.cache_put(Operation::ExplainFolder, &input, &explanation);
                let rendered = serde_json::to_string(&explanation).unwrap_or_default();
                self.track(Operation::ExplainFolder, &[&input.to_string(), &rendered]);
                Ok(explanation)
            }
            Err(err) if err.is_cancelled() => Err(AiError::Cancelled),
            Err(err) => {
                warn!("explain_folder degraded to fallback: {err}");
                Ok(FolderExplanation {
                    description: "This folder could not be analyzed right now.".to_string(),
                    recommendations: vec!["Try again in a moment.".to_string()],
                    path: folder.path.clone(),
                })
            }
        }
    }

    /// Race the provider call against the timeout and the cancellation
    /// token. Losing futures are dropped, which tears down their timers and
    /// listeners.
    async fn race<T>(
        &self,
        cancel: &CancellationToken,
        call: impl std::future::Future<Output = Result<T, AiError>>,
    ) -> Result<T, AiError> {
        tokio::select! {
            () = cancel.cancelled() => Err(AiError::Cancelled),
            outcome = tokio::time::timeout(self.config.timeout, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(AiError::Timeout(self.config.timeout)),
            },
        }
    }

    fn cache_get<T: DeserializeOwned>(
        &self,
        operation: Operation,
        input: &serde_json::Value,
    ) -> Option<T> {
        let cache = self.cache.as_ref()?;
        let key = ResponseCache::generate_key(operation.as_str(), input);
        let raw = cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)?;
        serde_json::from_str(&raw).ok()
    }

    fn cache_put<T: Serialize>(&self, operation: Operation, input: &serde_json::Value, value: &T) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let key = ResponseCache::generate_key(operation.as_str(), input);
        match serde_json::to_string(value) {
            Ok(raw) => cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .set(&key, raw),
            Err(err) => warn!("response not cacheable: {err}"),
        }
    }

    fn track(&self, operation: Operation, texts: &[&str]) {
        let Some(usage) = self.usage.as_ref() else {
            return;
        };
        let tokens = texts.iter().map(|text| count_tokens(text)).sum();
        usage.track(operation.as_str(), tokens);
    }
}

/// Construct the provider named by the config selector.
fn build_provider(config: &AiConfig) -> Arc<dyn AiProvider> {
    match config.provider {
        ProviderKind::Mock => Arc::new(MockProvider::new()),
        ProviderKind::Test => Arc::new(TestProvider::new()),
        ProviderKind::OpenAi => match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Arc::new(OpenAiProvider::new(key)),
            _ => {
                warn!("openai provider selected without an api key, using mock");
                Arc::new(MockProvider::new())
            }
        },
        ProviderKind::Anthropic => {
            warn!("anthropic provider is not implemented, using mock");
            Arc::new(MockProvider::new())
        }
    }
}
