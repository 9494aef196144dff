//! Orchestration behavior: caching, timeout, cancellation, fallbacks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use retrodesk_ai::{
    AiClient, AiConfig, AiError, AiProvider, CancellationToken, FolderExplanation, FolderSnapshot,
    Intent, TestProvider,
};
use retrodesk_storage::MemoryStorage;

/// Provider that never settles within any sane amount of time.
struct SlowProvider;

#[async_trait]
impl AiProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn summarize(&self, _text: &str) -> Result<String, AiError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok("too late".to_string())
    }

    async fn rewrite(&self, _text: &str, _style: Option<&str>) -> Result<String, AiError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok("too late".to_string())
    }

    async fn interpret(&self, _query: &str) -> Result<Intent, AiError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(Intent::unknown())
    }

    async fn explain_folder(
        &self,
        folder: &FolderSnapshot,
    ) -> Result<FolderExplanation, AiError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(FolderExplanation {
            description: String::new(),
            recommendations: Vec::new(),
            path: folder.path.clone(),
        })
    }
}

/// Provider whose every call fails with a provider error.
struct FailingProvider;

#[async_trait]
impl AiProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn summarize(&self, _text: &str) -> Result<String, AiError> {
        Err(AiError::Provider("boom".to_string()))
    }

    async fn rewrite(&self, _text: &str, _style: Option<&str>) -> Result<String, AiError> {
        Err(AiError::ServiceUnavailable)
    }

    async fn interpret(&self, _query: &str) -> Result<Intent, AiError> {
        Err(AiError::Network("no route".to_string()))
    }

    async fn explain_folder(
        &self,
        _folder: &FolderSnapshot,
    ) -> Result<FolderExplanation, AiError> {
        Err(AiError::RateLimited)
    }
}

fn client_with(provider: Arc<dyn AiProvider>, config: AiConfig) -> AiClient {
    AiClient::with_provider(provider, config, Arc::new(MemoryStorage::new()))
}

fn snapshot() -> FolderSnapshot {
    FolderSnapshot {
        path: "/documents".to_string(),
        entries: Vec::new(),
    }
}

#[tokio::test]
async fn cache_hit_skips_provider_and_usage() {
    let provider = Arc::new(TestProvider::new());
    let client = client_with(provider.clone(), AiConfig::default());
    let cancel = CancellationToken::new();

    let first = client.summarize("same input", &cancel).await.unwrap();
    let second = client.summarize("same input", &cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.calls(), 1);
    assert_eq!(client.usage_stats().unwrap().total_operations, 1);
}

#[tokio::test]
async fn cache_disabled_hits_provider_every_time() {
    let provider = Arc::new(TestProvider::new());
    let config = AiConfig {
        enable_cache: false,
        ..AiConfig::default()
    };
    let client = client_with(provider.clone(), config);
    let cancel = CancellationToken::new();

    client.summarize("input", &cancel).await.unwrap();
    client.summarize("input", &cancel).await.unwrap();
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn cancellation_rejects_instead_of_falling_back() {
    let client = client_with(Arc::new(SlowProvider), AiConfig::default());
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let result = client.summarize("doomed", &cancel).await;
    assert!(matches!(result, Err(AiError::Cancelled)));
}

#[tokio::test]
async fn cancel_before_call_rejects_immediately() {
    let client = client_with(Arc::new(SlowProvider), AiConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client.interpret("anything", &cancel).await;
    assert!(matches!(result, Err(AiError::Cancelled)));
}

#[tokio::test]
async fn cancel_after_settlement_is_a_noop() {
    let client = client_with(Arc::new(TestProvider::new()), AiConfig::default());
    let cancel = CancellationToken::new();

    let result = client.summarize("fine", &cancel).await;
    cancel.cancel();
    assert!(result.is_ok());
}

#[tokio::test]
async fn timeout_resolves_to_fallback_not_error() {
    let config = AiConfig {
        timeout: Duration::from_millis(30),
        ..AiConfig::default()
    };
    let client = client_with(Arc::new(SlowProvider), config);
    let cancel = CancellationToken::new();

    let summary = client.summarize("slow doc", &cancel).await.unwrap();
    assert!(summary.contains("could not be summarized"));

    let rewritten = client.rewrite("slow doc", None, &cancel).await.unwrap();
    assert!(rewritten.contains("could not be rewritten"));
}

#[tokio::test]
async fn provider_failures_degrade_to_typed_fallbacks() {
    let client = client_with(Arc::new(FailingProvider), AiConfig::default());
    let cancel = CancellationToken::new();

    let summary = client.summarize("doc", &cancel).await.unwrap();
    assert!(summary.contains("could not be summarized"));

    let intent = client.interpret("open notepad", &cancel).await.unwrap();
    assert_eq!(intent.action, "unknown");
    assert_eq!(intent.confidence, 0.0);
    assert!(intent.parameters.is_empty());

    let explanation = client.explain_folder(&snapshot(), &cancel).await.unwrap();
    assert_eq!(explanation.path, "/documents");
    assert!(!explanation.description.is_empty());
    assert_eq!(explanation.recommendations.len(), 1);
}

/// Provider that fails on the first call and succeeds afterwards.
struct FlakyProvider {
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl AiProvider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn summarize(&self, _text: &str) -> Result<String, AiError> {
        let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if call == 0 {
            Err(AiError::ServiceUnavailable)
        } else {
            Ok("recovered summary".to_string())
        }
    }

    async fn rewrite(&self, _text: &str, _style: Option<&str>) -> Result<String, AiError> {
        Err(AiError::ServiceUnavailable)
    }

    async fn interpret(&self, _query: &str) -> Result<Intent, AiError> {
        Err(AiError::ServiceUnavailable)
    }

    async fn explain_folder(
        &self,
        _folder: &FolderSnapshot,
    ) -> Result<FolderExplanation, AiError> {
        Err(AiError::ServiceUnavailable)
    }
}

#[tokio::test]
async fn fallbacks_are_not_cached() {
    // A fallback must not poison the cache: once the provider recovers, the
    // same input gets a real answer again.
    let provider = Arc::new(FlakyProvider {
        calls: std::sync::atomic::AtomicUsize::new(0),
    });
    let client = client_with(provider, AiConfig::default());
    let cancel = CancellationToken::new();

    let first = client.summarize("input", &cancel).await.unwrap();
    assert!(first.contains("could not be summarized"));

    let second = client.summarize("input", &cancel).await.unwrap();
    assert_eq!(second, "recovered summary");
}

#[tokio::test]
async fn usage_tracking_counts_operations_by_type() {
    let client = client_with(Arc::new(TestProvider::new()), AiConfig::default());
    let cancel = CancellationToken::new();

    client.summarize("one", &cancel).await.unwrap();
    client.summarize("two", &cancel).await.unwrap();
    client.interpret("open x", &cancel).await.unwrap();

    let stats = client.usage_stats().unwrap();
    assert_eq!(stats.total_operations, 3);
    assert_eq!(stats.operations_by_type.get("summarize"), Some(&2));
    assert_eq!(stats.operations_by_type.get("interpret"), Some(&1));
    assert!(stats.total_tokens > 0);
}

#[tokio::test]
async fn usage_tracking_disabled_reports_nothing() {
    let config = AiConfig {
        enable_usage_tracking: false,
        ..AiConfig::default()
    };
    let client = client_with(Arc::new(TestProvider::new()), config);
    let cancel = CancellationToken::new();

    client.summarize("one", &cancel).await.unwrap();
    assert!(client.usage_stats().is_none());
}
