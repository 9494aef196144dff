//! Deterministic provider for automated tests.
//!
//! No latency, no randomness: every response is either a canned override or
//! a predictable function of the input.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::AiError;
use crate::provider::{AiProvider, FolderExplanation, FolderSnapshot, Intent, Operation};

/// Lookup-table provider.
#[derive(Debug, Default)]
pub struct TestProvider {
    /// (operation, input) -> canned response. Structured responses are
    /// stored as JSON.
    responses: BTreeMap<(&'static str, String), String>,
    calls: AtomicUsize,
}

impl TestProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned response for an exact input.
    pub fn with_response(mut self, operation: Operation, input: &str, output: &str) -> Self {
        self.responses
            .insert((operation.as_str(), input.to_string()), output.to_string());
        self
    }

    /// Number of provider invocations so far (cache hits never reach the
    /// provider, which is what tests assert with this).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, operation: Operation, input: &str) -> Option<String> {
        self.responses
            .get(&(operation.as_str(), input.to_string()))
            .cloned()
    }
}

#[async_trait]
impl AiProvider for TestProvider {
    fn name(&self) -> &str {
        "test"
    }

    async fn summarize(&self, text: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lookup(Operation::Summarize, text)
            .unwrap_or_else(|| format!("summary({} chars)", text.len())))
    }

    async fn rewrite(&self, text: &str, style: Option<&str>) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lookup(Operation::Rewrite, text)
            .unwrap_or_else(|| format!("rewrite[{}]({text})", style.unwrap_or("neutral"))))
    }

    async fn interpret(&self, query: &str) -> Result<Intent, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(raw) = self.lookup(Operation::Interpret, query) {
            return serde_json::from_str(&raw)
                .map_err(|err| AiError::InvalidResponse(err.to_string()));
        }
        let mut parameters = BTreeMap::new();
        parameters.insert("query".to_string(), query.to_string());
        Ok(Intent {
            action: "echo".to_string(),
            confidence: 1.0,
            parameters,
        })
    }

    async fn explain_folder(&self, folder: &FolderSnapshot) -> Result<FolderExplanation, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(raw) = self.lookup(Operation::ExplainFolder, &folder.path) {
            return serde_json::from_str(&raw)
                .map_err(|err| AiError::InvalidResponse(err.to_string()));
        }
        Ok(FolderExplanation {
            description: format!("{} with {} entries", folder.path, folder.entries.len()),
            recommendations: Vec::new(),
            path: folder.path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_responses_are_deterministic() {
        let provider = TestProvider::new();
        let first = provider.summarize("hello").await.unwrap();
        let second = provider.summarize("hello").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_canned_override() {
        let provider =
            TestProvider::new().with_response(Operation::Summarize, "input", "canned output");
        assert_eq!(provider.summarize("input").await.unwrap(), "canned output");
    }

    #[tokio::test]
    async fn test_canned_intent_parses_json() {
        let provider = TestProvider::new().with_response(
            Operation::Interpret,
            "open notes",
            r#"{"action":"open_app","confidence":0.9,"parameters":{"target":"notes"}}"#,
        );
        let intent = provider.interpret("open notes").await.unwrap();
        assert_eq!(intent.action, "open_app");
    }
}
