//! OpenAI chat-completions provider.
//!
//! Speaks the standard chat-completions JSON protocol with bearer-token
//! auth. `interpret` and `explain_folder` ask the model for strict JSON and
//! fall back to salvage parsing when the output is wrapped in prose.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::AiError;
use crate::provider::{AiProvider, FolderExplanation, FolderSnapshot, Intent};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

/// Chat-completions backend.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Point the provider at a different endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// One chat-completion round trip.
    async fn chat(&self, system: &str, user: &str) -> Result<String, AiError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AiError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            debug!("chat completion failed: {status} {detail}");
            return Err(translate_status(status, &detail));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| AiError::InvalidResponse(err.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| AiError::InvalidResponse("no choices in response".to_string()))
    }
}

/// Map an HTTP error status to the provider error taxonomy.
fn translate_status(status: StatusCode, detail: &str) -> AiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AiError::Auth(format!("provider rejected credentials ({status})"))
        }
        StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited,
        status if status.is_server_error() => AiError::ServiceUnavailable,
        status => AiError::Provider(format!("{status}: {detail}")),
    }
}

/// Pull the first JSON object out of model output that may be wrapped in
/// prose or a code fence.
fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn summarize(&self, text: &str) -> Result<String, AiError> {
        self.chat(
            "You summarize documents in two or three plain sentences.",
            &format!("Summarize this document:\n\n{text}"),
        )
        .await
    }

    async fn rewrite(&self, text: &str, style: Option<&str>) -> Result<String, AiError> {
        let style = style.unwrap_or("clear and neutral");
        self.chat(
            "You rewrite text in a requested style, preserving its meaning. Reply with the rewritten text only.",
            &format!("Rewrite in a {style} style:\n\n{text}"),
        )
        .await
    }

    async fn interpret(&self, query: &str) -> Result<Intent, AiError> {
        let content = self
            .chat(
                "You map desktop commands to intents. Reply with strict JSON only: \
                 {\"action\": string, \"confidence\": number 0-1, \"parameters\": object of strings}.",
                query,
            )
            .await?;

        if let Ok(intent) = serde_json::from_str::<Intent>(&content) {
            return Ok(intent);
        }
        if let Some(inner) = extract_json(&content) {
            if let Ok(intent) = serde_json::from_str::<Intent>(inner) {
                return Ok(intent);
            }
        }
        debug!("interpret produced non-JSON output, degrading to unknown intent");
        Ok(Intent::unknown())
    }

    async fn explain_folder(&self, folder: &FolderSnapshot) -> Result<FolderExplanation, AiError> {
        let listing = folder
            .entries
            .iter()
            .map(|entry| format!("{} ({}, {} bytes)", entry.name, entry.kind, entry.size))
            .collect::<Vec<_>>()
            .join("\n");
        let content = self
            .chat(
                "You describe folder contents. Reply with strict JSON only: \
                 {\"description\": string, \"recommendations\": array of strings}.",
                &format!("Folder {} contains:\n{listing}", folder.path),
            )
            .await?;

        let parsed = serde_json::from_str::<FolderExplanation>(&content)
            .ok()
            .or_else(|| {
                extract_json(&content)
                    .and_then(|inner| serde_json::from_str::<FolderExplanation>(inner).ok())
            });
        match parsed {
            Some(explanation) => Ok(FolderExplanation {
                path: folder.path.clone(),
                ..explanation
            }),
            // Salvage: use the raw output as the description
            None => Ok(FolderExplanation {
                description: content,
                recommendations: Vec::new(),
                path: folder.path.clone(),
            }),
        }
    }
}
