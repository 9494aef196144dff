//! Offline heuristic provider.
//!
//! Default backend: pattern matching plus a little simulated latency so the
//! UI behaves the way it would against a real model. No external calls.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::AiError;
use crate::provider::{AiProvider, FolderExplanation, FolderSnapshot, Intent};

/// Heuristic provider with simulated latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    async fn simulate_latency() {
        let millis = rand::thread_rng().gen_range(150..450);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    fn first_sentence(text: &str) -> &str {
        let trimmed = text.trim();
        trimmed
            .split_inclusive(['.', '!', '?'])
            .next()
            .unwrap_or(trimmed)
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn summarize(&self, text: &str) -> Result<String, AiError> {
        Self::simulate_latency().await;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok("The document is empty.".to_string());
        }
        let words = trimmed.split_whitespace().count();
        if words <= 25 {
            return Ok(format!("A short note: {trimmed}"));
        }

        let lead = Self::first_sentence(trimmed);
        let lines = trimmed.lines().filter(|line| !line.trim().is_empty()).count();
        Ok(format!(
            "{lead} The document runs {words} words across {lines} lines."
        ))
    }

    async fn rewrite(&self, text: &str, style: Option<&str>) -> Result<String, AiError> {
        Self::simulate_latency().await;

        let rewritten = match style.unwrap_or("neutral") {
            "formal" => text
                .replace("can't", "cannot")
                .replace("won't", "will not")
                .replace("don't", "do not")
                .replace("it's", "it is")
                .replace("gonna", "going to"),
            "casual" => text
                .replace("cannot", "can't")
                .replace("will not", "won't")
                .replace("do not", "don't"),
            _ => text.trim().to_string(),
        };
        Ok(rewritten)
    }

    async fn interpret(&self, query: &str) -> Result<Intent, AiError> {
        Self::simulate_latency().await;

        let lowered = query.to_lowercase();
        let target = |keyword: &str| -> Option<String> {
            let rest = lowered.split(keyword).nth(1)?.trim();
            if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            }
        };

        let (action, confidence, param) = if lowered.contains("open") || lowered.contains("launch")
        {
            ("open_app", 0.85, target("open ").or_else(|| target("launch ")))
        } else if lowered.contains("delete") || lowered.contains("remove") {
            ("delete_item", 0.8, target("delete ").or_else(|| target("remove ")))
        } else if lowered.contains("new folder") || lowered.contains("create folder") {
            ("create_folder", 0.85, target("folder ").or_else(|| target("folder called ")))
        } else if lowered.contains("find") || lowered.contains("search") {
            ("search", 0.75, target("find ").or_else(|| target("search ")))
        } else if lowered.contains("summarize") || lowered.contains("summary") {
            ("summarize_document", 0.8, target("summarize "))
        } else {
            return Ok(Intent {
                action: "unknown".to_string(),
                confidence: 0.2,
                parameters: BTreeMap::new(),
            });
        };

        let mut parameters = BTreeMap::new();
        if let Some(value) = param {
            parameters.insert("target".to_string(), value);
        }
        Ok(Intent {
            action: action.to_string(),
            confidence,
            parameters,
        })
    }

    async fn explain_folder(&self, folder: &FolderSnapshot) -> Result<FolderExplanation, AiError> {
        Self::simulate_latency().await;

        let files = folder.file_count();
        let folders = folder.folder_count();
        let description = if folder.entries.is_empty() {
            format!("{} is empty.", folder.path)
        } else {
            format!(
                "{} holds {files} file{} and {folders} folder{}.",
                folder.path,
                if files == 1 { "" } else { "s" },
                if folders == 1 { "" } else { "s" },
            )
        };

        let mut recommendations = Vec::new();
        if folder.entries.is_empty() {
            recommendations.push("Create a few folders to give this space some structure.".to_string());
        } else if files > 10 && folders == 0 {
            recommendations.push("Group these files into subfolders by topic.".to_string());
        } else if files > 0 {
            recommendations.push("Consider archiving files you no longer open.".to_string());
        }

        Ok(FolderExplanation {
            description,
            recommendations,
            path: folder.path.clone(),
        })
    }
}
