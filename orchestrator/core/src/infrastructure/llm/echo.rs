// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Offline Echo Provider
//
// Deterministic stand-in used when no API key is available or no-key mode is
// on. Never touches the network.

use crate::domain::llm::{
    FinishReason, GenerationOptions, GenerationResponse, LLMError, LLMProvider, TokenUsage,
};
use async_trait::async_trait;

const SNIPPET_CHARS: usize = 300;

#[derive(Debug, Default, Clone)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }

    /// `[demo-mode] Echo: <snippet>` where the snippet is the trimmed prompt,
    /// newlines flattened to spaces, cut to 300 characters.
    pub fn reply(prompt: &str) -> String {
        let snippet: String = prompt
            .trim()
            .replace('\n', " ")
            .chars()
            .take(SNIPPET_CHARS)
            .collect();
        format!("[demo-mode] Echo: {}", snippet)
    }
}

#[async_trait]
impl LLMProvider for EchoProvider {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        Ok(GenerationResponse {
            text: Self::reply(prompt),
            usage: TokenUsage::default(),
            provider: "offline".to_string(),
            model: "echo".to_string(),
            finish_reason: FinishReason::Stop,
        })
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        Ok(())
    }
}
