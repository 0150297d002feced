// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI LLM Provider Adapter
//
// Anti-Corruption Layer for the OpenAI API. Also works with OpenAI-compatible
// servers (vLLM, LM Studio) that only expose chat completions.

use crate::domain::llm::{
    FinishReason, GenerationOptions, GenerationResponse, LLMError, LLMProvider, TokenUsage,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub struct OpenAIAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    responses_fallback: bool,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<ResponsesOutputItem>,
    #[serde(default)]
    usage: Option<ResponsesUsage>,
    #[serde(default)]
    incomplete_details: Option<IncompleteDetails>,
}

#[derive(Deserialize)]
struct ResponsesOutputItem {
    #[serde(default)]
    content: Vec<ResponsesContent>,
}

#[derive(Deserialize)]
struct ResponsesContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponsesUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct IncompleteDetails {
    reason: String,
}

impl OpenAIAdapter {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            responses_fallback: true,
        }
    }

    /// OpenAI-compatible servers usually lack `/responses`; skip the second attempt.
    pub fn without_responses_fallback(mut self) -> Self {
        self.responses_fallback = false;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response, LLMError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        Err(self.status_error(status, error_text))
    }

    fn status_error(&self, status: StatusCode, error_text: String) -> LLMError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LLMError::Authentication(error_text),
            StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimit,
            StatusCode::NOT_FOUND => LLMError::ModelNotFound(self.model.clone()),
            _ => LLMError::Provider(format!("HTTP {}: {}", status, error_text)),
        }
    }

    async fn chat_completion(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop: options.stop_sequences.as_deref(),
        };

        let chat: ChatResponse = self
            .post("chat/completions", &request)
            .await?
            .json()
            .await
            .map_err(|e| LLMError::Provider(format!("Failed to parse response: {}", e)))?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::Provider("No response from model".into()))?;

        let text = choice
            .message
            .content
            .ok_or_else(|| LLMError::Provider("Model returned an empty message".into()))?;

        Ok(GenerationResponse {
            text,
            usage: chat
                .usage
                .map(|u| TokenUsage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            provider: "openai".to_string(),
            model: self.model.clone(),
            finish_reason: choice
                .finish_reason
                .as_deref()
                .map(FinishReason::from_vendor)
                .unwrap_or(FinishReason::Stop),
        })
    }

    async fn responses(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let request = ResponsesRequest {
            model: &self.model,
            input: prompt,
            max_output_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let body: ResponsesResponse = self
            .post("responses", &request)
            .await?
            .json()
            .await
            .map_err(|e| LLMError::Provider(format!("Failed to parse response: {}", e)))?;

        // Reasoning models emit a content-less item before the message.
        let text = body
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .find_map(|part| part.text.clone())
            .ok_or_else(|| LLMError::Provider("No text in responses output".into()))?;

        Ok(GenerationResponse {
            text,
            usage: body
                .usage
                .map(|u| TokenUsage {
                    prompt_tokens: u.input_tokens,
                    completion_tokens: u.output_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            provider: "openai".to_string(),
            model: self.model.clone(),
            finish_reason: body
                .incomplete_details
                .map(|d| FinishReason::from_vendor(&d.reason))
                .unwrap_or(FinishReason::Stop),
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAIAdapter {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        match self.chat_completion(prompt, options).await {
            Ok(response) => Ok(response),
            Err(e) if self.responses_fallback && e.is_recoverable() => {
                warn!(model = %self.model, error = %e, "Chat completion failed, retrying via responses API");
                self.responses(prompt, options).await
            }
            Err(e) => Err(e),
        }
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        let response = self
            .client
            .get(self.url("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        debug!(status = %response.status(), "OpenAI health check");

        if response.status().is_success() {
            Ok(())
        } else if response.status() == StatusCode::UNAUTHORIZED
            || response.status() == StatusCode::FORBIDDEN
        {
            Err(LLMError::Authentication("Invalid API key".into()))
        } else {
            Err(LLMError::Network(format!("HTTP {}", response.status())))
        }
    }
}
