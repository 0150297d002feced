// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Provider-neutral text generation contract used by agents.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Isolates agents from vendor completion APIs

// Implementations live in infrastructure/llm/.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Domain interface for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError>;

    /// Check if provider is healthy and accessible
    async fn health_check(&self) -> Result<(), LLMError>;
}

/// Options for LLM generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: Option<f32>,

    /// Sequences that stop generation
    pub stop_sequences: Option<Vec<String>>,
}

/// Token limit applied to agent replies unless configured otherwise.
pub const DEFAULT_AGENT_MAX_TOKENS: u32 = 150;

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(DEFAULT_AGENT_MAX_TOKENS),
            temperature: None,
            stop_sequences: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Generated text
    pub text: String,

    /// Token usage stats
    pub usage: TokenUsage,

    /// Provider name (e.g., "openai", "offline")
    pub provider: String,

    /// Model used (e.g., "gpt-4o-mini")
    pub model: String,

    /// Why generation stopped
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason why generation stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural completion (model decided to stop)
    Stop,

    /// Hit max_tokens limit
    Length,

    /// Blocked by content filter
    ContentFilter,
}

impl FinishReason {
    /// Map a vendor finish reason string; unknown values count as `Stop`.
    pub fn from_vendor(reason: &str) -> Self {
        match reason {
            "length" | "max_output_tokens" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        }
    }
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LLMError {
    /// Whether another API shape or provider might succeed where this one failed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LLMError::Network(_) | LLMError::ModelNotFound(_) | LLMError::Provider(_)
        )
    }
}
