// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Model-backed agents.
//!
//! [`LlmAgent`] renders its persona around the caller's prompt, asks the
//! [`ProviderRegistry`] for a completion and keeps a private interaction log.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::agent::{AgentDefinition, AgentError, AgentHandle, AgentId, AgentSpec, Interaction};
use crate::domain::llm::GenerationOptions;
use crate::infrastructure::llm::ProviderRegistry;

const FALLBACK_SNIPPET_CHARS: usize = 200;

pub struct LlmAgent {
    id: AgentId,
    spec: AgentSpec,
    registry: Arc<ProviderRegistry>,
    options: GenerationOptions,
    offline_fallback: bool,
    history: Mutex<Vec<Interaction>>,
}

impl LlmAgent {
    pub fn new(id: AgentId, spec: AgentSpec, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            id,
            spec,
            registry,
            options: GenerationOptions::default(),
            offline_fallback: true,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn from_definition(definition: &AgentDefinition, registry: Arc<ProviderRegistry>) -> Self {
        Self::new(definition.id.clone(), definition.spec.clone(), registry)
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// When disabled, provider failures surface as [`AgentError::Generation`]
    /// instead of the echo reply.
    pub fn with_offline_fallback(mut self, enabled: bool) -> Self {
        self.offline_fallback = enabled;
        self
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    pub fn render_prompt(&self, prompt: &str) -> String {
        format!(
            "Role: {}\nContext: {}\nUser: {}\nAgent:",
            self.spec.role, self.spec.description, prompt
        )
    }

    fn fallback_reply(&self, rendered: &str) -> String {
        let snippet: String = rendered.chars().take(FALLBACK_SNIPPET_CHARS).collect();
        format!("[{}] Echo: {}", self.spec.base_model, snippet)
    }

    /// Snapshot of every prompt/reply pair, oldest first.
    pub fn history(&self) -> Vec<Interaction> {
        self.history.lock().clone()
    }
}

#[async_trait]
impl AgentHandle for LlmAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    async fn respond(&self, prompt: &str) -> Result<String, AgentError> {
        let rendered = self.render_prompt(prompt);
        let alias = self.registry.resolve_alias(&self.spec.base_model);
        debug!(agent_id = %self.id, alias, "Requesting completion");

        let reply = match self.registry.generate(alias, &rendered, &self.options).await {
            Ok(response) => response.text,
            Err(e) if self.offline_fallback => {
                warn!(agent_id = %self.id, error = %e, "Model call failed, replying offline");
                self.fallback_reply(&rendered)
            }
            Err(e) => return Err(e.into()),
        };

        self.history.lock().push(Interaction::new(prompt, reply.clone()));
        Ok(reply)
    }
}

/// Materialize configured agents against a shared registry.
pub fn build_agents(
    definitions: &[AgentDefinition],
    registry: Arc<ProviderRegistry>,
    offline_fallback: bool,
) -> Vec<Arc<dyn AgentHandle>> {
    definitions
        .iter()
        .map(|definition| {
            let agent = LlmAgent::from_definition(definition, registry.clone())
                .with_offline_fallback(offline_fallback);
            Arc::new(agent) as Arc<dyn AgentHandle>
        })
        .collect()
}
