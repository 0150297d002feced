// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::domain::llm::LLMError;

/// Caller-chosen agent identifier. Opaque to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random identifier for agents defined without one.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

fn default_role() -> String {
    "assistant".to_string()
}

fn default_base_model() -> String {
    "gpt-placeholder".to_string()
}

/// What an agent is: its persona and which model alias answers for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Persona injected as `Role:` in the rendered prompt
    #[serde(default = "default_role")]
    pub role: String,

    /// Background injected as `Context:` in the rendered prompt
    #[serde(default)]
    pub description: String,

    /// Model alias resolved through the provider registry
    #[serde(default = "default_base_model")]
    pub base_model: String,

    /// Free-form attributes carried along with the agent
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl Default for AgentSpec {
    fn default() -> Self {
        Self {
            role: default_role(),
            description: String::new(),
            base_model: default_base_model(),
            attributes: HashMap::new(),
        }
    }
}

impl AgentSpec {
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_base_model(mut self, base_model: impl Into<String>) -> Self {
        self.base_model = base_model.into();
        self
    }
}

/// An agent entry in configuration (`spec.agents`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    #[serde(default = "AgentId::generate")]
    pub id: AgentId,

    #[serde(flatten)]
    pub spec: AgentSpec,
}

/// One prompt/response exchange remembered by an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub prompt: String,
    pub response: String,
    pub at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            at: Utc::now(),
        }
    }
}

/// Why an agent could not produce a reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum AgentError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("agent did not reply in time")]
    Timeout,

    #[error("agent unavailable: {0}")]
    Unavailable(String),
}

impl From<LLMError> for AgentError {
    fn from(error: LLMError) -> Self {
        AgentError::Generation(error.to_string())
    }
}

/// Anything that can answer a prompt.
///
/// Handles are shared as `Arc<dyn AgentHandle>` and invoked concurrently, so
/// implementations keep any per-agent state behind their own synchronization.
#[async_trait]
pub trait AgentHandle: Send + Sync {
    fn id(&self) -> &AgentId;

    async fn respond(&self, prompt: &str) -> Result<String, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults_from_yaml() {
        let def: AgentDefinition = serde_yaml::from_str("id: critic\n").unwrap();
        assert_eq!(def.id.as_str(), "critic");
        assert_eq!(def.spec.role, "assistant");
        assert_eq!(def.spec.description, "");
        assert_eq!(def.spec.base_model, "gpt-placeholder");
    }

    #[test]
    fn test_definition_flattens_spec() {
        let yaml = "id: a1\nrole: reviewer\ndescription: checks facts\nbase_model: fast\n";
        let def: AgentDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.spec.role, "reviewer");
        assert_eq!(def.spec.description, "checks facts");
        assert_eq!(def.spec.base_model, "fast");
    }

    #[test]
    fn test_missing_id_is_generated() {
        let a: AgentDefinition = serde_yaml::from_str("role: critic\n").unwrap();
        let b: AgentDefinition = serde_yaml::from_str("role: critic\n").unwrap();
        assert_eq!(a.id.as_str().len(), 36);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_agent_error_serializes_with_kind() {
        let json = serde_json::to_value(AgentError::Generation("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "generation", "message": "boom"}));

        let json = serde_json::to_value(AgentError::Timeout).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "timeout"}));
    }

    #[test]
    fn test_llm_error_converts_to_generation() {
        let err: AgentError = LLMError::RateLimit.into();
        assert_eq!(err, AgentError::Generation("Rate limit exceeded".into()));
    }
}
