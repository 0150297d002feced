// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Composition root shared by the commands: configuration, secret stores and
//! the provider registry, built once per invocation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chorus_core::application::agent::build_agents;
use chorus_core::application::secrets::SecretResolver;
use chorus_core::domain::agent::{AgentDefinition, AgentHandle, AgentId, AgentSpec};
use chorus_core::domain::node_config::NodeConfigManifest;
use chorus_core::infrastructure::llm::ProviderRegistry;

pub struct NodeContext {
    pub config: NodeConfigManifest,
    pub secrets: SecretResolver,
    pub registry: Arc<ProviderRegistry>,
}

impl NodeContext {
    pub async fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = NodeConfigManifest::load_or_default(config_path)
            .context("Failed to load configuration")?;
        config
            .validate()
            .context("Configuration validation failed")?;

        let secrets = SecretResolver::from_config(&config.spec.secrets);
        let registry = Arc::new(ProviderRegistry::from_config(&config.spec, &secrets).await);

        Ok(Self {
            config,
            secrets,
            registry,
        })
    }

    /// Agents from `roster` if given, else from configuration, else `count`
    /// default assistants.
    pub fn agent_definitions(&self, roster: Option<&Path>, count: usize) -> Result<Vec<AgentDefinition>> {
        if let Some(path) = roster {
            return load_roster(path);
        }
        if !self.config.spec.agents.is_empty() {
            return Ok(self.config.spec.agents.clone());
        }
        Ok(default_roster(count))
    }

    pub fn build_agents(&self, definitions: &[AgentDefinition]) -> Vec<Arc<dyn AgentHandle>> {
        build_agents(
            definitions,
            self.registry.clone(),
            self.config.spec.llm_selection.offline_fallback,
        )
    }
}

/// A YAML list of agent definitions.
pub fn load_roster(path: &Path) -> Result<Vec<AgentDefinition>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read agent roster: {:?}", path))?;
    let definitions: Vec<AgentDefinition> =
        serde_yaml::from_str(&content).context("Failed to parse agent roster YAML")?;
    Ok(definitions)
}

pub fn default_roster(count: usize) -> Vec<AgentDefinition> {
    (1..=count)
        .map(|i| AgentDefinition {
            id: AgentId::new(format!("agent-{i}")),
            spec: AgentSpec::default(),
        })
        .collect()
}
