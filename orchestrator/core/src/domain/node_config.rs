// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Node Configuration Types
//
// Defines the configuration schema for a chorus node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - LLM provider configuration and model alias mapping
// - Swarm dispatch policy (execution mode, failure policy, tie-break)
// - Remote secret stores consulted after the environment
// - The agent roster used by the CLI

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::agent::AgentDefinition;
use crate::domain::swarm::{ExecutionMode, FailurePolicy, TieBreak, DEFAULT_MAX_RESPONSES};

pub const API_VERSION: &str = "chorus.dev/v1";
pub const KIND: &str = "NodeConfig";

/// Top-level Kubernetes-style node configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfigManifest {
    /// API version (must be "chorus.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "NodeConfig")
    pub kind: String,

    /// Node metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Node configuration specification
    #[serde(default)]
    pub spec: NodeConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable node name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization and discovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Node configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfigSpec {
    /// LLM provider configurations
    #[serde(default)]
    pub llm_providers: Vec<LLMProviderConfig>,

    /// How model aliases are served
    #[serde(default)]
    pub llm_selection: LLMSelection,

    /// Swarm dispatch policy
    #[serde(default)]
    pub swarm: SwarmSettings,

    /// Remote secret stores
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Agent roster
    #[serde(default)]
    pub agents: Vec<AgentDefinition>,

    /// Observability configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Unique provider name (e.g., "openai", "local-vllm")
    pub name: String,

    /// Provider type: "openai", "openai-compatible" or "echo"
    #[serde(rename = "type")]
    pub provider_type: String,

    /// API endpoint URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// API key ("env:VAR", "secret:KEY" or a literal)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Whether this provider is active
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Available models on this provider
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model alias used as an agent's `base_model` (e.g., "default", "fast")
    pub alias: String,

    /// Actual model identifier for the provider API
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMSelection {
    /// Alias used when an agent's base_model is not a known alias
    #[serde(default = "default_alias")]
    pub default_alias: String,

    /// Fallback provider if primary fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_provider: Option<String>,

    /// Maximum attempts per generation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds (doubles per attempt)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Serve every alias from the offline echo provider
    #[serde(default)]
    pub no_key_mode: bool,

    /// Agents answer with an echo instead of failing when generation errors
    #[serde(default = "default_true")]
    pub offline_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmSettings {
    /// Dispatcher backend
    #[serde(default)]
    pub execution_mode: ExecutionMode,

    /// Agents consulted per dispatch when the caller does not say
    #[serde(default = "default_max_responses")]
    pub max_responses: usize,

    /// Behavior when an agent fails
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Consensus tie-break rule
    #[serde(default)]
    pub tie_break: TieBreak,

    /// Dispatch-wide timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl SwarmSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// AWS Secrets Manager secret holding a JSON object of keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_secret_name: Option<String>,

    /// AWS region (defaults to the SDK's region chain)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,

    /// Vault server address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_addr: Option<String>,

    /// Vault token ("env:VAR" or a literal)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_token: Option<String>,

    /// Path of the KV v2 secret inside the mount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_secret_path: Option<String>,

    /// KV v2 mount point
    #[serde(default = "default_vault_mount")]
    pub vault_mount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_alias() -> String {
    "default".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_max_responses() -> usize {
    DEFAULT_MAX_RESPONSES
}

fn default_vault_mount() -> String {
    "secret".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LLMSelection {
    fn default() -> Self {
        Self {
            default_alias: default_alias(),
            fallback_provider: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            no_key_mode: false,
            offline_fallback: true,
        }
    }
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::default(),
            max_responses: DEFAULT_MAX_RESPONSES,
            failure_policy: FailurePolicy::default(),
            tie_break: TieBreak::default(),
            timeout_ms: None,
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            aws_secret_name: None,
            aws_region: None,
            vault_addr: None,
            vault_token: None,
            vault_secret_path: None,
            vault_mount: default_vault_mount(),
        }
    }
}

impl Default for NodeConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "chorus-node".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: NodeConfigSpec::default(),
        }
    }
}

/// Parse a boolean-ish environment value.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl NodeConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. CHORUS_CONFIG_PATH environment variable
    /// 2. ./chorus-config.yaml (working directory)
    /// 3. ~/.chorus/config.yaml (user home)
    /// 4. /etc/chorus/config.yaml (system, Unix) or C:\ProgramData\Chorus\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CHORUS_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./chorus-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".chorus").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/chorus/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Chorus\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to search/load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply process environment overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup` (container deployments set these as env vars)
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CHORUS_DISABLE_ACTORS") {
            match parse_flag(&val) {
                Some(true) => {
                    tracing::info!("Environment override: CHORUS_DISABLE_ACTORS=true");
                    self.spec.swarm.execution_mode = ExecutionMode::Local;
                }
                Some(false) => {}
                None => tracing::warn!(
                    "Invalid value for CHORUS_DISABLE_ACTORS: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("NO_KEY_MODE") {
            match parse_flag(&val) {
                Some(flag) => {
                    tracing::info!("Environment override: NO_KEY_MODE={}", flag);
                    self.spec.llm_selection.no_key_mode = flag;
                }
                None => tracing::warn!(
                    "Invalid value for NO_KEY_MODE: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("CHORUS_MAX_RESPONSES") {
            match val.trim().parse::<usize>() {
                Ok(n) => {
                    tracing::info!("Environment override: CHORUS_MAX_RESPONSES={}", n);
                    self.spec.swarm.max_responses = n;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for CHORUS_MAX_RESPONSES: '{}'. Expected a count. Ignoring.",
                    val
                ),
            }
        }

        let secrets = &mut self.spec.secrets;
        for (key, slot) in [
            ("AWS_SECRET_NAME", &mut secrets.aws_secret_name),
            ("AWS_REGION", &mut secrets.aws_region),
            ("VAULT_ADDR", &mut secrets.vault_addr),
            ("VAULT_TOKEN", &mut secrets.vault_token),
            ("VAULT_SECRET_PATH", &mut secrets.vault_secret_path),
        ] {
            if let Some(val) = lookup(key).filter(|v| !v.is_empty()) {
                tracing::debug!("Environment override: {}", key);
                *slot = Some(val);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        for provider in &self.spec.llm_providers {
            if provider.name.is_empty() {
                anyhow::bail!("LLM provider name cannot be empty");
            }

            if provider.endpoint.is_empty() {
                anyhow::bail!("LLM provider endpoint cannot be empty for: {}", provider.name);
            }

            if provider.models.is_empty() {
                anyhow::bail!("LLM provider must have at least one model: {}", provider.name);
            }

            for model in &provider.models {
                if model.alias.is_empty() {
                    anyhow::bail!("Model alias cannot be empty in provider: {}", provider.name);
                }

                if model.model.is_empty() {
                    anyhow::bail!("Model identifier cannot be empty for alias: {}", model.alias);
                }
            }
        }

        if let Some(fallback_provider) = &self.spec.llm_selection.fallback_provider {
            if !self.spec.llm_providers.iter().any(|p| &p.name == fallback_provider) {
                anyhow::bail!("Fallback provider '{}' not found in llm_providers", fallback_provider);
            }
        }

        if self.spec.llm_selection.max_retries == 0 {
            anyhow::bail!("llm_selection.max_retries must be at least 1");
        }

        let mut seen = HashSet::new();
        for agent in &self.spec.agents {
            if agent.id.as_str().is_empty() {
                anyhow::bail!("Agent id cannot be empty");
            }
            if !seen.insert(agent.id.as_str()) {
                anyhow::bail!("Duplicate agent id: {}", agent.id);
            }
        }

        Ok(())
    }
}
