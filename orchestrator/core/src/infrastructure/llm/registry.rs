// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Model Alias Resolution and Provider Management
//
// Maps model aliases to provider instances, retries failed generations with
// exponential backoff and tries the fallback provider on the last attempt.
// With no usable API key the default alias is served by the offline echo
// provider.

use crate::application::secrets::SecretResolver;
use crate::domain::llm::{GenerationOptions, GenerationResponse, LLMError, LLMProvider};
use crate::domain::node_config::{LLMProviderConfig, ModelConfig, NodeConfigSpec};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::echo::EchoProvider;
use super::openai::OpenAIAdapter;

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Registry for managing LLM providers and resolving model aliases
pub struct ProviderRegistry {
    alias_map: HashMap<String, Arc<dyn LLMProvider>>,
    providers: HashMap<String, Arc<dyn LLMProvider>>,
    default_alias: String,
    fallback_provider: Option<String>,
    max_retries: u32,
    retry_delay_ms: u64,
    offline: bool,
}

impl ProviderRegistry {
    /// Empty registry; `default_alias` is where unknown aliases are routed.
    pub fn new(default_alias: impl Into<String>) -> Self {
        Self {
            alias_map: HashMap::new(),
            providers: HashMap::new(),
            default_alias: default_alias.into(),
            fallback_provider: None,
            max_retries: 1,
            retry_delay_ms: 0,
            offline: false,
        }
    }

    /// Registry that answers every alias with the echo provider.
    pub fn offline(default_alias: impl Into<String>) -> Self {
        let mut registry = Self::new(default_alias);
        registry.install_offline();
        registry
    }

    pub fn with_retry(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Register a provider under a name and map `alias` to it.
    pub fn register(
        mut self,
        provider_name: impl Into<String>,
        alias: impl Into<String>,
        provider: Arc<dyn LLMProvider>,
    ) -> Self {
        self.providers.entry(provider_name.into()).or_insert_with(|| provider.clone());
        self.alias_map.insert(alias.into(), provider);
        self
    }

    pub fn with_fallback(mut self, provider_name: impl Into<String>) -> Self {
        self.fallback_provider = Some(provider_name.into());
        self
    }

    /// Create provider registry from node configuration
    pub async fn from_config(config: &NodeConfigSpec, secrets: &SecretResolver) -> Self {
        let selection = &config.llm_selection;
        let mut registry = Self::new(selection.default_alias.clone())
            .with_retry(selection.max_retries, selection.retry_delay_ms);
        registry.fallback_provider = selection.fallback_provider.clone();

        info!("Initializing LLM provider registry");

        if selection.no_key_mode {
            info!("No-key mode enabled; serving all aliases from the offline echo provider");
            registry.install_offline();
            return registry;
        }

        for provider_config in &config.llm_providers {
            if !provider_config.enabled {
                info!("Provider '{}' disabled, skipping", provider_config.name);
                continue;
            }

            let api_key = match Self::resolve_api_key(&provider_config.api_key, secrets).await {
                Ok(key) => key,
                Err(e) => {
                    warn!("Failed to initialize provider '{}': {}", provider_config.name, e);
                    continue;
                }
            };

            for (index, model_config) in provider_config.models.iter().enumerate() {
                let provider = match Self::create_provider(provider_config, model_config, &api_key) {
                    Ok(provider) => provider,
                    Err(e) => {
                        warn!("Failed to initialize provider '{}': {}", provider_config.name, e);
                        break;
                    }
                };

                info!(
                    "Mapping alias '{}' -> {} ({})",
                    model_config.alias, model_config.model, provider_config.name
                );
                // A provider's first model answers when it is used as the fallback.
                if index == 0 {
                    registry.providers.insert(provider_config.name.clone(), provider.clone());
                }
                registry.alias_map.insert(model_config.alias.clone(), provider);
            }
        }

        if registry.providers.is_empty() {
            match secrets.resolve("OPENAI_API_KEY", None).await.filter(|k| !k.is_empty()) {
                Some(api_key) => {
                    info!(
                        "No providers configured; using OpenAI ({}) for alias '{}'",
                        DEFAULT_OPENAI_MODEL, registry.default_alias
                    );
                    let provider: Arc<dyn LLMProvider> = Arc::new(OpenAIAdapter::new(
                        DEFAULT_OPENAI_ENDPOINT.to_string(),
                        api_key,
                        DEFAULT_OPENAI_MODEL.to_string(),
                    ));
                    registry.providers.insert("openai".to_string(), provider.clone());
                    registry.alias_map.insert(registry.default_alias.clone(), provider);
                }
                None => {
                    warn!("No LLM providers configured and no OPENAI_API_KEY found; running offline");
                    registry.install_offline();
                }
            }
        }

        registry
    }

    fn install_offline(&mut self) {
        let echo: Arc<dyn LLMProvider> = Arc::new(EchoProvider::new());
        self.providers.insert("echo".to_string(), echo.clone());
        self.alias_map.insert(self.default_alias.clone(), echo);
        self.offline = true;
    }

    /// Create a provider instance for one configured model
    fn create_provider(
        config: &LLMProviderConfig,
        model: &ModelConfig,
        api_key: &str,
    ) -> anyhow::Result<Arc<dyn LLMProvider>> {
        let provider: Arc<dyn LLMProvider> = match config.provider_type.as_str() {
            "openai" => Arc::new(OpenAIAdapter::new(
                config.endpoint.clone(),
                api_key.to_string(),
                model.model.clone(),
            )),
            "openai-compatible" => Arc::new(
                OpenAIAdapter::new(config.endpoint.clone(), api_key.to_string(), model.model.clone())
                    .without_responses_fallback(),
            ),
            "echo" => Arc::new(EchoProvider::new()),
            _ => anyhow::bail!("Unsupported provider type: {}", config.provider_type),
        };

        Ok(provider)
    }

    /// Resolve API key from config ("env:VAR_NAME", "secret:KEY" or a literal)
    async fn resolve_api_key(key: &Option<String>, secrets: &SecretResolver) -> anyhow::Result<String> {
        match key.as_deref() {
            Some(k) if k.starts_with("env:") => {
                let var_name = &k["env:".len()..];
                secrets
                    .env_var(var_name)
                    .ok_or_else(|| anyhow::anyhow!("Environment variable not set: {}", var_name))
            }
            Some(k) if k.starts_with("secret:") => {
                let secret_key = &k["secret:".len()..];
                secrets
                    .try_resolve(secret_key)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Secret not found: {}", secret_key))
            }
            Some(k) => Ok(k.to_string()),
            None => Ok(String::new()), // Local servers without auth
        }
    }

    /// The alias that will serve `requested`: itself when known, else the default alias.
    pub fn resolve_alias<'a>(&'a self, requested: &'a str) -> &'a str {
        if self.alias_map.contains_key(requested) {
            requested
        } else {
            &self.default_alias
        }
    }

    /// Generate text using a model alias
    /// Includes retry logic and fallback to secondary provider
    pub async fn generate(
        &self,
        alias: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let provider = self
            .alias_map
            .get(alias)
            .ok_or_else(|| LLMError::ModelNotFound(format!("Model alias '{}' not found", alias)))?;

        let mut last_error = None;

        for attempt in 0..self.max_retries {
            match provider.generate(prompt, options).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(
                        "Generation failed (attempt {}/{}): {}",
                        attempt + 1,
                        self.max_retries,
                        e
                    );
                    last_error = Some(e);

                    if attempt + 1 == self.max_retries {
                        if let Some(fallback) = &self.fallback_provider {
                            if let Some(fallback_provider) = self.providers.get(fallback) {
                                info!("Trying fallback provider: {}", fallback);
                                return fallback_provider.generate(prompt, options).await;
                            }
                        }
                        break;
                    }

                    let backoff = self
                        .retry_delay_ms
                        .saturating_mul(2_u64.saturating_pow(attempt));
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LLMError::Provider("Unknown error".into())))
    }

    /// Check health of all providers, keyed by provider name
    pub async fn health_check_all(&self) -> BTreeMap<String, Result<(), LLMError>> {
        let mut results = BTreeMap::new();

        for (name, provider) in &self.providers {
            info!("Health checking provider: {}", name);
            results.insert(name.clone(), provider.health_check().await);
        }

        results
    }

    /// Get list of available model aliases, sorted
    pub fn available_aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.alias_map.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    /// Check if a model alias exists
    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias_map.contains_key(alias)
    }

    pub fn default_alias(&self) -> &str {
        &self.default_alias
    }

    /// Whether the default alias is served by the echo provider
    pub fn is_offline(&self) -> bool {
        self.offline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{FinishReason, TokenUsage};
    use crate::domain::node_config::LLMSelection;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then answers with `reply`.
    struct FlakyProvider {
        failures: u32,
        calls: AtomicU32,
        reply: &'static str,
    }

    impl FlakyProvider {
        fn new(failures: u32, reply: &'static str) -> Self {
            Self { failures, calls: AtomicU32::new(0), reply }
        }
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<GenerationResponse, LLMError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(LLMError::Network("connection reset".into()));
            }
            Ok(GenerationResponse {
                text: self.reply.to_string(),
                usage: TokenUsage::default(),
                provider: "flaky".to_string(),
                model: "test".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    fn env_only(pairs: &'static [(&'static str, &'static str)]) -> SecretResolver {
        SecretResolver::new().with_env_lookup(move |key| {
            pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
        })
    }

    fn provider_config(api_key: Option<&str>) -> LLMProviderConfig {
        LLMProviderConfig {
            name: "openai".to_string(),
            provider_type: "openai".to_string(),
            endpoint: "http://localhost:1".to_string(),
            api_key: api_key.map(str::to_string),
            enabled: true,
            models: vec![
                ModelConfig { alias: "default".to_string(), model: "gpt-4o-mini".to_string() },
                ModelConfig { alias: "smart".to_string(), model: "gpt-4o".to_string() },
            ],
        }
    }

    #[tokio::test]
    async fn test_registry_from_config() {
        let config = NodeConfigSpec {
            llm_providers: vec![provider_config(Some("env:TEST_KEY"))],
            ..NodeConfigSpec::default()
        };

        let registry = ProviderRegistry::from_config(&config, &env_only(&[("TEST_KEY", "sk")])).await;
        assert!(registry.has_alias("default"));
        assert!(registry.has_alias("smart"));
        assert_eq!(registry.available_aliases(), vec!["default", "smart"]);
        assert!(!registry.is_offline());
    }

    #[tokio::test]
    async fn test_missing_key_env_skips_provider_and_goes_offline() {
        let config = NodeConfigSpec {
            llm_providers: vec![provider_config(Some("env:ABSENT"))],
            ..NodeConfigSpec::default()
        };

        let registry = ProviderRegistry::from_config(&config, &env_only(&[])).await;
        assert!(registry.is_offline());
        assert_eq!(registry.available_aliases(), vec!["default"]);
    }

    #[tokio::test]
    async fn test_openai_key_without_providers_registers_default() {
        let registry = ProviderRegistry::from_config(
            &NodeConfigSpec::default(),
            &env_only(&[("OPENAI_API_KEY", "sk-live")]),
        )
        .await;
        assert!(!registry.is_offline());
        assert!(registry.has_alias("default"));
    }

    #[tokio::test]
    async fn test_no_key_mode_ignores_providers() {
        let config = NodeConfigSpec {
            llm_providers: vec![provider_config(Some("literal-key"))],
            llm_selection: LLMSelection { no_key_mode: true, ..LLMSelection::default() },
            ..NodeConfigSpec::default()
        };

        let registry = ProviderRegistry::from_config(&config, &env_only(&[])).await;
        assert!(registry.is_offline());
        let reply = registry
            .generate("default", "hi", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(reply.text, "[demo-mode] Echo: hi");
    }

    #[test]
    fn test_unknown_alias_routes_to_default() {
        let registry = ProviderRegistry::offline("default");
        assert_eq!(registry.resolve_alias("gpt-placeholder"), "default");
        assert_eq!(registry.resolve_alias("default"), "default");
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let provider = Arc::new(FlakyProvider::new(2, "ok"));
        let registry = ProviderRegistry::new("default")
            .with_retry(3, 1)
            .register("flaky", "default", provider.clone());

        let reply = registry.generate("default", "p", &GenerationOptions::default()).await.unwrap();
        assert_eq!(reply.text, "ok");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fallback_provider_on_last_attempt() {
        let registry = ProviderRegistry::new("default")
            .with_retry(2, 1)
            .register("primary", "default", Arc::new(FlakyProvider::new(u32::MAX, "never")))
            .register("backup", "backup", Arc::new(FlakyProvider::new(0, "from backup")))
            .with_fallback("backup");

        let reply = registry.generate("default", "p", &GenerationOptions::default()).await.unwrap();
        assert_eq!(reply.text, "from backup");
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let registry = ProviderRegistry::new("default")
            .with_retry(2, 1)
            .register("primary", "default", Arc::new(FlakyProvider::new(u32::MAX, "never")));

        let err = registry.generate("default", "p", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, LLMError::Network(_)));
    }

    #[tokio::test]
    async fn test_health_check_all_reports_each_provider() {
        let mut server = mockito::Server::new_async().await;
        let _models = server
            .mock("GET", "/models")
            .with_status(401)
            .create_async()
            .await;

        let openai = OpenAIAdapter::new(server.url(), "sk-bad".into(), "gpt-4o-mini".into());
        let registry = ProviderRegistry::new("default")
            .register("openai", "default", Arc::new(openai))
            .register("echo", "fast", Arc::new(EchoProvider::new()));

        let health = registry.health_check_all().await;
        let names: Vec<&str> = health.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["echo", "openai"]);
        assert!(health["echo"].is_ok());
        assert!(matches!(health["openai"], Err(LLMError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_unknown_alias_is_model_not_found() {
        let registry = ProviderRegistry::new("default");
        let err = registry.generate("nope", "p", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, LLMError::ModelNotFound(_)));
    }
}
