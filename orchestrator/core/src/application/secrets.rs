// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Secret Resolution
//!
//! [`SecretResolver`] answers "what is the value of `KEY`?" with a fixed
//! precedence:
//!
//! 1. the process environment,
//! 2. the JSON-blob store (one AWS Secrets Manager secret holding an object),
//! 3. the KV-versioned store (one Vault KV v2 path).
//!
//! The first hit wins. Each remote document is fetched once and cached after
//! the first successful load; failed loads are retried on the next lookup.
//!
//! [`SecretResolver::resolve`] treats a failing store as a miss and moves on.
//! [`SecretResolver::try_resolve`] stops and returns the store error.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::domain::node_config::SecretsConfig;
use crate::domain::secrets::{secret_map_from_json, SecretMap, SecretSource, SecretsError};
use crate::infrastructure::secrets::{AwsSecretsManagerSource, VaultKvSource};

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

struct CachedSource {
    source: Arc<dyn SecretSource>,
    cache: OnceCell<SecretMap>,
}

impl CachedSource {
    fn new(source: Arc<dyn SecretSource>) -> Self {
        Self {
            source,
            cache: OnceCell::new(),
        }
    }

    async fn document(&self) -> Result<&SecretMap, SecretsError> {
        self.cache
            .get_or_try_init(|| async {
                debug!(backend = self.source.name(), "Loading secret document");
                self.source.load().await
            })
            .await
    }

    async fn lookup(&self, key: &str) -> Result<Option<String>, SecretsError> {
        Ok(self.document().await?.get(key).cloned())
    }
}

const BACKEND_VAULT: &str = "vault";

/// Stands in for a store whose configuration is incomplete. Every load fails
/// with the original reason, so `resolve` skips it and `try_resolve` reports it.
struct UnconfiguredSource {
    backend: &'static str,
    reason: String,
}

impl UnconfiguredSource {
    fn from_error(backend: &'static str, error: SecretsError) -> Self {
        let reason = match error {
            SecretsError::NotConfigured { reason, .. } => reason,
            other => other.to_string(),
        };
        Self { backend, reason }
    }
}

#[async_trait]
impl SecretSource for UnconfiguredSource {
    fn name(&self) -> &str {
        self.backend
    }

    async fn load(&self) -> Result<SecretMap, SecretsError> {
        Err(SecretsError::NotConfigured {
            backend: self.backend.to_string(),
            reason: self.reason.clone(),
        })
    }
}

pub struct SecretResolver {
    env: EnvLookup,
    json_secret_name: Option<String>,
    json_store: Option<CachedSource>,
    kv_store: Option<CachedSource>,
}

impl fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResolver")
            .field("json_secret_name", &self.json_secret_name)
            .field("json_store", &self.json_store.as_ref().map(|s| s.source.name()))
            .field("kv_store", &self.kv_store.as_ref().map(|s| s.source.name()))
            .finish()
    }
}

impl Default for SecretResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretResolver {
    /// Environment-only resolver.
    pub fn new() -> Self {
        Self {
            env: Arc::new(|key: &str| std::env::var(key).ok()),
            json_secret_name: None,
            json_store: None,
            kv_store: None,
        }
    }

    /// Build the store chain described by configuration. An incomplete Vault
    /// setup is logged and kept as a store that always reports itself
    /// unconfigured.
    pub fn from_config(config: &SecretsConfig) -> Self {
        let mut resolver = Self::new();

        if let Some(name) = &config.aws_secret_name {
            let source = AwsSecretsManagerSource::new(name.clone(), config.aws_region.clone());
            resolver = resolver.with_json_store(name.clone(), Arc::new(source));
        }

        if let Some(path) = &config.vault_secret_path {
            let token = resolver.resolve_reference(config.vault_token.as_deref());
            let source: Arc<dyn SecretSource> = match Self::vault_source(config, &token, path) {
                Ok(source) => Arc::new(source),
                Err(e) => {
                    warn!(error = %e, "Vault store misconfigured, lookups will skip it");
                    Arc::new(UnconfiguredSource::from_error(BACKEND_VAULT, e))
                }
            };
            resolver = resolver.with_kv_store(source);
        }

        resolver
    }

    fn vault_source(config: &SecretsConfig, token: &str, path: &str) -> Result<VaultKvSource, SecretsError> {
        let addr = config.vault_addr.as_deref().ok_or_else(|| SecretsError::NotConfigured {
            backend: BACKEND_VAULT.to_string(),
            reason: "VAULT_ADDR is not set".to_string(),
        })?;
        VaultKvSource::new(addr, token, &config.vault_mount, path)
    }

    /// Replace the environment lookup (tests, sandboxed callers).
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Register the JSON-blob store; `secret_name` is also what
    /// [`resolve_json`](Self::resolve_json) matches against.
    pub fn with_json_store(mut self, secret_name: impl Into<String>, source: Arc<dyn SecretSource>) -> Self {
        self.json_secret_name = Some(secret_name.into());
        self.json_store = Some(CachedSource::new(source));
        self
    }

    pub fn with_kv_store(mut self, source: Arc<dyn SecretSource>) -> Self {
        self.kv_store = Some(CachedSource::new(source));
        self
    }

    pub fn env_var(&self, key: &str) -> Option<String> {
        (self.env)(key)
    }

    fn stores(&self) -> impl Iterator<Item = &CachedSource> {
        self.json_store.iter().chain(self.kv_store.iter())
    }

    /// Look `key` up, propagating the first store error.
    pub async fn try_resolve(&self, key: &str) -> Result<Option<String>, SecretsError> {
        if let Some(value) = self.env_var(key) {
            return Ok(Some(value));
        }

        for store in self.stores() {
            if let Some(value) = store.lookup(key).await? {
                debug!(key, backend = store.source.name(), "Secret resolved from store");
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    /// Look `key` up, skipping stores that fail, and fall back to `default`.
    pub async fn resolve(&self, key: &str, default: Option<&str>) -> Option<String> {
        if let Some(value) = self.env_var(key) {
            return Some(value);
        }

        for store in self.stores() {
            match store.lookup(key).await {
                Ok(Some(value)) => {
                    debug!(key, backend = store.source.name(), "Secret resolved from store");
                    return Some(value);
                }
                Ok(None) => {}
                Err(e) => warn!(key, error = %e, "Secret store unavailable, trying next source"),
            }
        }

        default.map(str::to_string)
    }

    /// Whole-document lookup: the environment variable `name` parsed as a JSON
    /// object, else the JSON-blob store when `name` is its secret name, else empty.
    pub async fn resolve_json(&self, name: &str) -> SecretMap {
        if let Some(raw) = self.env_var(name).filter(|raw| !raw.is_empty()) {
            return match serde_json::from_str(&raw)
                .map_err(|e| SecretsError::Malformed {
                    backend: "environment".to_string(),
                    reason: e.to_string(),
                })
                .and_then(|value| secret_map_from_json("environment", value))
            {
                Ok(map) => map,
                Err(e) => {
                    warn!(name, error = %e, "Ignoring unparseable JSON secret from environment");
                    SecretMap::new()
                }
            };
        }

        match (&self.json_secret_name, &self.json_store) {
            (Some(secret_name), Some(store)) if secret_name == name => match store.document().await {
                Ok(doc) => doc.clone(),
                Err(e) => {
                    warn!(name, error = %e, "JSON secret store unavailable");
                    SecretMap::new()
                }
            },
            _ => SecretMap::new(),
        }
    }

    /// Expand an `env:VAR` reference, pass literals through, `None` to empty.
    pub fn resolve_reference(&self, reference: Option<&str>) -> String {
        match reference {
            Some(r) => match r.strip_prefix("env:") {
                Some(var) => self.env_var(var).unwrap_or_default(),
                None => r.to_string(),
            },
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeStore {
        name: &'static str,
        data: SecretMap,
        fail_times: usize,
        loads: AtomicUsize,
    }

    impl FakeStore {
        fn new(name: &'static str, pairs: &[(&str, &str)]) -> Self {
            Self {
                name,
                data: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                fail_times: 0,
                loads: AtomicUsize::new(0),
            }
        }

        fn failing(mut self, times: usize) -> Self {
            self.fail_times = times;
            self
        }
    }

    #[async_trait]
    impl SecretSource for FakeStore {
        fn name(&self) -> &str {
            self.name
        }

        async fn load(&self) -> Result<SecretMap, SecretsError> {
            let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_times {
                return Err(SecretsError::Backend {
                    backend: self.name.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Ok(self.data.clone())
        }
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_environment_wins() {
        let resolver = SecretResolver::new()
            .with_env_lookup(env(&[("OPENAI_API_KEY", "from-env")]))
            .with_json_store("app", Arc::new(FakeStore::new("json", &[("OPENAI_API_KEY", "from-json")])));

        assert_eq!(resolver.resolve("OPENAI_API_KEY", None).await.as_deref(), Some("from-env"));
    }

    #[tokio::test]
    async fn test_json_store_before_kv_store() {
        let resolver = SecretResolver::new()
            .with_env_lookup(env(&[]))
            .with_json_store("app", Arc::new(FakeStore::new("json", &[("K", "json")])))
            .with_kv_store(Arc::new(FakeStore::new("kv", &[("K", "kv"), ("ONLY_KV", "kv")])));

        assert_eq!(resolver.resolve("K", None).await.as_deref(), Some("json"));
        assert_eq!(resolver.resolve("ONLY_KV", None).await.as_deref(), Some("kv"));
        assert_eq!(resolver.resolve("MISSING", Some("dflt")).await.as_deref(), Some("dflt"));
        assert_eq!(resolver.resolve("MISSING", None).await, None);
    }

    #[tokio::test]
    async fn test_documents_are_cached_after_success() {
        let store = Arc::new(FakeStore::new("json", &[("A", "1"), ("B", "2")]));
        let resolver = SecretResolver::new()
            .with_env_lookup(env(&[]))
            .with_json_store("app", store.clone());

        resolver.resolve("A", None).await;
        resolver.resolve("B", None).await;
        resolver.resolve("C", None).await;
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_store_falls_through_and_retries_later() {
        let json = Arc::new(FakeStore::new("json", &[("K", "json")]).failing(1));
        let resolver = SecretResolver::new()
            .with_env_lookup(env(&[]))
            .with_json_store("app", json.clone())
            .with_kv_store(Arc::new(FakeStore::new("kv", &[("K", "kv")])));

        assert_eq!(resolver.resolve("K", None).await.as_deref(), Some("kv"));
        assert_eq!(resolver.resolve("K", None).await.as_deref(), Some("json"));
        assert_eq!(json.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_try_resolve_propagates_store_errors() {
        let resolver = SecretResolver::new()
            .with_env_lookup(env(&[]))
            .with_json_store("app", Arc::new(FakeStore::new("json", &[]).failing(5)));

        let err = resolver.try_resolve("K").await.unwrap_err();
        assert!(matches!(err, SecretsError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_resolve_json() {
        let resolver = SecretResolver::new()
            .with_env_lookup(env(&[
                ("INLINE", r#"{"user": "bob", "port": 5432}"#),
                ("BROKEN", "{not json"),
            ]))
            .with_json_store("prod/app", Arc::new(FakeStore::new("json", &[("API", "k")])));

        let inline = resolver.resolve_json("INLINE").await;
        assert_eq!(inline.get("user").map(String::as_str), Some("bob"));
        assert_eq!(inline.get("port").map(String::as_str), Some("5432"));

        assert!(resolver.resolve_json("BROKEN").await.is_empty());
        assert_eq!(resolver.resolve_json("prod/app").await.get("API").map(String::as_str), Some("k"));
        assert!(resolver.resolve_json("other/app").await.is_empty());
    }

    #[test]
    fn test_resolve_reference() {
        let resolver = SecretResolver::new().with_env_lookup(env(&[("TOKEN", "t-1")]));
        assert_eq!(resolver.resolve_reference(Some("env:TOKEN")), "t-1");
        assert_eq!(resolver.resolve_reference(Some("env:NOPE")), "");
        assert_eq!(resolver.resolve_reference(Some("literal")), "literal");
        assert_eq!(resolver.resolve_reference(None), "");
    }

    #[tokio::test]
    async fn test_kv_path_without_address_degrades() {
        let config = SecretsConfig {
            vault_secret_path: Some("chorus/keys".to_string()),
            ..SecretsConfig::default()
        };
        let resolver = SecretResolver::from_config(&config)
            .with_env_lookup(env(&[("OPENAI_API_KEY", "from-env")]));

        assert_eq!(resolver.resolve("OPENAI_API_KEY", None).await.as_deref(), Some("from-env"));
        assert_eq!(resolver.resolve("MISSING", Some("dflt")).await.as_deref(), Some("dflt"));

        let err = resolver.try_resolve("MISSING").await.unwrap_err();
        match err {
            SecretsError::NotConfigured { backend, reason } => {
                assert_eq!(backend, "vault");
                assert!(reason.contains("VAULT_ADDR"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The environment still wins for strict lookups.
        assert_eq!(resolver.try_resolve("OPENAI_API_KEY").await.unwrap().as_deref(), Some("from-env"));
    }

    #[tokio::test]
    async fn test_unparseable_vault_address_degrades() {
        let config = SecretsConfig {
            vault_addr: Some("not a url".to_string()),
            vault_secret_path: Some("chorus/keys".to_string()),
            ..SecretsConfig::default()
        };
        let resolver = SecretResolver::from_config(&config).with_env_lookup(env(&[]));

        assert_eq!(resolver.resolve("K", Some("dflt")).await.as_deref(), Some("dflt"));
        assert!(matches!(
            resolver.try_resolve("K").await,
            Err(SecretsError::NotConfigured { .. })
        ));
    }
}
