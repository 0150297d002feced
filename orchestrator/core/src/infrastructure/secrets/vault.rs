// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Vault KV v2 adapter: reads the latest version of one secret path.

use async_trait::async_trait;
use std::collections::HashMap;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};

use crate::domain::secrets::{secret_map_from_json, SecretMap, SecretSource, SecretsError};

const BACKEND: &str = "vault";

pub struct VaultKvSource {
    client: VaultClient,
    mount: String,
    path: String,
}

impl VaultKvSource {
    pub fn new(addr: &str, token: &str, mount: &str, path: &str) -> Result<Self, SecretsError> {
        // The settings builder panics on a bad URL, so check it first.
        reqwest::Url::parse(addr).map_err(|e| SecretsError::NotConfigured {
            backend: BACKEND.to_string(),
            reason: format!("invalid VAULT_ADDR '{}': {}", addr, e),
        })?;

        let settings = VaultClientSettingsBuilder::default()
            .address(addr)
            .token(token)
            .build()
            .map_err(|e| SecretsError::NotConfigured {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;

        let client = VaultClient::new(settings).map_err(|e| SecretsError::NotConfigured {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            mount: mount.to_string(),
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl SecretSource for VaultKvSource {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn load(&self) -> Result<SecretMap, SecretsError> {
        let data: HashMap<String, serde_json::Value> =
            vaultrs::kv2::read(&self.client, &self.mount, &self.path)
                .await
                .map_err(|e| SecretsError::Backend {
                    backend: BACKEND.to_string(),
                    reason: e.to_string(),
                })?;

        secret_map_from_json(BACKEND, serde_json::Value::Object(data.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_is_rejected() {
        let result = VaultKvSource::new("not a url", "token", "secret", "chorus");
        assert!(matches!(result, Err(SecretsError::NotConfigured { .. })));
    }

    #[test]
    fn test_valid_address_builds_client() {
        let source = VaultKvSource::new("http://127.0.0.1:8200", "token", "secret", "chorus").unwrap();
        assert_eq!(source.name(), "vault");
        assert_eq!(source.mount, "secret");
    }
}
