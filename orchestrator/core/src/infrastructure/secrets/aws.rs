// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// AWS Secrets Manager adapter: one secret whose SecretString is a JSON object.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::error::DisplayErrorContext;

use crate::domain::secrets::{secret_map_from_json, SecretMap, SecretSource, SecretsError};

const BACKEND: &str = "aws-secrets-manager";

pub struct AwsSecretsManagerSource {
    secret_name: String,
    region: Option<String>,
}

impl AwsSecretsManagerSource {
    pub fn new(secret_name: String, region: Option<String>) -> Self {
        Self {
            secret_name,
            region: region.filter(|r| !r.is_empty()),
        }
    }

    async fn client(&self) -> aws_sdk_secretsmanager::Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        aws_sdk_secretsmanager::Client::new(&loader.load().await)
    }
}

#[async_trait]
impl SecretSource for AwsSecretsManagerSource {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn load(&self) -> Result<SecretMap, SecretsError> {
        let output = self
            .client()
            .await
            .get_secret_value()
            .secret_id(&self.secret_name)
            .send()
            .await
            .map_err(|e| SecretsError::Backend {
                backend: BACKEND.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        // Binary secrets carry no key/value document.
        let Some(raw) = output.secret_string() else {
            return Ok(SecretMap::new());
        };

        let value = serde_json::from_str(raw).map_err(|e| SecretsError::Malformed {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;
        secret_map_from_json(BACKEND, value)
    }
}
