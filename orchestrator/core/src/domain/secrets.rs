// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Secret Stores
//!
//! A [`SecretSource`] yields a whole key/value document from a remote store
//! (one JSON secret, one KV path). The resolver in
//! [`crate::application::secrets`] decides precedence and caching; sources
//! only fetch.

use async_trait::async_trait;
use std::collections::HashMap;

/// Flattened key/value view of one remote secret document.
pub type SecretMap = HashMap<String, String>;

#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Short backend name used in logs (e.g. "aws-secrets-manager").
    fn name(&self) -> &str;

    /// Fetch the full document. Called at most once per successful load.
    async fn load(&self) -> Result<SecretMap, SecretsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("{backend} is not configured: {reason}")]
    NotConfigured { backend: String, reason: String },

    #[error("{backend} request failed: {reason}")]
    Backend { backend: String, reason: String },

    #[error("{backend} returned a malformed secret: {reason}")]
    Malformed { backend: String, reason: String },
}

/// Render a JSON value the way callers expect to read it back as a string:
/// strings verbatim, everything else as JSON text.
pub fn secret_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten a JSON object into a [`SecretMap`]. Non-object documents are rejected.
pub fn secret_map_from_json(backend: &str, value: serde_json::Value) -> Result<SecretMap, SecretsError> {
    match value {
        serde_json::Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), secret_value_to_string(v)))
            .collect()),
        serde_json::Value::Null => Ok(SecretMap::new()),
        other => Err(SecretsError::Malformed {
            backend: backend.to_string(),
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
