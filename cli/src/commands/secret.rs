// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Secret commands
//!
//! Values are looked up in the environment, then the AWS Secrets Manager
//! secret, then the Vault KV path.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use crate::context::NodeContext;

#[derive(Subcommand)]
pub enum SecretCommand {
    /// Print the value of one secret
    Get {
        /// Secret key
        #[arg(value_name = "KEY")]
        key: String,

        /// Value printed when no store has the key
        #[arg(long)]
        default: Option<String>,

        /// Fail on store errors instead of skipping the store
        #[arg(long)]
        strict: bool,
    },

    /// Print a JSON secret (environment variable or the configured AWS secret)
    Json {
        /// Environment variable or secret name
        #[arg(value_name = "NAME")]
        name: String,
    },
}

pub async fn handle_command(command: SecretCommand, config_path: Option<PathBuf>) -> Result<()> {
    let ctx = NodeContext::load(config_path).await?;

    match command {
        SecretCommand::Get {
            key,
            default,
            strict,
        } => {
            let value = if strict {
                ctx.secrets
                    .try_resolve(&key)
                    .await
                    .with_context(|| format!("Failed to resolve secret '{}'", key))?
                    .or(default)
            } else {
                ctx.secrets.resolve(&key, default.as_deref()).await
            };

            let value = value.with_context(|| format!("Secret '{}' not found", key))?;
            println!("{}", value);
            Ok(())
        }
        SecretCommand::Json { name } => {
            let map = ctx.secrets.resolve_json(&name).await;
            println!("{}", serde_json::to_string_pretty(&map)?);
            Ok(())
        }
    }
}
