// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use chorus_core::domain::node_config::NodeConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./chorus-config.yaml")]
        output: PathBuf,

        /// Include example providers, agents and secret stores
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = NodeConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. CHORUS_CONFIG_PATH: {}",
            std::env::var("CHORUS_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./chorus-config.yaml");
        println!("  4. ~/.chorus/config.yaml");
        println!("  5. /etc/chorus/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Node:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    let spec = &config.spec;

    println!("{}", "LLM Providers:".bold());
    if spec.llm_providers.is_empty() {
        println!("  {}", "(none; OPENAI_API_KEY or offline echo)".dimmed());
    }
    for provider in &spec.llm_providers {
        println!("  {} ({})", provider.name.bold(), provider.provider_type);
        println!("    Endpoint: {}", provider.endpoint);
        println!("    Enabled: {}", provider.enabled);
        for model in &provider.models {
            println!("      - {} → {}", model.alias, model.model);
        }
    }
    println!();

    println!("{}", "LLM Selection:".bold());
    println!("  Default alias: {}", spec.llm_selection.default_alias);
    if let Some(fallback) = &spec.llm_selection.fallback_provider {
        println!("  Fallback provider: {}", fallback);
    }
    println!(
        "  Retries: {} (base delay {} ms)",
        spec.llm_selection.max_retries, spec.llm_selection.retry_delay_ms
    );
    println!("  No-key mode: {}", spec.llm_selection.no_key_mode);
    println!("  Offline fallback: {}", spec.llm_selection.offline_fallback);
    println!();

    println!("{}", "Swarm:".bold());
    println!("  Execution mode: {}", spec.swarm.execution_mode);
    println!("  Max responses: {}", spec.swarm.max_responses);
    println!("  Failure policy: {}", spec.swarm.failure_policy);
    println!("  Tie-break: {}", spec.swarm.tie_break);
    match spec.swarm.timeout_ms {
        Some(ms) => println!("  Timeout: {} ms", ms),
        None => println!("  Timeout: {}", "(none)".dimmed()),
    }
    println!();

    println!("{}", "Secret Stores:".bold());
    match &spec.secrets.aws_secret_name {
        Some(name) => println!("  AWS Secrets Manager: {}", name),
        None => println!("  AWS Secrets Manager: {}", "(not set)".dimmed()),
    }
    match (&spec.secrets.vault_addr, &spec.secrets.vault_secret_path) {
        (Some(addr), Some(path)) => {
            println!("  Vault KV v2: {} {}/{}", addr, spec.secrets.vault_mount, path)
        }
        _ => println!("  Vault KV v2: {}", "(not set)".dimmed()),
    }
    println!();

    println!("{} {}", "Agents:".bold(), spec.agents.len());

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = NodeConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_templates_are_valid() {
        for template in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let config = chorus_core::domain::node_config::NodeConfigManifest::from_yaml_str(template)
                .unwrap();
            config.validate().unwrap();
        }
    }
}
