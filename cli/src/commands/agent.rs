// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use chorus_core::application::agent::LlmAgent;
use chorus_core::domain::agent::{AgentDefinition, AgentHandle};
use chorus_core::domain::llm::GenerationOptions;

use crate::context::{default_roster, NodeContext};

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List configured agents and model aliases
    List {
        /// Also check that every model provider is reachable
        #[arg(long)]
        health: bool,
    },

    /// Ask one agent a question
    Respond {
        /// Prompt to send
        #[arg(short, long)]
        prompt: String,

        /// Agent ID (default: first configured agent)
        #[arg(long, value_name = "AGENT_ID")]
        agent: Option<String>,

        /// Maximum tokens in the reply
        #[arg(long)]
        max_tokens: Option<u32>,
    },
}

pub async fn handle_command(command: AgentCommand, config_path: Option<PathBuf>) -> Result<()> {
    let ctx = NodeContext::load(config_path).await?;

    match command {
        AgentCommand::List { health } => {
            list_agents(&ctx);
            if health {
                print_provider_health(&ctx).await;
            }
            Ok(())
        }
        AgentCommand::Respond {
            prompt,
            agent,
            max_tokens,
        } => respond(&ctx, &prompt, agent.as_deref(), max_tokens).await,
    }
}

fn list_agents(ctx: &NodeContext) {
    let agents = &ctx.config.spec.agents;

    if agents.is_empty() {
        println!("{}", "No agents configured".yellow());
    } else {
        println!("{} agents configured:", agents.len());
        println!("{:<20} {:<20} {}", "ID", "ROLE", "MODEL");
        for agent in agents {
            println!(
                "{:<20} {:<20} {}",
                agent.id.as_str().bold(),
                agent.spec.role,
                agent.spec.base_model
            );
        }
    }
    println!();

    let mode = if ctx.registry.is_offline() {
        "offline (echo)".yellow()
    } else {
        "online".green()
    };
    println!("Model aliases ({}): {}", mode, ctx.registry.available_aliases().join(", "));
}

async fn print_provider_health(ctx: &NodeContext) {
    println!();
    println!("{}", "Provider health:".bold());
    for (name, status) in ctx.registry.health_check_all().await {
        match status {
            Ok(()) => println!("  {} {}", "✓".green(), name),
            Err(e) => println!("  {} {} ({})", "✗".red(), name, e),
        }
    }
}

fn select_agent(ctx: &NodeContext, requested: Option<&str>) -> Result<AgentDefinition> {
    let configured = &ctx.config.spec.agents;
    match requested {
        Some(id) => configured
            .iter()
            .find(|a| a.id.as_str() == id)
            .cloned()
            .with_context(|| format!("Agent '{}' not found in configuration", id)),
        None => configured
            .first()
            .cloned()
            .or_else(|| default_roster(1).into_iter().next())
            .context("No agent available"),
    }
}

async fn respond(
    ctx: &NodeContext,
    prompt: &str,
    requested: Option<&str>,
    max_tokens: Option<u32>,
) -> Result<()> {
    let definition = select_agent(ctx, requested)?;

    let mut options = GenerationOptions::default();
    if max_tokens.is_some() {
        options.max_tokens = max_tokens;
    }

    let agent = LlmAgent::from_definition(&definition, ctx.registry.clone())
        .with_offline_fallback(ctx.config.spec.llm_selection.offline_fallback)
        .with_options(options);

    let reply = agent
        .respond(prompt)
        .await
        .with_context(|| format!("Agent '{}' failed to respond", definition.id))?;

    println!("{}", reply);
    Ok(())
}
