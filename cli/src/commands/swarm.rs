// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Swarm commands
//!
//! Commands: run

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use chorus_swarm::{
    tally, ExecutionMode, FailurePolicy, SwarmOrchestrator, SwarmRequest, SwarmResult,
    SwarmService, TieBreak,
};

use crate::context::NodeContext;

#[derive(Subcommand)]
pub enum SwarmCommand {
    /// Send a prompt to several agents and print their consensus
    Run {
        /// Prompt sent to every agent
        #[arg(short, long)]
        prompt: String,

        /// YAML list of agent definitions (default: configured agents)
        #[arg(long, value_name = "FILE")]
        agents: Option<PathBuf>,

        /// Maximum number of agents to ask
        #[arg(short = 'n', long)]
        max_responses: Option<usize>,

        /// Execution strategy (local, actor)
        #[arg(long)]
        strategy: Option<ExecutionMode>,

        /// Failure policy (fail-fast, fail-after-all, mark-failures)
        #[arg(long)]
        failure_policy: Option<FailurePolicy>,

        /// Tie-break rule (first-to-reach-max, first-seen, lexicographic)
        #[arg(long)]
        tie_break: Option<TieBreak>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(command: SwarmCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        SwarmCommand::Run {
            prompt,
            agents,
            max_responses,
            strategy,
            failure_policy,
            tie_break,
            json,
        } => {
            let ctx = NodeContext::load(config_path).await?;

            let mut settings = ctx.config.spec.swarm.clone();
            if let Some(mode) = strategy {
                settings.execution_mode = mode;
            }
            if let Some(policy) = failure_policy {
                settings.failure_policy = policy;
            }
            if let Some(rule) = tie_break {
                settings.tie_break = rule;
            }
            let max_responses = max_responses.unwrap_or(settings.max_responses);

            let definitions = ctx.agent_definitions(agents.as_deref(), max_responses)?;
            let handles = ctx.build_agents(&definitions);
            let orchestrator = SwarmOrchestrator::from_settings(&settings).await;

            if ctx.registry.is_offline() && !json {
                eprintln!("{}", "⚠ No model API key resolved; agents reply in demo mode".yellow());
            }

            let request = SwarmRequest::new(prompt).with_max_responses(max_responses);
            let result = orchestrator
                .run_swarm(&handles, &request)
                .await
                .context("Swarm run failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result, orchestrator.strategy().mode());
            }

            Ok(())
        }
    }
}

fn print_result(result: &SwarmResult, mode: ExecutionMode) {
    println!(
        "{}",
        format!("{} responses ({} strategy)", result.responses.len(), mode).bold()
    );
    for (i, response) in result.responses.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, response);
    }
    println!();

    let votes = tally(&result.responses);
    if votes.len() > 1 {
        println!("{}", "Votes:".bold());
        for vote in &votes {
            println!("  {:>3}  {}", vote.count, vote.value);
        }
        println!();
    }

    for failure in &result.failures {
        println!(
            "{}",
            format!("✗ agent {} failed: {}", failure.agent_id, failure.error).red()
        );
    }

    if result.responses.is_empty() {
        println!("{}", "No agents were asked".yellow());
    } else {
        println!("{} {}", "Consensus:".bold(), result.consensus.green());
    }
}
