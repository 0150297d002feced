// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Chorus CLI
//!
//! The `chorus` binary fans prompts out to agent swarms and reports the
//! consensus.
//!
//! ## Commands
//!
//! - `chorus swarm run` - Ask several agents, print replies and consensus
//! - `chorus agent list|respond` - Inspect and query configured agents
//! - `chorus secret get|json` - Resolve secrets through env, AWS and Vault
//! - `chorus config show|validate|generate` - Configuration management

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use chorus_cli::commands::{self, AgentCommand, ConfigCommand, SecretCommand, SwarmCommand};
use chorus_cli::logging::{init_logging, LogFormat};

/// Chorus - Agent swarms with majority-vote consensus
#[derive(Parser)]
#[command(name = "chorus")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CHORUS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CHORUS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Swarm operations
    #[command(name = "swarm")]
    Swarm {
        #[command(subcommand)]
        command: SwarmCommand,
    },

    /// Agent operations
    #[command(name = "agent")]
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Secret resolution
    #[command(name = "secret")]
    Secret {
        #[command(subcommand)]
        command: SecretCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Some(Commands::Swarm { command }) => {
            commands::swarm::handle_command(command, cli.config).await
        }
        Some(Commands::Agent { command }) => {
            commands::agent::handle_command(command, cli.config).await
        }
        Some(Commands::Secret { command }) => {
            commands::secret::handle_command(command, cli.config).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}
