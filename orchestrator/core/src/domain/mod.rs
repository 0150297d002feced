// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Domain vocabulary: agents, generation, secrets, swarm policy and node configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and the traits infrastructure implements

pub mod agent;
pub mod llm;
pub mod node_config;
pub mod secrets;
pub mod swarm;
