// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Swarm use cases: fan a prompt out, reduce the replies.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** `SwarmService` and the dispatch strategies behind it

pub mod dispatch;
pub mod orchestrator;
pub mod strategy;

use std::sync::Arc;

use async_trait::async_trait;
use chorus_core::domain::agent::AgentHandle;

use crate::domain::{SwarmError, SwarmRequest, SwarmResult};

pub use dispatch::{AgentDispatcher, LocalDispatcher};
pub use orchestrator::SwarmOrchestrator;
pub use strategy::ExecutionStrategy;

#[async_trait]
pub trait SwarmService: Send + Sync {
    /// Ask up to `request.max_responses` agents and reduce their replies.
    async fn run_swarm(
        &self,
        agents: &[Arc<dyn AgentHandle>],
        request: &SwarmRequest,
    ) -> Result<SwarmResult, SwarmError>;
}
