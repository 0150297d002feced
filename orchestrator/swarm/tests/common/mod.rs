// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Scripted agents shared by the swarm integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chorus_core::domain::agent::{AgentError, AgentHandle, AgentId};
use chorus_swarm::{ExecutionMode, ExecutionStrategy, SwarmOrchestrator};

/// Replies with a fixed outcome after a fixed delay and counts finished calls.
pub struct ScriptedAgent {
    id: AgentId,
    outcome: Result<String, AgentError>,
    delay: Duration,
    finished: AtomicUsize,
}

impl ScriptedAgent {
    pub fn replying(id: &str, reply: &str) -> Self {
        Self {
            id: AgentId::new(id),
            outcome: Ok(reply.to_string()),
            delay: Duration::ZERO,
            finished: AtomicUsize::new(0),
        }
    }

    pub fn failing(id: &str, reason: &str) -> Self {
        Self {
            id: AgentId::new(id),
            outcome: Err(AgentError::Generation(reason.to_string())),
            delay: Duration::ZERO,
            finished: AtomicUsize::new(0),
        }
    }

    pub fn after(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentHandle for ScriptedAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    async fn respond(&self, _prompt: &str) -> Result<String, AgentError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

pub fn handles(agents: &[Arc<ScriptedAgent>]) -> Vec<Arc<dyn AgentHandle>> {
    agents
        .iter()
        .map(|a| a.clone() as Arc<dyn AgentHandle>)
        .collect()
}

pub fn replying(replies: &[&str]) -> Vec<Arc<dyn AgentHandle>> {
    replies
        .iter()
        .enumerate()
        .map(|(i, r)| Arc::new(ScriptedAgent::replying(&format!("agent-{i}"), r)) as Arc<dyn AgentHandle>)
        .collect()
}

pub async fn orchestrator(mode: ExecutionMode) -> SwarmOrchestrator {
    SwarmOrchestrator::new(ExecutionStrategy::select(mode).await)
}

pub const MODES: [ExecutionMode; 2] = [ExecutionMode::Local, ExecutionMode::Actor];
