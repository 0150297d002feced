// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Requests and Results
//!
//! - [`SwarmRequest`]: one prompt and the maximum number of agents to ask.
//! - [`Dispatched`]: replies in agent order, as produced by a dispatcher.
//! - [`SwarmResult`]: replies plus the consensus value.
//! - [`SwarmError`]: why a dispatch produced no result.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use chorus_core::domain::agent::{AgentError, AgentId};
pub use chorus_core::domain::swarm::{ExecutionMode, FailurePolicy, TieBreak, DEFAULT_MAX_RESPONSES};

/// A prompt fanned out to at most `max_responses` agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmRequest {
    pub prompt: String,
    pub max_responses: usize,
}

impl SwarmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_responses: DEFAULT_MAX_RESPONSES,
        }
    }

    pub fn with_max_responses(mut self, max_responses: usize) -> Self {
        self.max_responses = max_responses;
        self
    }

    /// How many of `available` agents this request will invoke.
    pub fn bound(&self, available: usize) -> usize {
        available.min(self.max_responses)
    }
}

/// Per-dispatch knobs fixed by the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub failure_policy: FailurePolicy,
    /// Whole-dispatch deadline; outstanding invocations are cancelled on expiry.
    pub timeout: Option<Duration>,
}

/// One agent that did not reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    /// Position of the agent in the dispatched list
    pub index: usize,
    pub agent_id: AgentId,
    pub error: AgentError,
}

impl AgentFailure {
    /// Placeholder reply used under [`FailurePolicy::MarkFailures`].
    pub fn marker(&self) -> String {
        format!("[error] agent {}: {}", self.agent_id, self.error)
    }
}

/// Replies collected by a dispatcher, index-aligned with the invoked agents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatched {
    pub responses: Vec<String>,
    /// Only populated under [`FailurePolicy::MarkFailures`]
    pub failures: Vec<AgentFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmResult {
    pub responses: Vec<String>,
    pub consensus: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AgentFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwarmError {
    #[error("{} of {} agents failed: {}", .failures.len(), .dispatched, describe_failures(.failures))]
    AgentFailures {
        dispatched: usize,
        failures: Vec<AgentFailure>,
    },

    #[error("swarm dispatch timed out after {0:?}")]
    Timeout(Duration),

    #[error("dispatch backend error: {0}")]
    Backend(String),
}

impl SwarmError {
    /// Indices of the failed agents, ascending. Empty for non-agent errors.
    pub fn failed_indices(&self) -> Vec<usize> {
        match self {
            SwarmError::AgentFailures { failures, .. } => failures.iter().map(|f| f.index).collect(),
            _ => Vec::new(),
        }
    }
}

fn describe_failures(failures: &[AgentFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("#{} ({}): {}", f.index, f.agent_id, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}
