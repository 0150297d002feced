// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use tracing::{info, warn};

use chorus_core::domain::agent::AgentHandle;
use chorus_core::domain::node_config::SwarmSettings;

use super::dispatch::AgentDispatcher;
use super::strategy::ExecutionStrategy;
use super::SwarmService;
use crate::domain::{
    consensus_with, DispatchOptions, FailurePolicy, SwarmError, SwarmRequest, SwarmResult, TieBreak,
};

/// Dispatcher plus consensus reducer.
pub struct SwarmOrchestrator {
    strategy: ExecutionStrategy,
    dispatcher: Arc<dyn AgentDispatcher>,
    options: DispatchOptions,
    tie_break: TieBreak,
}

impl SwarmOrchestrator {
    pub fn new(strategy: ExecutionStrategy) -> Self {
        Self {
            dispatcher: strategy.dispatcher(),
            strategy,
            options: DispatchOptions::default(),
            tie_break: TieBreak::default(),
        }
    }

    /// Build from configuration, probing the actor runtime if asked for.
    pub async fn from_settings(settings: &SwarmSettings) -> Self {
        let strategy = ExecutionStrategy::select(settings.execution_mode).await;
        Self::new(strategy)
            .with_failure_policy(settings.failure_policy)
            .with_tie_break(settings.tie_break)
            .with_timeout(settings.timeout())
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.options.failure_policy = policy;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn strategy(&self) -> &ExecutionStrategy {
        &self.strategy
    }
}

#[async_trait]
impl SwarmService for SwarmOrchestrator {
    async fn run_swarm(
        &self,
        agents: &[Arc<dyn AgentHandle>],
        request: &SwarmRequest,
    ) -> Result<SwarmResult, SwarmError> {
        let strategy = self.dispatcher.name();
        let invoked = request.bound(agents.len());
        info!(strategy, agents = invoked, "Running swarm");

        counter!("chorus_swarm_dispatches_total", "strategy" => strategy).increment(1);
        let started = Instant::now();
        let outcome = self.dispatcher.dispatch(agents, request, &self.options).await;
        histogram!("chorus_swarm_dispatch_duration_seconds", "strategy" => strategy)
            .record(started.elapsed().as_secs_f64());

        let dispatched = match outcome {
            Ok(dispatched) => dispatched,
            Err(e) => {
                if let SwarmError::AgentFailures { failures, .. } = &e {
                    counter!("chorus_swarm_agent_failures_total", "strategy" => strategy)
                        .increment(failures.len() as u64);
                }
                warn!(strategy, error = %e, "Swarm dispatch failed");
                return Err(e);
            }
        };

        if !dispatched.failures.is_empty() {
            counter!("chorus_swarm_agent_failures_total", "strategy" => strategy)
                .increment(dispatched.failures.len() as u64);
        }

        let consensus = consensus_with(&dispatched.responses, self.tie_break);
        info!(strategy, responses = dispatched.responses.len(), "Swarm finished");

        Ok(SwarmResult {
            responses: dispatched.responses,
            consensus,
            failures: dispatched.failures,
        })
    }
}
