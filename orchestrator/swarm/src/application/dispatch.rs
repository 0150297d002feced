// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Dispatch
//!
//! [`AgentDispatcher`] invokes `respond(prompt)` on the first
//! `max_responses` agents and returns the replies in agent order, whatever
//! order they complete in.
//!
//! Both strategies hand their invocations to [`gather`], which applies the
//! [`FailurePolicy`] and the dispatch timeout.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use chorus_core::domain::agent::{AgentError, AgentHandle};

use crate::domain::{AgentFailure, DispatchOptions, Dispatched, FailurePolicy, SwarmError, SwarmRequest};

#[async_trait]
pub trait AgentDispatcher: Send + Sync {
    /// Strategy label used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn dispatch(
        &self,
        agents: &[Arc<dyn AgentHandle>],
        request: &SwarmRequest,
        options: &DispatchOptions,
    ) -> Result<Dispatched, SwarmError>;
}

/// Runs every invocation concurrently on the calling task.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDispatcher;

#[async_trait]
impl AgentDispatcher for LocalDispatcher {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn dispatch(
        &self,
        agents: &[Arc<dyn AgentHandle>],
        request: &SwarmRequest,
        options: &DispatchOptions,
    ) -> Result<Dispatched, SwarmError> {
        let selected = &agents[..request.bound(agents.len())];
        debug!(agents = selected.len(), "Dispatching locally");

        let invocations = selected
            .iter()
            .map(|agent| agent.respond(&request.prompt))
            .collect();

        gather(selected, invocations, options).await
    }
}

/// Await `invocations` (index-aligned with `agents`) under the dispatch
/// options. Dropping the returned future cancels whatever is still pending.
pub async fn gather<F>(
    agents: &[Arc<dyn AgentHandle>],
    invocations: Vec<F>,
    options: &DispatchOptions,
) -> Result<Dispatched, SwarmError>
where
    F: Future<Output = Result<String, AgentError>>,
{
    let collect = collect_replies(agents, invocations, options.failure_policy);
    match options.timeout {
        Some(limit) => tokio::time::timeout(limit, collect)
            .await
            .map_err(|_| SwarmError::Timeout(limit))?,
        None => collect.await,
    }
}

async fn collect_replies<F>(
    agents: &[Arc<dyn AgentHandle>],
    invocations: Vec<F>,
    policy: FailurePolicy,
) -> Result<Dispatched, SwarmError>
where
    F: Future<Output = Result<String, AgentError>>,
{
    let mut pending: FuturesUnordered<_> = invocations
        .into_iter()
        .enumerate()
        .map(|(index, invocation)| async move { (index, invocation.await) })
        .collect();

    let mut slots: Vec<Option<String>> = vec![None; agents.len()];
    let mut failures = Vec::new();

    while let Some((index, outcome)) = pending.next().await {
        let error = match outcome {
            Ok(reply) => {
                slots[index] = Some(reply);
                continue;
            }
            Err(error) => error,
        };

        let failure = AgentFailure {
            index,
            agent_id: agents[index].id().clone(),
            error,
        };
        debug!(index, agent_id = %failure.agent_id, error = %failure.error, "Agent failed");

        match policy {
            FailurePolicy::FailFast => {
                return Err(SwarmError::AgentFailures {
                    dispatched: agents.len(),
                    failures: vec![failure],
                });
            }
            FailurePolicy::FailAfterAll => failures.push(failure),
            FailurePolicy::MarkFailures => {
                slots[index] = Some(failure.marker());
                failures.push(failure);
            }
        }
    }

    failures.sort_by_key(|f: &AgentFailure| f.index);

    if policy == FailurePolicy::FailAfterAll && !failures.is_empty() {
        return Err(SwarmError::AgentFailures {
            dispatched: agents.len(),
            failures,
        });
    }

    Ok(Dispatched {
        responses: slots.into_iter().map(Option::unwrap_or_default).collect(),
        failures,
    })
}
