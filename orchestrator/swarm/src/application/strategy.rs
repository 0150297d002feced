// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::application::dispatch::{AgentDispatcher, LocalDispatcher};
use crate::domain::{ExecutionMode, SwarmError};
use crate::infrastructure::actor::ActorRuntime;

/// The dispatcher backend a process runs swarms on, chosen once at startup.
#[derive(Debug, Clone)]
pub enum ExecutionStrategy {
    Local,
    Actor(ActorRuntime),
}

impl ExecutionStrategy {
    /// Resolve a configured mode. The actor runtime is probed once; if it
    /// cannot start, swarms run locally.
    pub async fn select(mode: ExecutionMode) -> Self {
        Self::select_with(mode, ActorRuntime::initialize()).await
    }

    /// [`select`](Self::select) with a caller-supplied runtime initializer,
    /// awaited only for [`ExecutionMode::Actor`].
    pub async fn select_with<I>(mode: ExecutionMode, init: I) -> Self
    where
        I: Future<Output = Result<ActorRuntime, SwarmError>>,
    {
        match mode {
            ExecutionMode::Local => ExecutionStrategy::Local,
            ExecutionMode::Actor => match init.await {
                Ok(runtime) => ExecutionStrategy::Actor(runtime),
                Err(e) => {
                    warn!(error = %e, "Actor runtime unavailable, falling back to local dispatch");
                    ExecutionStrategy::Local
                }
            },
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        match self {
            ExecutionStrategy::Local => ExecutionMode::Local,
            ExecutionStrategy::Actor(_) => ExecutionMode::Actor,
        }
    }

    pub fn dispatcher(&self) -> Arc<dyn AgentDispatcher> {
        match self {
            ExecutionStrategy::Local => Arc::new(LocalDispatcher),
            ExecutionStrategy::Actor(runtime) => Arc::new(runtime.dispatcher()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_mode_never_probes() {
        let strategy = ExecutionStrategy::select(ExecutionMode::Local).await;
        assert_eq!(strategy.mode(), ExecutionMode::Local);
        assert_eq!(strategy.dispatcher().name(), "local");
    }

    async fn unavailable_runtime() -> Result<ActorRuntime, SwarmError> {
        Err(SwarmError::Backend("actor system offline".to_string()))
    }

    async fn runtime_never_needed() -> Result<ActorRuntime, SwarmError> {
        panic!("local mode must not start the actor runtime")
    }

    #[tokio::test]
    async fn test_unavailable_runtime_falls_back_to_local() {
        let strategy = ExecutionStrategy::select_with(ExecutionMode::Actor, unavailable_runtime()).await;

        assert_eq!(strategy.mode(), ExecutionMode::Local);
        assert_eq!(strategy.dispatcher().name(), "local");
    }

    #[tokio::test]
    async fn test_local_mode_skips_runtime_init() {
        let strategy = ExecutionStrategy::select_with(ExecutionMode::Local, runtime_never_needed()).await;
        assert_eq!(strategy.mode(), ExecutionMode::Local);
    }

    #[tokio::test]
    async fn test_actor_mode_selects_actor_dispatcher() {
        let strategy = ExecutionStrategy::select(ExecutionMode::Actor).await;
        assert_eq!(strategy.mode(), ExecutionMode::Actor);
        assert_eq!(strategy.dispatcher().name(), "actor");
    }
}
