// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Actor Dispatch
//!
//! Each dispatch spawns one [`AgentActor`] per selected agent, registered in
//! the ractor registry under a unique `<prefix>-<id>-<uuid>` name (prefix
//! `swarm-agent` by default), and asks it for a reply over an RPC port.
//! Actors live for exactly one dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use ractor::rpc::CallResult;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::{debug, info};
use uuid::Uuid;

use chorus_core::domain::agent::{AgentError, AgentHandle, AgentId};

use crate::application::dispatch::{gather, AgentDispatcher};
use crate::domain::{DispatchOptions, Dispatched, SwarmError, SwarmRequest};

//==============================================================================
// Agent actor
//==============================================================================

#[derive(Debug)]
pub enum AgentActorMessage {
    /// Answer `prompt` through the wrapped agent
    Respond {
        prompt: String,
        reply: RpcReplyPort<Result<String, AgentError>>,
    },
}

/// Hosts one agent handle for the lifetime of a dispatch.
pub struct AgentActor;

impl Actor for AgentActor {
    type Msg = AgentActorMessage;
    type State = Arc<dyn AgentHandle>;
    type Arguments = Arc<dyn AgentHandle>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        agent: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(agent)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        agent: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            AgentActorMessage::Respond { prompt, reply } => {
                let result = agent.respond(&prompt).await;
                // The caller may have given up already.
                let _ = reply.send(result);
                Ok(())
            }
        }
    }
}

/// Actors spawned for one dispatch. Completed dispatches stop their actors;
/// failed or abandoned ones kill them, cancelling any reply in progress.
struct ActorGroup {
    actors: Vec<ActorRef<AgentActorMessage>>,
    completed: bool,
}

impl ActorGroup {
    async fn spawn(prefix: &str, agents: &[Arc<dyn AgentHandle>]) -> Result<Self, SwarmError> {
        let mut group = Self {
            actors: Vec::with_capacity(agents.len()),
            completed: false,
        };

        for agent in agents {
            let name = actor_name(prefix, agent.id());
            let (actor, _handle) = Actor::spawn(Some(name.clone()), AgentActor, agent.clone())
                .await
                .map_err(|e| SwarmError::Backend(format!("failed to spawn actor '{name}': {e}")))?;
            group.actors.push(actor);
        }

        Ok(group)
    }
}

impl Drop for ActorGroup {
    fn drop(&mut self) {
        for actor in &self.actors {
            if self.completed {
                actor.stop(None);
            } else {
                actor.kill();
            }
        }
    }
}

fn actor_name(prefix: &str, id: &AgentId) -> String {
    format!("{}-{}-{}", prefix, id, Uuid::new_v4())
}

async fn ask(actor: &ActorRef<AgentActorMessage>, prompt: &str) -> Result<String, AgentError> {
    let prompt = prompt.to_string();
    match actor
        .call(|reply| AgentActorMessage::Respond { prompt, reply }, None)
        .await
    {
        Ok(CallResult::Success(result)) => result,
        Ok(CallResult::Timeout) => Err(AgentError::Timeout),
        Ok(CallResult::SenderError) => Err(AgentError::Unavailable(
            "actor stopped before replying".to_string(),
        )),
        Err(_) => Err(AgentError::Unavailable("actor mailbox closed".to_string())),
    }
}

//==============================================================================
// Dispatcher and runtime
//==============================================================================

pub const DEFAULT_ACTOR_PREFIX: &str = "swarm-agent";

/// A verified actor runtime. Only obtainable through a successful probe.
#[derive(Debug, Clone)]
pub struct ActorRuntime {
    name_prefix: Arc<str>,
}

impl ActorRuntime {
    /// Probe with the default actor name prefix.
    pub async fn initialize() -> Result<Self, SwarmError> {
        Self::initialize_with_prefix(DEFAULT_ACTOR_PREFIX).await
    }

    /// Spawn and query a probe actor; succeeds only if the round trip works.
    /// Actors spawned through this runtime are named `<prefix>-<id>-<uuid>`.
    pub async fn initialize_with_prefix(prefix: &str) -> Result<Self, SwarmError> {
        if prefix.is_empty() {
            return Err(SwarmError::Backend("actor name prefix cannot be empty".to_string()));
        }

        let probe: Arc<dyn AgentHandle> = Arc::new(ProbeAgent {
            id: AgentId::new("probe"),
        });

        let mut group = ActorGroup::spawn(prefix, std::slice::from_ref(&probe)).await?;
        let outcome = match group.actors.first() {
            Some(actor) => ask(actor, "ping").await,
            None => Err(AgentError::Unavailable("probe actor missing".to_string())),
        };
        group.completed = true;

        match outcome {
            Ok(_) => {
                info!(prefix, "Actor runtime available");
                Ok(Self {
                    name_prefix: Arc::from(prefix),
                })
            }
            Err(e) => Err(SwarmError::Backend(format!("actor probe failed: {e}"))),
        }
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn dispatcher(&self) -> ActorDispatcher {
        ActorDispatcher {
            runtime: self.clone(),
        }
    }
}

struct ProbeAgent {
    id: AgentId,
}

#[async_trait]
impl AgentHandle for ProbeAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    async fn respond(&self, _prompt: &str) -> Result<String, AgentError> {
        Ok("pong".to_string())
    }
}

/// Runs each invocation inside its own actor.
#[derive(Debug, Clone)]
pub struct ActorDispatcher {
    runtime: ActorRuntime,
}

#[async_trait]
impl AgentDispatcher for ActorDispatcher {
    fn name(&self) -> &'static str {
        "actor"
    }

    async fn dispatch(
        &self,
        agents: &[Arc<dyn AgentHandle>],
        request: &SwarmRequest,
        options: &DispatchOptions,
    ) -> Result<Dispatched, SwarmError> {
        let selected = &agents[..request.bound(agents.len())];
        debug!(agents = selected.len(), "Dispatching through actors");

        let mut group = ActorGroup::spawn(self.runtime.name_prefix(), selected).await?;
        let outcome = {
            let invocations = group
                .actors
                .iter()
                .map(|actor| ask(actor, &request.prompt))
                .collect();
            gather(selected, invocations, options).await
        };
        // Failed or timed-out dispatches may leave actors mid-reply.
        group.completed = outcome.is_ok();

        outcome
    }
}
