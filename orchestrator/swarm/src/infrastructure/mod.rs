// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod actor;

pub use actor::{ActorDispatcher, ActorRuntime, AgentActor, AgentActorMessage, DEFAULT_ACTOR_PREFIX};
