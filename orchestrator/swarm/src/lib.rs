// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `chorus-swarm` — Fan-out and Consensus
//!
//! Sends one prompt to a bounded set of agents and reduces their replies to a
//! majority vote.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `SwarmRequest`, `SwarmResult`, `SwarmError`, consensus reducer |
//! | [`application`] | Application | `SwarmService`, `SwarmOrchestrator`, `LocalDispatcher`, `ExecutionStrategy` |
//! | [`infrastructure`] | Infrastructure | ractor-backed `ActorDispatcher` |
//!
//! ## Key Concepts
//!
//! - **Dispatch**: one call to an [`application::AgentDispatcher`]. Replies
//!   come back in agent order regardless of completion order.
//! - **Strategy**: local futures or one actor per agent, chosen once at
//!   startup. Actor mode falls back to local when the runtime probe fails.
//! - **Failure policy**: fail fast, fail after all, or mark failed replies.
//! - **Consensus**: the most frequent reply, `""` when there are none.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::{ExecutionStrategy, SwarmOrchestrator, SwarmService};
pub use domain::*;
