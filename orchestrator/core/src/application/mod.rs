// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent;
pub mod secrets;

pub use agent::{build_agents, LlmAgent};
pub use secrets::SecretResolver;
