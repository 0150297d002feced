// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the domain LLMProvider interface and an
// external API. The echo provider stands in when no API is reachable.

pub mod echo;
pub mod openai;
pub mod registry;

pub use echo::EchoProvider;
pub use openai::OpenAIAdapter;
pub use registry::ProviderRegistry;
