// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Remote secret store adapters consulted by SecretResolver after the environment.

pub mod aws;
pub mod vault;

pub use aws::AwsSecretsManagerSource;
pub use vault::VaultKvSource;
