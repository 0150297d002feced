// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Agents, model providers, secret resolution and node configuration for
//! Chorus.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Everything a swarm needs below the dispatcher

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
