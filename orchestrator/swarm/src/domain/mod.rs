// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Swarm vocabulary and the consensus reducer.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Request/result types, dispatch failures, majority vote

pub mod consensus;
pub mod swarm;

pub use consensus::{consensus, consensus_by, consensus_with, tally, Vote};
pub use swarm::*;
