// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end swarm behavior under both execution strategies.

mod common;

use std::sync::Arc;

use chorus_core::application::agent::LlmAgent;
use chorus_core::domain::agent::{AgentHandle, AgentId, AgentSpec};
use chorus_core::infrastructure::llm::ProviderRegistry;
use chorus_swarm::{SwarmRequest, SwarmService};
use common::{orchestrator, replying, MODES};

#[tokio::test]
async fn test_majority_reply_wins() {
    for mode in MODES {
        let swarm = orchestrator(mode).await;
        let result = swarm
            .run_swarm(&replying(&["yes", "no", "yes"]), &SwarmRequest::new("Is water wet?"))
            .await
            .unwrap();

        assert_eq!(result.responses, vec!["yes", "no", "yes"], "{mode}");
        assert_eq!(result.consensus, "yes", "{mode}");
        assert!(result.failures.is_empty());
    }
}

#[tokio::test]
async fn test_max_responses_bounds_invocations() {
    for mode in MODES {
        let swarm = orchestrator(mode).await;
        let request = SwarmRequest::new("p").with_max_responses(1);
        let result = swarm.run_swarm(&replying(&["x", "y"]), &request).await.unwrap();

        assert_eq!(result.responses, vec!["x"], "{mode}");
        assert_eq!(result.consensus, "x", "{mode}");
    }
}

#[tokio::test]
async fn test_no_agents_gives_empty_result() {
    for mode in MODES {
        let swarm = orchestrator(mode).await;
        let result = swarm.run_swarm(&[], &SwarmRequest::new("p")).await.unwrap();

        assert!(result.responses.is_empty(), "{mode}");
        assert_eq!(result.consensus, "", "{mode}");
    }
}

#[tokio::test]
async fn test_response_count_is_min_of_agents_and_bound() {
    let replies = ["a", "b", "c", "d", "e", "f", "g"];
    for mode in MODES {
        let swarm = orchestrator(mode).await;
        for agent_count in 0..=replies.len() {
            for max_responses in [0, 1, 3, 5, 10] {
                let agents = replying(&replies[..agent_count]);
                let request = SwarmRequest::new("p").with_max_responses(max_responses);
                let result = swarm.run_swarm(&agents, &request).await.unwrap();

                assert_eq!(
                    result.responses.len(),
                    agent_count.min(max_responses),
                    "{mode}: {agent_count} agents, bound {max_responses}"
                );
                if !result.responses.is_empty() {
                    assert!(result.responses.contains(&result.consensus));
                }
            }
        }
    }
}

#[tokio::test]
async fn test_default_bound_is_five() {
    let swarm = orchestrator(chorus_swarm::ExecutionMode::Local).await;
    let agents = replying(&["1", "2", "3", "4", "5", "6", "7"]);
    let result = swarm.run_swarm(&agents, &SwarmRequest::new("p")).await.unwrap();
    assert_eq!(result.responses, vec!["1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn test_offline_llm_agents_reach_consensus_and_record_history() {
    let registry = Arc::new(ProviderRegistry::offline("default"));
    let agents: Vec<Arc<LlmAgent>> = (0..3)
        .map(|i| {
            Arc::new(LlmAgent::new(
                AgentId::new(format!("llm-{i}")),
                AgentSpec::default().with_role("analyst"),
                registry.clone(),
            ))
        })
        .collect();
    let handles: Vec<Arc<dyn AgentHandle>> =
        agents.iter().map(|a| a.clone() as Arc<dyn AgentHandle>).collect();

    for mode in MODES {
        let swarm = orchestrator(mode).await;
        let result = swarm.run_swarm(&handles, &SwarmRequest::new("status?")).await.unwrap();

        assert_eq!(
            result.consensus,
            "[demo-mode] Echo: Role: analyst Context:  User: status? Agent:",
            "{mode}"
        );
    }

    for agent in &agents {
        assert_eq!(agent.history().len(), 2);
    }
}

#[tokio::test]
async fn test_result_serializes_to_json() {
    let swarm = orchestrator(chorus_swarm::ExecutionMode::Local).await;
    let result = swarm
        .run_swarm(&replying(&["a", "b", "b"]), &SwarmRequest::new("p"))
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["responses"], serde_json::json!(["a", "b", "b"]));
    assert_eq!(json["consensus"], "b");
}
