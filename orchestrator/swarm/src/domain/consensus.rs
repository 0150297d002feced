// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Consensus Reducer
//!
//! Majority vote over a swarm's replies. Pure functions, no state.
//!
//! Replies are compared as exact strings. Empty input reduces to `""`.
//! Ties among equally frequent replies are broken by a [`TieBreak`] rule or a
//! caller-supplied ordering ([`consensus_by`]).

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::swarm::TieBreak;

/// A distinct reply and how many agents gave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub value: String,
    pub count: usize,
}

/// Vote counts in first-seen order.
pub fn tally(responses: &[String]) -> Vec<Vote> {
    let mut votes: Vec<Vote> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for response in responses {
        match positions.get(response.as_str()) {
            Some(&position) => votes[position].count += 1,
            None => {
                positions.insert(response, votes.len());
                votes.push(Vote {
                    value: response.clone(),
                    count: 1,
                });
            }
        }
    }

    votes
}

/// Most frequent reply, ties broken by [`TieBreak::FirstToReachMax`].
pub fn consensus(responses: &[String]) -> String {
    consensus_with(responses, TieBreak::default())
}

pub fn consensus_with(responses: &[String], tie_break: TieBreak) -> String {
    match tie_break {
        TieBreak::FirstToReachMax => first_to_reach_max(responses),
        TieBreak::FirstSeen => {
            let mut best: Option<Vote> = None;
            for vote in tally(responses) {
                if best.as_ref().map_or(true, |b| vote.count > b.count) {
                    best = Some(vote);
                }
            }
            best.map(|v| v.value).unwrap_or_default()
        }
        TieBreak::Lexicographic => consensus_by(responses, |a, b| a.cmp(b)),
    }
}

/// Most frequent reply; among tied values the minimum under `cmp` wins.
pub fn consensus_by<F>(responses: &[String], mut cmp: F) -> String
where
    F: FnMut(&str, &str) -> Ordering,
{
    let votes = tally(responses);
    let Some(max) = votes.iter().map(|v| v.count).max() else {
        return String::new();
    };

    votes
        .into_iter()
        .filter(|v| v.count == max)
        .map(|v| v.value)
        .min_by(|a, b| cmp(a, b))
        .unwrap_or_default()
}

// The leader only changes when a running count strictly exceeds the best so
// far, so the first value to reach the final maximum keeps the lead.
fn first_to_reach_max(responses: &[String]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut best: Option<&str> = None;
    let mut best_count = 0;

    for response in responses {
        let count = counts.entry(response.as_str()).or_insert(0);
        *count += 1;
        if *count > best_count {
            best_count = *count;
            best = Some(response.as_str());
        }
    }

    best.map(str::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_majority_wins() {
        assert_eq!(consensus(&strings(&["yes", "no", "yes"])), "yes");
    }

    #[test]
    fn test_empty_input_is_empty_string() {
        assert_eq!(consensus(&[]), "");
        assert_eq!(consensus_with(&[], TieBreak::FirstSeen), "");
        assert_eq!(consensus_with(&[], TieBreak::Lexicographic), "");
        assert!(tally(&[]).is_empty());
    }

    #[test]
    fn test_single_reply() {
        assert_eq!(consensus(&strings(&["only"])), "only");
    }

    #[test]
    fn test_first_to_reach_max_differs_from_first_seen() {
        // "a" is seen first, but "b" reaches two votes first.
        let responses = strings(&["a", "b", "b", "a"]);
        assert_eq!(consensus_with(&responses, TieBreak::FirstToReachMax), "b");
        assert_eq!(consensus_with(&responses, TieBreak::FirstSeen), "a");
        assert_eq!(consensus_with(&responses, TieBreak::Lexicographic), "a");
    }

    #[test]
    fn test_all_distinct_ties() {
        let responses = strings(&["m", "z", "a"]);
        assert_eq!(consensus(&responses), "m");
        assert_eq!(consensus_with(&responses, TieBreak::FirstSeen), "m");
        assert_eq!(consensus_with(&responses, TieBreak::Lexicographic), "a");
    }

    #[test]
    fn test_custom_comparator_picks_minimum() {
        let responses = strings(&["short", "much longer", "short", "much longer"]);
        let longest = consensus_by(&responses, |a, b| b.len().cmp(&a.len()));
        assert_eq!(longest, "much longer");
    }

    #[test]
    fn test_exact_string_comparison() {
        let responses = strings(&["Yes", "yes ", "yes", "yes"]);
        assert_eq!(consensus(&responses), "yes");
    }

    #[test]
    fn test_tally_keeps_first_seen_order() {
        let votes = tally(&strings(&["b", "a", "b", "c"]));
        assert_eq!(
            votes,
            vec![
                Vote { value: "b".into(), count: 2 },
                Vote { value: "a".into(), count: 1 },
                Vote { value: "c".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_result_is_a_max_count_element() {
        let cases = [
            strings(&["x", "y", "y", "z", "x", "x"]),
            strings(&["p", "q"]),
            strings(&["k", "k", "k"]),
            strings(&["1", "2", "3", "2", "1"]),
        ];

        for responses in cases {
            let max = tally(&responses).iter().map(|v| v.count).max().unwrap();
            for tie_break in [TieBreak::FirstToReachMax, TieBreak::FirstSeen, TieBreak::Lexicographic] {
                let winner = consensus_with(&responses, tie_break);
                assert!(responses.contains(&winner));
                let count = responses.iter().filter(|r| **r == winner).count();
                assert_eq!(count, max, "{tie_break} picked a non-majority value for {responses:?}");
            }
        }
    }
}
