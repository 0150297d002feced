// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Swarm policy vocabulary shared by configuration and the `chorus-swarm` crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of agents consulted when a request does not say otherwise.
pub const DEFAULT_MAX_RESPONSES: usize = 5;

/// Which dispatcher backend a process runs swarms on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Concurrent futures on the calling task
    Local,
    /// One actor per agent per dispatch; falls back to `Local` if the actor
    /// runtime cannot start
    #[default]
    Actor,
}

/// What a dispatch does when an agent fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Cancel outstanding agents on the first failure and report it
    #[default]
    FailFast,
    /// Let every agent finish, then report all failures together
    FailAfterAll,
    /// Replace each failed reply with a marker string and keep going
    MarkFailures,
}

/// How the consensus reducer picks among equally frequent replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The value whose running count reaches the maximum first, in input order
    #[default]
    FirstToReachMax,
    /// The value that appears earliest in the input
    FirstSeen,
    /// The lexicographically smallest value
    Lexicographic,
}

macro_rules! kebab_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $($ty::$variant => $text,)+
                })
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!(
                        "unknown {}: '{}' (expected one of: {})",
                        stringify!($ty),
                        other,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

kebab_enum!(ExecutionMode { Local => "local", Actor => "actor" });
kebab_enum!(FailurePolicy {
    FailFast => "fail-fast",
    FailAfterAll => "fail-after-all",
    MarkFailures => "mark-failures",
});
kebab_enum!(TieBreak {
    FirstToReachMax => "first-to-reach-max",
    FirstSeen => "first-seen",
    Lexicographic => "lexicographic",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_serde_names() {
        for mode in [ExecutionMode::Local, ExecutionMode::Actor] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode));
            assert_eq!(mode.to_string().parse::<ExecutionMode>().unwrap(), mode);
        }
        assert_eq!("FAIL-AFTER-ALL".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailAfterAll);
        assert_eq!(
            serde_json::from_str::<TieBreak>("\"first-seen\"").unwrap(),
            TieBreak::FirstSeen
        );
    }

    #[test]
    fn test_unknown_value_lists_choices() {
        let err = "ray".parse::<ExecutionMode>().unwrap_err();
        assert!(err.contains("local, actor"));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ExecutionMode::default(), ExecutionMode::Actor);
        assert_eq!(FailurePolicy::default(), FailurePolicy::FailFast);
        assert_eq!(TieBreak::default(), TieBreak::FirstToReachMax);
    }
}
