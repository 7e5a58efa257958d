//! Bounded breadth-first solvability search.
//!
//! The search answers "can a won state be reached?" for arbitrary states,
//! such as a purely random fill. It never returns a move list. Budgets keep
//! it cheap, so the usual answer for a hard state is `Inconclusive`; only a
//! fully closed reachable space proves `Unsolvable`.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::pruning::{fast_reject, RejectReason};
use crate::state::GameState;

/// Configuration for the search
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum states to expand
    pub max_states: usize,
    /// States at this many pours are not expanded further
    pub max_depth: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_states: 1000,
            max_depth: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Solved,
    Unsolvable,
    Inconclusive,
}

/// Result of the search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub verdict: Verdict,
    /// Set when a structural rule ruled the state out without searching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<RejectReason>,
    /// Number of states expanded
    pub states_expanded: usize,
    /// Whether every reachable state within the depth cap was visited
    pub search_exhausted: bool,
    /// Whether some state was left unexpanded at the depth cap
    pub depth_truncated: bool,
    /// Time elapsed in milliseconds
    pub time_elapsed_ms: u64,
}

/// A frame in the search: a scratch state and the pours that led to it
struct SearchFrame {
    state: GameState,
    depth: usize,
}

/// Search forward from `state` for a won state within the budgets.
///
/// The input is never mutated; every expansion pours into a deep clone
/// without running the collection subsystem.
#[instrument(skip_all, fields(max_states = config.max_states, max_depth = config.max_depth))]
pub fn search(state: &GameState, config: &SolverConfig) -> SearchResult {
    let start_time = Instant::now();
    let finish = |verdict, rejected, states_expanded, search_exhausted, depth_truncated| {
        SearchResult {
            verdict,
            rejected,
            states_expanded,
            search_exhausted,
            depth_truncated,
            time_elapsed_ms: start_time.elapsed().as_millis() as u64,
        }
    };

    if state.is_won() {
        return finish(Verdict::Solved, None, 0, false, false);
    }
    if let Some(reason) = fast_reject(state) {
        debug!(%reason, "rejected without searching");
        return finish(Verdict::Unsolvable, Some(reason), 0, false, false);
    }

    let root = state.scratch();
    let mut seen: HashSet<Vec<u16>> = HashSet::new();
    seen.insert(root.signature());

    let mut queue: VecDeque<SearchFrame> = VecDeque::new();
    queue.push_back(SearchFrame {
        state: root,
        depth: 0,
    });

    let count = state.config().container_count();
    let mut states_expanded = 0;
    let mut depth_truncated = false;

    while let Some(frame) = queue.pop_front() {
        if states_expanded >= config.max_states {
            info!(states_expanded, "search budget exhausted");
            return finish(Verdict::Inconclusive, None, states_expanded, false, depth_truncated);
        }
        if frame.depth >= config.max_depth {
            depth_truncated = true;
            continue;
        }
        states_expanded += 1;

        for from in 0..count {
            for to in 0..count {
                if from == to {
                    continue;
                }
                let mut next = frame.state.clone();
                if next.pour_without_side_effects(from, to).is_err() {
                    continue;
                }
                if next.is_won() {
                    info!(states_expanded, depth = frame.depth + 1, "reached a won state");
                    return finish(Verdict::Solved, None, states_expanded, false, depth_truncated);
                }
                if seen.insert(next.signature()) {
                    queue.push_back(SearchFrame {
                        state: next,
                        depth: frame.depth + 1,
                    });
                }
            }
        }
    }

    let verdict = if depth_truncated {
        Verdict::Inconclusive
    } else {
        Verdict::Unsolvable
    };
    info!(states_expanded, ?verdict, depth_truncated, "search space closed");
    finish(verdict, None, states_expanded, true, depth_truncated)
}

/// `false` only when the state is proven unsolvable. `true` means "not
/// disproven", never a guarantee.
pub fn is_plausibly_solvable(state: &GameState) -> bool {
    search(state, &SolverConfig::default()).verdict != Verdict::Unsolvable
}
