//! Cheap structural checks that prove a state unsolvable before searching.
//!
//! These rules never reject a solvable state. A state that passes them may
//! still be unsolvable; only the search can say more.

use std::fmt;

use serde::Serialize;

use crate::puzzle::Color;
use crate::state::GameState;

/// Why a state was rejected without searching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum RejectReason {
    /// A color's total cannot fill whole bottles
    UnalignedColor { color: Color, units: usize },
    /// Water was added or lost relative to the configured layout
    VolumeMismatch { expected: usize, found: usize },
    /// No empty bottle or jar to pour into
    NoEmptyContainer,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnalignedColor { color, units } => {
                write!(f, "{} has {} units, not a multiple of the capacity", color, units)
            }
            RejectReason::VolumeMismatch { expected, found } => {
                write!(f, "total volume is {}, expected {}", found, expected)
            }
            RejectReason::NoEmptyContainer => write!(f, "no empty bottle or jar"),
        }
    }
}

/// Check the rules in order and report the first one broken
pub fn fast_reject(state: &GameState) -> Option<RejectReason> {
    let capacity = state.config().capacity;
    for (color, units) in state.color_totals() {
        if units % capacity != 0 {
            return Some(RejectReason::UnalignedColor { color, units });
        }
    }

    let expected = state.config().total_volume();
    let found = state.total_volume();
    if found != expected {
        return Some(RejectReason::VolumeMismatch { expected, found });
    }

    if state.empty_bottle_count() == 0 && state.empty_jar_count() == 0 {
        return Some(RejectReason::NoEmptyContainer);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::GameConfig;

    const R: Color = Color(0);
    const B: Color = Color(1);

    fn create_state(bottles: Vec<Vec<Color>>) -> GameState {
        GameState::from_layout(GameConfig::new(bottles.len(), 2, 1, 2), bottles, vec![]).unwrap()
    }

    #[test]
    fn test_mixed_but_plausible_passes() {
        let state = create_state(vec![vec![R, B], vec![B, R], vec![]]);
        assert_eq!(fast_reject(&state), None);
    }

    #[test]
    fn test_unaligned_color() {
        let state = create_state(vec![vec![R, B], vec![B, B], vec![R]]);
        assert_eq!(
            fast_reject(&state),
            Some(RejectReason::UnalignedColor { color: B, units: 3 })
        );
    }

    #[test]
    fn test_volume_mismatch() {
        let state = create_state(vec![vec![R, R], vec![], vec![]]);
        assert_eq!(
            fast_reject(&state),
            Some(RejectReason::VolumeMismatch {
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn test_no_empty_container() {
        let state = GameState::from_layout(
            GameConfig::new(3, 2, 1, 2).with_jars(1, 1),
            vec![vec![R, B], vec![B], vec![R]],
            vec![vec![]],
        )
        .unwrap();
        assert_eq!(fast_reject(&state), None);

        let state = create_state(vec![vec![R, B], vec![B], vec![R]]);
        assert_eq!(fast_reject(&state), Some(RejectReason::NoEmptyContainer));
    }

    #[test]
    fn test_retired_bottles_count_towards_volume() {
        let config = GameConfig::new(3, 2, 1, 2).with_bags(true);
        let state = GameState::from_snapshot(crate::state::Snapshot {
            config,
            bottles: vec![None, Some(vec![B, B]), Some(vec![])],
            jars: vec![],
            bags: None,
        })
        .unwrap();
        assert_eq!(fast_reject(&state), None);
    }
}
