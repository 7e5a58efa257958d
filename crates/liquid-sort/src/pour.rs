//! The pour transition.
//!
//! A pour moves the top homogeneous run of one container onto another. Both
//! entry points share [`GameState::pourable_amount`] and differ only in
//! whether the collection subsystem runs afterwards.

use serde::Serialize;
use tracing::debug;

use crate::error::Rejected;
use crate::puzzle::{Color, Location};
use crate::state::GameState;

/// A pour that is legal in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegalMove {
    pub from: usize,
    pub to: usize,
    pub units: usize,
}

/// A checked pour, ready to apply
#[derive(Debug, Clone, Copy)]
pub(crate) struct PourPlan {
    source: Location,
    destination: Location,
    color: Color,
    moved: usize,
}

impl GameState {
    /// Pour `from` into `to` as a player would. In bag mode completed
    /// bottles are collected afterwards.
    pub fn pour(&mut self, from: usize, to: usize) -> Result<usize, Rejected> {
        let moved = self.pour_without_side_effects(from, to)?;
        if self.bags.is_some() {
            let retired = self.check_and_collect();
            if !retired.is_empty() {
                debug!(?retired, "bottles collected after pour");
            }
        }
        Ok(moved)
    }

    /// Pour with the game rules but without touching bags or retirement.
    /// Used by generation, validation and search.
    pub fn pour_without_side_effects(&mut self, from: usize, to: usize) -> Result<usize, Rejected> {
        let PourPlan {
            source,
            destination,
            color,
            moved,
        } = self.pourable_amount(from, to)?;

        let source_emptied = match self.container_at_mut(source) {
            Some(container) => {
                container.take_top(moved);
                container.is_empty()
            }
            None => false,
        };
        let destination_filled = match self.container_at_mut(destination) {
            Some(container) => {
                let was_empty = container.is_empty();
                container.push_run(color, moved);
                was_empty
            }
            None => false,
        };

        if source_emptied {
            self.adjust_empty(source, true);
        }
        if destination_filled {
            self.adjust_empty(destination, false);
        }
        Ok(moved)
    }

    /// Check a pour without applying it. Rejections are reported in a fixed
    /// priority order.
    pub(crate) fn pourable_amount(&self, from: usize, to: usize) -> Result<PourPlan, Rejected> {
        if from == to {
            return Err(Rejected::SameContainer);
        }
        let source = self
            .config
            .locate(from)
            .ok_or(Rejected::InvalidIndex { index: from })?;
        let destination = self
            .config
            .locate(to)
            .ok_or(Rejected::InvalidIndex { index: to })?;

        let source_container = self
            .container_at(source)
            .ok_or(Rejected::RetiredContainer { index: from })?;
        let destination_container = self
            .container_at(destination)
            .ok_or(Rejected::RetiredContainer { index: to })?;

        let Some(color) = source_container.top() else {
            return Err(Rejected::SourceEmpty);
        };
        if destination_container.is_full() {
            return Err(Rejected::DestinationFull);
        }
        if let Some(top) = destination_container.top() {
            if top != color {
                return Err(Rejected::ColorMismatch { poured: color, top });
            }
        }

        Ok(PourPlan {
            source,
            destination,
            color,
            moved: source_container.top_run().min(destination_container.space()),
        })
    }

    fn adjust_empty(&mut self, location: Location, became_empty: bool) {
        let counter = match location {
            Location::Bottle(_) => &mut self.empty_bottles,
            Location::Jar(_) => &mut self.empty_jars,
        };
        if became_empty {
            *counter += 1;
        } else {
            *counter = counter.saturating_sub(1);
        }
    }

    /// Every legal pour in the current state. Nothing is mutated, so bag
    /// bindings and retirement are never affected.
    pub fn enumerate_legal_moves(&self) -> Vec<LegalMove> {
        let count = self.config.container_count();
        let mut moves = Vec::new();
        for from in 0..count {
            for to in 0..count {
                if from == to {
                    continue;
                }
                if let Ok(plan) = self.pourable_amount(from, to) {
                    moves.push(LegalMove {
                        from,
                        to,
                        units: plan.moved,
                    });
                }
            }
        }
        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::GameConfig;

    const R: Color = Color(0);
    const B: Color = Color(1);

    fn create_pour_state() -> GameState {
        GameState::from_layout(
            GameConfig::new(4, 3, 1, 2),
            vec![vec![R, R, B], vec![B, B], vec![], vec![]],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_pour_into_empty_moves_top_run() {
        let mut state = create_pour_state();
        assert_eq!(state.empty_bottle_count(), 2);

        assert_eq!(state.pour(0, 2), Ok(1));
        assert_eq!(state.container(0).unwrap().units(), &[R, R]);
        assert_eq!(state.container(2).unwrap().units(), &[B]);
        assert_eq!(state.empty_bottle_count(), 1);

        assert_eq!(state.pour(1, 2), Ok(2));
        assert!(state.container(1).unwrap().is_empty());
        assert!(state.container(2).unwrap().is_complete());
        assert_eq!(state.empty_bottle_count(), 2);
        assert!(!state.is_won());
    }

    #[test]
    fn test_rejections_in_priority_order() {
        let mut state = create_pour_state();
        assert_eq!(state.pour(1, 1), Err(Rejected::SameContainer));
        assert_eq!(state.pour(9, 9), Err(Rejected::SameContainer));
        assert_eq!(state.pour(0, 4), Err(Rejected::InvalidIndex { index: 4 }));
        assert_eq!(state.pour(2, 7), Err(Rejected::InvalidIndex { index: 7 }));
        assert_eq!(state.pour(2, 0), Err(Rejected::SourceEmpty));
        assert_eq!(state.pour(1, 0), Err(Rejected::DestinationFull));

        state.pour(0, 2).unwrap();
        assert_eq!(
            state.pour(0, 2),
            Err(Rejected::ColorMismatch { poured: R, top: B })
        );
    }

    #[test]
    fn test_rejected_pour_changes_nothing() {
        let mut state = create_pour_state();
        let before = state.clone();
        assert!(state.pour(1, 0).is_err());
        assert!(state.same_layout(&before));
        assert_eq!(state.empty_bottle_count(), before.empty_bottle_count());
    }

    #[test]
    fn test_partial_pour_limited_by_space() {
        let mut state = GameState::from_layout(
            GameConfig::new(3, 4, 1, 2),
            vec![vec![R, B, B, B], vec![R, R, B], vec![R, R, R, B]],
            vec![],
        )
        .unwrap();
        // Only one free slot on bottle 1
        assert_eq!(state.pour(0, 1), Ok(1));
        assert_eq!(state.container(0).unwrap().units(), &[R, B, B]);
        assert_eq!(state.container(1).unwrap().units(), &[R, R, B, B]);
    }

    #[test]
    fn test_jars_pour_both_ways() {
        let mut state = GameState::from_layout(
            GameConfig::new(3, 2, 1, 2).with_jars(1, 3),
            vec![vec![R, B], vec![B, R], vec![]],
            vec![vec![]],
        )
        .unwrap();
        assert_eq!(state.empty_jar_count(), 1);
        assert_eq!(state.pour(0, 3), Ok(1));
        assert_eq!(state.empty_jar_count(), 0);
        assert_eq!(state.pour(3, 2), Ok(1));
        assert_eq!(state.empty_jar_count(), 1);
        assert_eq!(state.empty_bottle_count(), 0);
    }

    #[test]
    fn test_enumerate_legal_moves() {
        let state = create_pour_state();
        let moves = state.enumerate_legal_moves();
        assert_eq!(
            moves,
            vec![
                LegalMove { from: 0, to: 1, units: 1 },
                LegalMove { from: 0, to: 2, units: 1 },
                LegalMove { from: 0, to: 3, units: 1 },
                LegalMove { from: 1, to: 2, units: 2 },
                LegalMove { from: 1, to: 3, units: 2 },
            ]
        );
    }
}
