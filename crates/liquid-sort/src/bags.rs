//! Bag mode: color-keyed collectors that retire completed bottles.
//!
//! Bags hold no units. Each of the three slots is either bound to a color or
//! inactive. After a player pour, every complete bottle whose color is bound
//! is retired: its slot becomes [`Slot::Retired`] and its index stays
//! reserved. Retiring changes which colors remain, which can rebind bags and
//! unlock further retirements, so collection runs to a fixed point.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SnapshotError;
use crate::puzzle::{Color, Slot};
use crate::state::GameState;

/// Maximum number of simultaneously active bags
pub const BAG_SLOTS: usize = 3;

/// Collector bindings and the running total of collected units
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bags {
    slots: [Option<Color>; BAG_SLOTS],
    collected_units: usize,
}

impl Bags {
    pub fn slots(&self) -> &[Option<Color>; BAG_SLOTS] {
        &self.slots
    }

    pub fn collected_units(&self) -> usize {
        self.collected_units
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn accepts(&self, color: Color) -> bool {
        self.slots.contains(&Some(color))
    }

    /// Check restored bags against the puzzle they were saved with.
    /// Every retired bottle held exactly `capacity` units.
    pub(crate) fn check(
        &self,
        colors: usize,
        retired: usize,
        capacity: usize,
    ) -> Result<(), SnapshotError> {
        for (index, color) in self.slots.iter().enumerate() {
            let Some(color) = *color else {
                continue;
            };
            if color.index() >= colors {
                return Err(SnapshotError::UnknownBagColor { color, colors });
            }
            if self.slots[..index].contains(&Some(color)) {
                return Err(SnapshotError::DuplicateBag { color });
            }
        }
        let expected = retired * capacity;
        if self.collected_units != expected {
            return Err(SnapshotError::CollectedMismatch {
                expected,
                found: self.collected_units,
            });
        }
        Ok(())
    }
}

impl GameState {
    /// Reset bags and bind them to the smallest colors present.
    /// Does nothing outside bag mode.
    pub fn initialize_bags(&mut self) {
        if self.bags.is_none() {
            return;
        }
        self.bags = Some(Bags::default());
        self.update_bag_colors();
    }

    /// Recompute bindings for the current contents. Returns whether any
    /// slot changed.
    ///
    /// At most `min(3, distinct colors, remaining units / M)` bags are
    /// active. Bound colors that are still present keep their slot.
    pub fn update_bag_colors(&mut self) -> bool {
        let Some(bags) = &self.bags else {
            return false;
        };
        let available = self.active_colors();
        let limit = BAG_SLOTS
            .min(available.len())
            .min(self.active_units() / self.config.capacity);

        let mut slots = bags.slots;
        for slot in slots.iter_mut() {
            if let Some(color) = *slot {
                if !available.contains(&color) {
                    *slot = None;
                }
            }
        }

        let mut active = slots.iter().filter(|s| s.is_some()).count();
        for slot in slots.iter_mut().rev() {
            if active <= limit {
                break;
            }
            if slot.take().is_some() {
                active -= 1;
            }
        }

        let bound = slots;
        let mut candidates = available
            .iter()
            .copied()
            .filter(|color| !bound.contains(&Some(*color)));
        for slot in slots.iter_mut().filter(|s| s.is_none()) {
            if active >= limit {
                break;
            }
            match candidates.next() {
                Some(color) => {
                    *slot = Some(color);
                    active += 1;
                }
                None => break,
            }
        }

        let changed = slots != bags.slots;
        if let Some(bags) = self.bags.as_mut() {
            bags.slots = slots;
        }
        changed
    }

    /// Retire complete bottles whose color has a bag, repeating until a
    /// pass neither retires a bottle nor rebinds a bag. Returns the retired
    /// bottle indices in the order they were collected.
    pub fn check_and_collect(&mut self) -> Vec<usize> {
        let mut retired = Vec::new();
        loop {
            let Some(bags) = &self.bags else {
                return retired;
            };
            let matches: Vec<usize> = self
                .bottles
                .iter()
                .enumerate()
                .filter_map(|(index, slot)| {
                    let container = slot.container()?;
                    let color = container.top()?;
                    (container.is_complete() && bags.accepts(color)).then_some(index)
                })
                .collect();

            for &index in &matches {
                self.bottles[index] = Slot::Retired;
            }
            if let Some(bags) = self.bags.as_mut() {
                bags.collected_units += matches.len() * self.config.capacity;
            }

            let rebound = self.update_bag_colors();
            if !matches.is_empty() {
                debug!(?matches, rebound, "retired complete bottles");
            }
            if matches.is_empty() && !rebound {
                return retired;
            }
            retired.extend(matches);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::GameConfig;

    const R: Color = Color(0);
    const B: Color = Color(1);
    const G: Color = Color(2);
    const Y: Color = Color(3);

    fn create_bag_state(bottles: Vec<Vec<Color>>) -> GameState {
        let config = GameConfig::new(bottles.len(), 2, 1, 4).with_bags(true);
        GameState::from_layout(config, bottles, vec![]).unwrap()
    }

    #[test]
    fn test_initialize_binds_smallest_colors() {
        let state = create_bag_state(vec![
            vec![Y, Y],
            vec![G, B],
            vec![B, G],
            vec![R, R],
            vec![],
        ]);
        let bags = state.bags().unwrap();
        assert_eq!(bags.slots(), &[Some(R), Some(B), Some(G)]);
        assert_eq!(bags.collected_units(), 0);
    }

    #[test]
    fn test_active_bags_limited_by_remaining_units() {
        // One bottle's worth of water left: only one bag may be active
        let config = GameConfig::new(3, 2, 1, 2).with_bags(true);
        let state = GameState::from_layout(config, vec![vec![R], vec![B], vec![]], vec![]).unwrap();
        assert_eq!(state.bags().unwrap().slots(), &[Some(R), None, None]);
    }

    #[test]
    fn test_pour_collects_completed_bottle() {
        let mut state = create_bag_state(vec![vec![R, B], vec![B], vec![R], vec![G, G], vec![]]);
        assert_eq!(state.bags().unwrap().slots(), &[Some(R), Some(B), Some(G)]);

        // Completing blue also sweeps up the green bottle that was already done
        assert_eq!(state.pour(0, 1), Ok(1));
        assert!(state.is_retired(1));
        assert!(state.is_retired(3));
        assert_eq!(state.bags().unwrap().slots(), &[Some(R), None, None]);

        assert_eq!(state.pour(2, 0), Ok(1));
        assert!(state.is_retired(0));
        assert_eq!(state.retired_count(), 3);
        assert_eq!(state.bags().unwrap().collected_units(), 6);
        assert_eq!(state.bags().unwrap().active_count(), 0);
        assert!(state.is_won());
    }

    #[test]
    fn test_collection_cascades_through_rebinding() {
        let mut state = create_bag_state(vec![
            vec![R, R],
            vec![B, B],
            vec![G, G],
            vec![Y],
            vec![Y],
        ]);
        // Bags start on red, blue, green; the three complete bottles are
        // retired on the first pass, which frees a bag for yellow.
        let retired = state.check_and_collect();
        assert_eq!(retired, vec![0, 1, 2]);
        assert_eq!(state.bags().unwrap().slots(), &[Some(Y), None, None]);
        assert_eq!(state.bags().unwrap().collected_units(), 6);

        // Completing yellow retires it immediately
        assert_eq!(state.pour(3, 4), Ok(1));
        assert!(state.is_retired(4));
        assert!(state.is_won());
        assert_eq!(state.total_volume(), state.config().total_volume());
        assert_eq!(state.bags().unwrap().active_count(), 0);
    }

    #[test]
    fn test_collect_is_a_fixed_point() {
        let mut state = create_bag_state(vec![
            vec![R, R],
            vec![B, G],
            vec![G, B],
            vec![Y, Y],
            vec![],
        ]);
        // Red frees a bag for yellow, which is already complete
        let first = state.check_and_collect();
        assert_eq!(first, vec![0, 3]);
        assert_eq!(state.bags().unwrap().slots(), &[None, Some(B), Some(G)]);
        let bags = state.bags().cloned();
        let before = state.clone();

        assert!(state.check_and_collect().is_empty());
        assert_eq!(state.bags().cloned(), bags);
        assert!(state.same_layout(&before));
    }

    #[test]
    fn test_retired_bottles_reject_pours() {
        let mut state = create_bag_state(vec![
            vec![R, R],
            vec![B, G],
            vec![G, B],
            vec![Y, Y],
            vec![],
        ]);
        state.check_and_collect();
        assert!(state.is_retired(0));
        assert_eq!(
            state.pour(0, 4),
            Err(crate::error::Rejected::RetiredContainer { index: 0 })
        );
        assert_eq!(
            state.pour(1, 0),
            Err(crate::error::Rejected::RetiredContainer { index: 0 })
        );
    }

    #[test]
    fn test_internal_pour_never_collects() {
        let mut state = create_bag_state(vec![
            vec![R],
            vec![R],
            vec![B, B],
            vec![G, G],
            vec![Y, Y],
        ]);
        state.pour_without_side_effects(0, 1).unwrap();
        assert!(state.container(1).unwrap().is_complete());
        assert_eq!(state.retired_count(), 0);
    }

    #[test]
    fn test_no_bags_outside_bag_mode() {
        let mut state =
            GameState::from_layout(GameConfig::new(3, 2, 1, 2), vec![vec![R, R], vec![B, B], vec![]], vec![])
                .unwrap();
        assert!(state.bags().is_none());
        assert!(!state.update_bag_colors());
        assert!(state.check_and_collect().is_empty());
    }
}
