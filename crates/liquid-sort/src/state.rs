//! The game state aggregate and its serializable snapshot form.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::bags::Bags;
use crate::error::{ConfigError, SnapshotError};
use crate::puzzle::{Color, Container, GameConfig, Location, Move, Slot, MAX_BOTTLES, MAX_CAPACITY};

/// All containers of one session plus collector state.
///
/// Cloning is deep: a clone shares nothing with the original, so scratch
/// copies used for reversibility tests and search expansion can be mutated
/// freely.
#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) config: GameConfig,
    pub(crate) bottles: Vec<Slot>,
    pub(crate) jars: Vec<Container>,
    pub(crate) bags: Option<Bags>,
    pub(crate) empty_bottles: usize,
    pub(crate) empty_jars: usize,
    pub(crate) reverse_log: Vec<Move>,
}

impl GameState {
    /// All bottles and jars empty. Callers fill it in.
    pub(crate) fn empty(config: GameConfig) -> Self {
        let bottles = (0..config.bottles)
            .map(|_| Slot::Active(Container::new(config.capacity)))
            .collect();
        let jars = (0..config.jar_count)
            .map(|_| Container::new(config.jar_capacity))
            .collect();
        let bags = config.use_bags.then(Bags::default);
        Self {
            empty_bottles: config.bottles,
            empty_jars: config.jar_count,
            config,
            bottles,
            jars,
            bags,
            reverse_log: Vec::new(),
        }
    }

    /// Build a state from explicit bottle and jar contents (bottom to top).
    /// Bags, when enabled, are initialized from the contents.
    pub fn from_layout(
        config: GameConfig,
        bottles: Vec<Vec<Color>>,
        jars: Vec<Vec<Color>>,
    ) -> Result<Self, SnapshotError> {
        Self::from_snapshot(Snapshot {
            config,
            bottles: bottles.into_iter().map(Some).collect(),
            jars,
            bags: None,
        })
    }

    /// Rebuild a state from its snapshot form
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let Snapshot {
            config,
            bottles,
            jars,
            bags,
        } = snapshot;
        config.validate()?;

        if bottles.len() != config.bottles {
            return Err(SnapshotError::ContainerCount {
                kind: "bottles",
                expected: config.bottles,
                found: bottles.len(),
            });
        }
        if jars.len() != config.jar_count {
            return Err(SnapshotError::ContainerCount {
                kind: "jars",
                expected: config.jar_count,
                found: jars.len(),
            });
        }

        let check_colors = |units: &[Color]| -> Result<(), SnapshotError> {
            match units.iter().find(|c| c.index() >= config.colors) {
                Some(&color) => Err(SnapshotError::UnknownColor {
                    color,
                    colors: config.colors,
                }),
                None => Ok(()),
            }
        };

        let mut slots = Vec::with_capacity(bottles.len());
        for (index, bottle) in bottles.into_iter().enumerate() {
            let Some(units) = bottle else {
                if !config.use_bags {
                    return Err(SnapshotError::RetiredWithoutBags);
                }
                slots.push(Slot::Retired);
                continue;
            };
            check_colors(&units)?;
            let container = Container::from_units(&units, config.capacity).ok_or(
                SnapshotError::Overfilled {
                    kind: "bottle",
                    index,
                    len: units.len(),
                    capacity: config.capacity,
                },
            )?;
            slots.push(Slot::Active(container));
        }

        let mut containers = Vec::with_capacity(jars.len());
        for (index, units) in jars.into_iter().enumerate() {
            check_colors(&units)?;
            let container = Container::from_units(&units, config.jar_capacity).ok_or(
                SnapshotError::Overfilled {
                    kind: "jar",
                    index,
                    len: units.len(),
                    capacity: config.jar_capacity,
                },
            )?;
            containers.push(container);
        }

        let mut state = Self::empty(config);
        state.bottles = slots;
        state.jars = containers;
        state.recount_empty();

        if state.config.use_bags {
            match bags {
                Some(bags) => {
                    bags.check(
                        state.config.colors,
                        state.retired_count(),
                        state.config.capacity,
                    )?;
                    state.bags = Some(bags);
                    // Drop bindings to colors that are no longer on the board
                    state.update_bag_colors();
                }
                None => state.initialize_bags(),
            }
        }
        Ok(state)
    }

    /// Serializable copy of the current layout
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            config: self.config.clone(),
            bottles: self
                .bottles
                .iter()
                .map(|slot| slot.container().map(|c| c.units().to_vec()))
                .collect(),
            jars: self.jars.iter().map(|c| c.units().to_vec()).collect(),
            bags: self.bags.clone(),
        }
    }

    /// Clone everything except the reverse log
    pub(crate) fn scratch(&self) -> Self {
        Self {
            config: self.config.clone(),
            bottles: self.bottles.clone(),
            jars: self.jars.clone(),
            bags: self.bags.clone(),
            empty_bottles: self.empty_bottles,
            empty_jars: self.empty_jars,
            reverse_log: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn bottles(&self) -> &[Slot] {
        &self.bottles
    }

    pub fn jars(&self) -> &[Container] {
        &self.jars
    }

    pub fn bags(&self) -> Option<&Bags> {
        self.bags.as_ref()
    }

    /// Reverse steps recorded by the last successful generation
    pub fn reverse_log(&self) -> &[Move] {
        &self.reverse_log
    }

    pub fn empty_bottle_count(&self) -> usize {
        self.empty_bottles
    }

    pub fn empty_jar_count(&self) -> usize {
        self.empty_jars
    }

    pub fn retired_count(&self) -> usize {
        self.bottles.iter().filter(|s| s.is_retired()).count()
    }

    pub fn is_retired(&self, index: usize) -> bool {
        self.bottles.get(index).map_or(false, Slot::is_retired)
    }

    /// Container at a flat index; `None` when out of range or retired
    pub fn container(&self, index: usize) -> Option<&Container> {
        self.config.locate(index).and_then(|loc| self.container_at(loc))
    }

    pub(crate) fn container_at(&self, location: Location) -> Option<&Container> {
        match location {
            Location::Bottle(i) => self.bottles.get(i).and_then(Slot::container),
            Location::Jar(i) => self.jars.get(i),
        }
    }

    pub(crate) fn container_at_mut(&mut self, location: Location) -> Option<&mut Container> {
        match location {
            Location::Bottle(i) => self.bottles.get_mut(i).and_then(Slot::container_mut),
            Location::Jar(i) => self.jars.get_mut(i),
        }
    }

    /// Non-retired bottles followed by jars
    pub(crate) fn active_containers(&self) -> impl Iterator<Item = &Container> {
        self.bottles
            .iter()
            .filter_map(Slot::container)
            .chain(self.jars.iter())
    }

    /// Units currently held by non-retired containers
    pub fn active_units(&self) -> usize {
        self.active_containers().map(Container::len).sum()
    }

    /// Held units plus the capacity of every retired bottle. Equals
    /// `config().total_volume()` for every state reached by pouring.
    pub fn total_volume(&self) -> usize {
        self.active_units() + self.retired_count() * self.config.capacity
    }

    /// Units per color across non-retired containers
    pub fn color_totals(&self) -> BTreeMap<Color, usize> {
        let mut totals = BTreeMap::new();
        for container in self.active_containers() {
            for &color in container.units() {
                *totals.entry(color).or_insert(0) += 1;
            }
        }
        totals
    }

    /// Distinct colors present in non-retired containers
    pub(crate) fn active_colors(&self) -> BTreeSet<Color> {
        self.active_containers()
            .flat_map(|c| c.units().iter().copied())
            .collect()
    }

    /// Same bottles (including retirement) and jars, unit for unit
    pub fn same_layout(&self, other: &GameState) -> bool {
        self.bottles == other.bottles && self.jars == other.jars
    }

    pub(crate) fn recount_empty(&mut self) {
        self.empty_bottles = self
            .bottles
            .iter()
            .filter_map(Slot::container)
            .filter(|c| c.is_empty())
            .count();
        self.empty_jars = self.jars.iter().filter(|c| c.is_empty()).count();
    }

    /// Check whether the puzzle is solved.
    ///
    /// Without bags every non-empty bottle must be complete and exactly
    /// `N - J` bottles must hold water. With bags no unit may remain in a
    /// non-complete container; collected bottles count as done. Jars are
    /// never collected, so a full single-color jar also counts as done.
    pub fn is_won(&self) -> bool {
        if self.bags.is_some() {
            return self
                .active_containers()
                .all(|c| c.is_empty() || c.is_complete());
        }

        let mut filled = 0;
        for container in self.bottles.iter().filter_map(Slot::container) {
            if container.is_empty() {
                continue;
            }
            if !container.is_complete() {
                return false;
            }
            filled += 1;
        }
        filled == self.config.filled_bottles()
    }

    /// Order-sensitive key of every container's contents.
    ///
    /// Lengths fit in a `u16` because capacities are capped at
    /// [`MAX_CAPACITY`], which leaves `u16::MAX` free as the retired marker.
    pub(crate) fn signature(&self) -> Vec<u16> {
        let mut key = Vec::with_capacity(self.config.container_count() + self.config.total_volume());
        for slot in &self.bottles {
            match slot.container() {
                Some(container) => {
                    key.push(container.len() as u16);
                    key.extend(container.units().iter().map(|c| c.0));
                }
                None => key.push(u16::MAX),
            }
        }
        for jar in &self.jars {
            key.push(jar.len() as u16);
            key.extend(jar.units().iter().map(|c| c.0));
        }
        key
    }

    /// Append one empty bottle. The solved layout gains an empty bottle too,
    /// so the total volume and the win rule are unchanged. Jar indices shift
    /// up by one.
    pub fn add_empty_bottle(&mut self) -> bool {
        if self.config.bottles >= MAX_BOTTLES {
            return false;
        }
        self.bottles
            .push(Slot::Active(Container::new(self.config.capacity)));
        self.config.bottles += 1;
        self.config.empty_bottles += 1;
        self.empty_bottles += 1;
        true
    }

    /// Describe why no pour may be available
    pub fn analyze_deadlock(&self) -> DeadlockReport {
        let mut groups: BTreeMap<Color, Vec<usize>> = BTreeMap::new();
        for index in 0..self.config.container_count() {
            if let Some(top) = self.container(index).and_then(Container::top) {
                groups.entry(top).or_default().push(index);
            }
        }
        let no_empty = self.empty_bottles == 0 && self.empty_jars == 0;
        let all_isolated = groups.values().all(|g| g.len() == 1);
        DeadlockReport {
            has_moves: !self.enumerate_legal_moves().is_empty(),
            won: self.is_won(),
            empty_bottles: self.empty_bottles,
            empty_jars: self.empty_jars,
            top_colors: groups
                .into_iter()
                .map(|(color, containers)| TopColorGroup { color, containers })
                .collect(),
            isolated_tops: all_isolated && no_empty,
        }
    }
}

/// Serializable layout. `None` bottles are retired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub config: GameConfig,
    pub bottles: Vec<Option<Vec<Color>>>,
    #[serde(default)]
    pub jars: Vec<Vec<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bags: Option<Bags>,
}

/// Containers sharing a top color
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopColorGroup {
    pub color: Color,
    pub containers: Vec<usize>,
}

/// Why a state has (or lacks) moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlockReport {
    pub has_moves: bool,
    pub won: bool,
    pub empty_bottles: usize,
    pub empty_jars: usize,
    pub top_colors: Vec<TopColorGroup>,
    /// Every top color sits alone and nothing is empty
    pub isolated_tops: bool,
}

/// Create a game in its solved form
pub fn create_game(
    bottles: usize,
    capacity: usize,
    empty_bottles: usize,
    colors: usize,
    jar_count: usize,
    jar_capacity: usize,
    use_bags: bool,
) -> Result<GameState, ConfigError> {
    let config = GameConfig::new(bottles, capacity, empty_bottles, colors)
        .with_jars(jar_count, jar_capacity)
        .with_bags(use_bags);
    crate::builder::build_solved(&config)
}
