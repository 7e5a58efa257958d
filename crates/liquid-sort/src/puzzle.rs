//! Puzzle representation types: colors, containers and parameters.
//!
//! These are the value types every other module works with. A
//! [`Container`] is a bounded stack of [`Color`] units whose top is the
//! last unit pushed.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ConfigError;

/// Units stored inline before a container spills to the heap
const INLINE_UNITS: usize = 8;

/// Names used for diagnostics, indexed by color id
const COLOR_NAMES: [&str; 10] = [
    "red", "blue", "green", "yellow", "orange", "purple", "brown", "black", "white", "pink",
];

/// Maximum number of bottles a session may grow to
pub const MAX_BOTTLES: usize = 30;

/// Maximum number of jars
pub const MAX_JARS: usize = MAX_BOTTLES;

/// Maximum units a bottle or jar may hold
pub const MAX_CAPACITY: usize = 1024;

// Search signatures store lengths as u16 and reserve u16::MAX for retired slots
const _: () = assert!(MAX_CAPACITY < u16::MAX as usize);

/// Liquid color - an opaque, totally ordered tag
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Color(pub u16);

impl Color {
    /// Largest number of distinct colors a puzzle can use
    pub const MAX_COLORS: usize = u16::MAX as usize;

    /// Get the color id as an index
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Human readable name for logs and reports
    pub fn name(self) -> String {
        match COLOR_NAMES.get(self.index()) {
            Some(name) => (*name).to_string(),
            None => format!("color{}", self.0),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A capacity-bounded stack of colored units
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Container {
    units: SmallVec<[Color; INLINE_UNITS]>,
    capacity: usize,
}

impl Container {
    /// Create an empty container
    pub fn new(capacity: usize) -> Self {
        Self {
            units: SmallVec::new(),
            capacity,
        }
    }

    /// Create a container filled to capacity with one color
    pub fn filled(color: Color, capacity: usize) -> Self {
        Self {
            units: SmallVec::from_elem(color, capacity),
            capacity,
        }
    }

    /// Create a container from bottom-to-top units.
    /// Returns `None` if the units do not fit.
    pub fn from_units(units: &[Color], capacity: usize) -> Option<Self> {
        if units.len() > capacity {
            return None;
        }
        Some(Self {
            units: SmallVec::from_slice(units),
            capacity,
        })
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.units.len() >= self.capacity
    }

    /// Free space left in the container
    pub fn space(&self) -> usize {
        self.capacity.saturating_sub(self.units.len())
    }

    /// Units from bottom to top
    pub fn units(&self) -> &[Color] {
        &self.units
    }

    /// Color of the top unit
    pub fn top(&self) -> Option<Color> {
        self.units.last().copied()
    }

    /// Length of the homogeneous run at the top. Scans only that run.
    pub fn top_run(&self) -> usize {
        match self.top() {
            Some(color) => self.units.iter().rev().take_while(|&&c| c == color).count(),
            None => 0,
        }
    }

    /// All units share one color (vacuously true when empty)
    pub fn is_single_color(&self) -> bool {
        match self.units.first() {
            Some(&first) => self.units.iter().all(|&c| c == first),
            None => true,
        }
    }

    /// Full and single-colored
    pub fn is_complete(&self) -> bool {
        !self.is_empty() && self.is_full() && self.is_single_color()
    }

    /// Append `amount` units of `color` without any compatibility check.
    /// The caller guarantees the space.
    pub(crate) fn push_run(&mut self, color: Color, amount: usize) {
        debug_assert!(amount <= self.space());
        self.units.extend(std::iter::repeat(color).take(amount));
    }

    /// Remove `amount` units from the top
    pub(crate) fn take_top(&mut self, amount: usize) {
        let keep = self.units.len().saturating_sub(amount);
        self.units.truncate(keep);
    }

    pub(crate) fn clear(&mut self) {
        self.units.clear();
    }
}

/// A bottle position. Retired bottles keep their index for the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Active(Container),
    Retired,
}

impl Slot {
    pub fn container(&self) -> Option<&Container> {
        match self {
            Slot::Active(container) => Some(container),
            Slot::Retired => None,
        }
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut Container> {
        match self {
            Slot::Active(container) => Some(container),
            Slot::Retired => None,
        }
    }

    pub fn is_retired(&self) -> bool {
        matches!(self, Slot::Retired)
    }
}

/// Where a flat container index points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Bottle(usize),
    Jar(usize),
}

/// One accepted reverse step: `amount` units of `color` went from `from`
/// to `to`. Pouring `to -> from` undoes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: usize,
    pub to: usize,
    pub amount: usize,
    pub color: Color,
}

/// Puzzle parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Number of bottles (N)
    pub bottles: usize,
    /// Capacity of each bottle (M)
    pub capacity: usize,
    /// Bottles that start empty in the solved layout (J)
    pub empty_bottles: usize,
    /// Number of colors (K)
    pub colors: usize,
    #[serde(default)]
    pub jar_count: usize,
    #[serde(default)]
    pub jar_capacity: usize,
    #[serde(default)]
    pub use_bags: bool,
}

impl GameConfig {
    pub fn new(bottles: usize, capacity: usize, empty_bottles: usize, colors: usize) -> Self {
        Self {
            bottles,
            capacity,
            empty_bottles,
            colors,
            jar_count: 0,
            jar_capacity: 0,
            use_bags: false,
        }
    }

    pub fn with_jars(mut self, jar_count: usize, jar_capacity: usize) -> Self {
        self.jar_count = jar_count;
        self.jar_capacity = jar_capacity;
        self
    }

    pub fn with_bags(mut self, use_bags: bool) -> Self {
        self.use_bags = use_bags;
        self
    }

    /// Check the parameters in the order a caller would fix them
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bottles <= self.empty_bottles {
            return Err(ConfigError::NotEnoughBottles {
                bottles: self.bottles,
                empty: self.empty_bottles,
            });
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.colors == 0 {
            return Err(ConfigError::ZeroColors);
        }
        if self.jar_count > 0 && self.jar_capacity == 0 {
            return Err(ConfigError::ZeroJarCapacity {
                jar_count: self.jar_count,
            });
        }
        let limits = [
            ("bottles", self.bottles, MAX_BOTTLES),
            ("capacity", self.capacity, MAX_CAPACITY),
            ("jar count", self.jar_count, MAX_JARS),
            ("jar capacity", self.jar_capacity, MAX_CAPACITY),
        ];
        if let Some(&(field, value, max)) = limits.iter().find(|(_, value, max)| value > max) {
            return Err(ConfigError::TooLarge { field, value, max });
        }
        // Every color needs at least one whole bottle
        let max_colors = self.total_volume() / self.capacity;
        if self.colors > max_colors || self.colors > Color::MAX_COLORS {
            return Err(ConfigError::TooManyColors {
                colors: self.colors,
                filled: self.filled_bottles(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Bottles that hold water in the solved layout (N - J)
    pub fn filled_bottles(&self) -> usize {
        self.bottles.saturating_sub(self.empty_bottles)
    }

    /// Total water volume, fixed for the session
    pub fn total_volume(&self) -> usize {
        self.filled_bottles().saturating_mul(self.capacity)
    }

    /// Bottles plus jars
    pub fn container_count(&self) -> usize {
        self.bottles + self.jar_count
    }

    pub(crate) fn locate(&self, index: usize) -> Option<Location> {
        if index < self.bottles {
            Some(Location::Bottle(index))
        } else if index < self.container_count() {
            Some(Location::Jar(index - self.bottles))
        } else {
            None
        }
    }
}
