//! Canonical solved layout.
//!
//! The `N - J` filled bottles are shared among the `K` colors as evenly as
//! possible: every color gets `(N - J) / K` bottles and the first
//! `(N - J) % K` colors get one more. Bottles are filled in index order, so
//! the last `J` bottles and every jar start empty.

use crate::error::ConfigError;
use crate::puzzle::{Color, Container, GameConfig, Slot};
use crate::state::GameState;

/// Number of bottles each color fills in the solved layout
pub fn bottles_per_color(config: &GameConfig) -> Vec<usize> {
    let filled = config.filled_bottles();
    let base = filled / config.colors;
    let extra = filled % config.colors;
    (0..config.colors)
        .map(|color| if color < extra { base + 1 } else { base })
        .collect()
}

/// Solved bottle contents, one entry per bottle
pub fn solved_bottles(config: &GameConfig) -> Vec<Container> {
    let mut bottles = Vec::with_capacity(config.bottles);
    for (color, count) in bottles_per_color(config).into_iter().enumerate() {
        for _ in 0..count {
            bottles.push(Container::filled(Color(color as u16), config.capacity));
        }
    }
    bottles.resize(config.bottles, Container::new(config.capacity));
    bottles
}

/// Every unit of the solved layout, grouped by color
pub fn color_pool(config: &GameConfig) -> Vec<Color> {
    let mut pool = Vec::with_capacity(config.total_volume());
    for (color, count) in bottles_per_color(config).into_iter().enumerate() {
        pool.extend(std::iter::repeat(Color(color as u16)).take(count * config.capacity));
    }
    pool
}

/// Validate the parameters and build the solved state
pub fn build_solved(config: &GameConfig) -> Result<GameState, ConfigError> {
    config.validate()?;
    let mut state = GameState::empty(config.clone());
    state.reset_to_solved();
    Ok(state)
}

impl GameState {
    /// Put every bottle back into the solved layout, empty the jars, clear
    /// retirement and the reverse log, and rebind bags.
    pub fn reset_to_solved(&mut self) {
        self.bottles = solved_bottles(&self.config)
            .into_iter()
            .map(Slot::Active)
            .collect();
        for jar in &mut self.jars {
            jar.clear();
        }
        self.reverse_log.clear();
        self.recount_empty();
        self.initialize_bags();
    }
}
