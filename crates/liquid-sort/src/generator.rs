//! Puzzle generation.
//!
//! Reverse generation starts from the solved layout and applies random
//! backward pours. A backward pour ignores color compatibility, which is
//! what lets a uniform layout get mixed, but each one is only kept if the
//! ordinary forward pour undoes it exactly. The recorded steps are then
//! replayed by the validator before the puzzle is handed out.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::builder::color_pool;
use crate::error::GenError;
use crate::puzzle::{Container, GameConfig, Move, Slot};
use crate::state::GameState;
use crate::validator::validate_round_trip;

/// How to fill a fresh puzzle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Scramble the solved layout with this many reverse steps
    Reverse(usize),
    /// Shuffle every unit into random bottles; solvability is not guaranteed
    PureRandom,
}

/// Configuration for reverse generation
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Attempts to find one reversible step before giving up.
    /// Defaults to `min(50, 5 * bottles)`.
    pub attempts_per_step: Option<usize>,
}

impl GeneratorConfig {
    fn attempts_for(&self, bottles: usize) -> usize {
        self.attempts_per_step
            .unwrap_or_else(|| (5 * bottles).min(50))
            .max(1)
    }
}

/// Summary of one generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub target_steps: Option<usize>,
    pub effective_steps: usize,
    pub attempts: usize,
    pub mixed_bottles: usize,
    pub single_color_bottles: usize,
    pub complete_bottles: usize,
}

impl GenerationReport {
    /// Fill in the bottle counts from `state`
    pub fn describe(mut self, state: &GameState) -> Self {
        for container in state.bottles().iter().filter_map(Slot::container) {
            if container.is_empty() {
                continue;
            }
            if !container.is_single_color() {
                self.mixed_bottles += 1;
            } else if container.is_complete() {
                self.complete_bottles += 1;
            } else {
                self.single_color_bottles += 1;
            }
        }
        self
    }
}

/// Default number of reverse steps: about `N*K*M/4` with +-25% jitter,
/// clamped to `[max(10, 2N), N*K*M]`.
pub fn default_difficulty(config: &GameConfig, rng: &mut impl Rng) -> usize {
    let ceiling = config
        .bottles
        .saturating_mul(config.colors)
        .saturating_mul(config.capacity);
    let base = ceiling / 4;
    let variation = base / 4;
    let difficulty = base + rng.random_range(0..=2 * variation) - variation;
    let floor = config.bottles.saturating_mul(2).max(10);
    difficulty.max(floor).min(ceiling)
}

impl GameState {
    /// Replace the contents with a freshly generated puzzle.
    ///
    /// `Err(GenError::Degenerate { .. })` leaves the state solved and playable.
    /// `Err(GenError::Validation)` means the attempt must be discarded; the
    /// state is reset to solved and the caller should retry with fresh
    /// randomness.
    pub fn generate(
        &mut self,
        mode: GenerationMode,
        rng: &mut impl Rng,
        config: &GeneratorConfig,
    ) -> Result<GenerationReport, GenError> {
        match mode {
            GenerationMode::Reverse(steps) => self.generate_by_reverse(steps, rng, config),
            GenerationMode::PureRandom => Ok(self.generate_pure_random(rng)),
        }
    }

    #[instrument(skip(self, rng, config), fields(bottles = self.config.bottles, colors = self.config.colors))]
    fn generate_by_reverse(
        &mut self,
        target_steps: usize,
        rng: &mut impl Rng,
        config: &GeneratorConfig,
    ) -> Result<GenerationReport, GenError> {
        self.reset_to_solved();
        let solved = self.scratch();
        let attempts_per_step = config.attempts_for(self.config.bottles);

        let mut log = Vec::with_capacity(target_steps);
        let mut attempts = 0;
        for step in 0..target_steps {
            match self.try_reverse_step(rng, attempts_per_step, &mut attempts) {
                Some(mv) => {
                    debug!(step, from = mv.from, to = mv.to, amount = mv.amount, color = %mv.color, "reverse step");
                    log.push(mv);
                }
                None => {
                    info!(
                        effective = log.len(),
                        target_steps, "no reversible step left, stopping early"
                    );
                    break;
                }
            }
        }

        if target_steps > 0 && log.is_empty() {
            warn!(attempts, "reverse generation found no usable step");
            return Err(GenError::Degenerate {
                target_steps,
                attempts,
            });
        }

        if let Err(err) = validate_round_trip(self, &solved, &log) {
            warn!(error = %err, "generated puzzle failed round-trip validation");
            self.reset_to_solved();
            return Err(err.into());
        }

        self.reverse_log = log;
        self.initialize_bags();

        let report = GenerationReport {
            target_steps: Some(target_steps),
            effective_steps: self.reverse_log.len(),
            attempts,
            ..Default::default()
        }
        .describe(self);
        info!(
            effective = report.effective_steps,
            attempts = report.attempts,
            mixed = report.mixed_bottles,
            "reverse generation complete"
        );
        Ok(report)
    }

    /// Look for one backward pour that the forward rules can undo exactly,
    /// and apply it.
    fn try_reverse_step(
        &mut self,
        rng: &mut impl Rng,
        max_attempts: usize,
        attempts: &mut usize,
    ) -> Option<Move> {
        let sources: Vec<usize> = self
            .bottles
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.container().map_or(false, |c| !c.is_empty()))
            .map(|(index, _)| index)
            .collect();
        if sources.is_empty() {
            return None;
        }

        for _ in 0..max_attempts {
            *attempts += 1;
            let source = sources[rng.random_range(0..sources.len())];
            let Some(container) = self.bottles[source].container() else {
                continue;
            };
            let Some(color) = container.top() else {
                continue;
            };
            let amount = rng.random_range(1..=container.top_run());

            let targets: Vec<usize> = self
                .bottles
                .iter()
                .enumerate()
                .filter(|&(index, slot)| {
                    index != source && slot.container().map_or(false, |c| c.space() >= amount)
                })
                .map(|(index, _)| index)
                .collect();
            if targets.is_empty() {
                continue;
            }
            let target = targets[rng.random_range(0..targets.len())];

            let mut trial = self.scratch();
            if !trial.reverse_transfer(source, target, amount) {
                continue;
            }
            match trial.pour_without_side_effects(target, source) {
                Ok(moved) if moved == amount && trial.same_layout(self) => {
                    self.reverse_transfer(source, target, amount);
                    return Some(Move {
                        from: source,
                        to: target,
                        amount,
                        color,
                    });
                }
                _ => continue,
            }
        }
        None
    }

    /// Move `amount` units of the source's top color onto `to` with no color
    /// check. Only capacity and the source run are enforced.
    pub(crate) fn reverse_transfer(&mut self, from: usize, to: usize, amount: usize) -> bool {
        if from == to || amount == 0 {
            return false;
        }
        let (Some(source), Some(target)) = (
            self.bottles.get(from).and_then(Slot::container),
            self.bottles.get(to).and_then(Slot::container),
        ) else {
            return false;
        };
        let Some(color) = source.top() else {
            return false;
        };
        if source.top_run() < amount || target.space() < amount {
            return false;
        }
        let target_was_empty = target.is_empty();

        let mut source_emptied = false;
        if let Some(source) = self.bottles[from].container_mut() {
            source.take_top(amount);
            source_emptied = source.is_empty();
        }
        if let Some(target) = self.bottles[to].container_mut() {
            target.push_run(color, amount);
        }
        if source_emptied {
            self.empty_bottles += 1;
        }
        if target_was_empty {
            self.empty_bottles = self.empty_bottles.saturating_sub(1);
        }
        true
    }

    /// Fill `N - J` randomly chosen bottles from a shuffled pool of the
    /// solved layout's units.
    #[instrument(skip(self, rng), fields(bottles = self.config.bottles))]
    fn generate_pure_random(&mut self, rng: &mut impl Rng) -> GenerationReport {
        self.reset_to_solved();
        let mut pool = color_pool(&self.config);
        pool.shuffle(rng);

        let mut order: Vec<usize> = (0..self.config.bottles).collect();
        order.shuffle(rng);
        order.truncate(self.config.filled_bottles());

        let capacity = self.config.capacity;
        let mut bottles: Vec<Container> = (0..self.config.bottles)
            .map(|_| Container::new(capacity))
            .collect();
        for (chunk, &index) in pool.chunks(capacity).zip(&order) {
            if let Some(container) = Container::from_units(chunk, capacity) {
                bottles[index] = container;
            }
        }
        self.bottles = bottles.into_iter().map(Slot::Active).collect();
        self.recount_empty();
        self.initialize_bags();

        let report = GenerationReport::default().describe(self);
        if self.is_won() {
            info!("random fill happens to be solved");
        }
        info!(
            mixed = report.mixed_bottles,
            single_color = report.single_color_bottles,
            complete = report.complete_bottles,
            "random fill complete"
        );
        report
    }

    /// Redistribute all water outside complete bottles at random.
    ///
    /// Complete and retired bottles stay put. Units from the other bottles
    /// and from every jar are shuffled into the non-complete bottles, so the
    /// jars end up empty. The reverse log no longer describes the state and
    /// is cleared.
    #[instrument(skip(self, rng))]
    pub fn shuffle_water(&mut self, rng: &mut impl Rng) {
        let mut pool = Vec::new();
        let mut open = Vec::new();
        for (index, slot) in self.bottles.iter_mut().enumerate() {
            let Some(container) = slot.container_mut() else {
                continue;
            };
            if container.is_complete() {
                continue;
            }
            pool.extend_from_slice(container.units());
            container.clear();
            open.push(index);
        }
        for jar in &mut self.jars {
            pool.extend_from_slice(jar.units());
            jar.clear();
        }
        debug!(units = pool.len(), bottles = open.len(), "collected water to shuffle");

        pool.shuffle(rng);
        let mut leftover = Vec::new();
        for color in pool {
            let mut placed = false;
            while !open.is_empty() {
                let pick = rng.random_range(0..open.len());
                match self.bottles[open[pick]].container_mut() {
                    Some(container) if !container.is_full() => {
                        container.push_run(color, 1);
                        if container.is_full() {
                            open.swap_remove(pick);
                        }
                        placed = true;
                        break;
                    }
                    _ => {
                        open.swap_remove(pick);
                    }
                }
            }
            if !placed {
                leftover.push(color);
            }
        }

        // Only reachable from a hand-built state with excess volume
        let mut lost = 0;
        for color in leftover {
            match self.jars.iter_mut().find(|jar| !jar.is_full()) {
                Some(jar) => jar.push_run(color, 1),
                None => lost += 1,
            }
        }
        if lost > 0 {
            warn!(units = lost, "water could not be redistributed");
        }

        self.reverse_log.clear();
        self.recount_empty();
        self.update_bag_colors();
    }
}
