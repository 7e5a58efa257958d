//! Property-based tests for pours, generation and collection.
//!
//! Every property runs on small random puzzles that are scrambled by the
//! reverse generator from a fixed seed and then poured at random.

use liquid_sort::{
    build_solved, search, validate_round_trip, GameConfig, GameState, GenError, GenerationMode,
    GeneratorConfig, Slot, SolverConfig, Verdict,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

prop_compose! {
    fn arbitrary_config()(bottles in 2usize..=8, capacity in 1usize..=4)
        (empty in 0..bottles,
         color_seed in 0usize..8,
         jars in 0usize..=2,
         jar_capacity in 1usize..=3,
         use_bags in any::<bool>(),
         bottles in Just(bottles),
         capacity in Just(capacity)) -> GameConfig {
        let colors = 1 + color_seed % (bottles - empty);
        GameConfig::new(bottles, capacity, empty, colors)
            .with_jars(jars, jar_capacity)
            .with_bags(use_bags)
    }
}

fn arbitrary_pours() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..12, 0usize..12), 0..40)
}

/// Solved state scrambled with `steps` reverse steps. Degenerate puzzles
/// stay solved, which is still a valid starting point.
fn scrambled(config: &GameConfig, seed: u64, steps: usize) -> GameState {
    let mut state = build_solved(config).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    match state.generate(GenerationMode::Reverse(steps), &mut rng, &GeneratorConfig::default()) {
        Ok(_) | Err(GenError::Degenerate { .. }) => state,
        Err(err) => panic!("generation failed validation: {}", err),
    }
}

fn all_units_fit(state: &GameState) -> bool {
    let bottles_fit = state
        .bottles()
        .iter()
        .filter_map(Slot::container)
        .all(|c| c.len() <= c.capacity());
    bottles_fit && state.jars().iter().all(|c| c.len() <= c.capacity())
}

proptest! {
    #[test]
    fn solved_builder_is_won(config in arbitrary_config()) {
        let state = build_solved(&config).unwrap();
        prop_assert!(state.is_won());
        prop_assert_eq!(state.total_volume(), config.total_volume());
        prop_assert!(state.reverse_log().is_empty());
    }

    #[test]
    fn solved_layout_is_found_by_search(config in arbitrary_config()) {
        let state = build_solved(&config).unwrap();
        let result = search(&state, &SolverConfig::default());
        prop_assert_eq!(result.verdict, Verdict::Solved);
        prop_assert_eq!(result.rejected, None);
    }

    #[test]
    fn generated_puzzles_round_trip(
        config in arbitrary_config(),
        seed in any::<u64>(),
        steps in 0usize..30,
    ) {
        let state = scrambled(&config, seed, steps);
        prop_assert!(state.reverse_log().len() <= steps);
        prop_assert_eq!(state.total_volume(), config.total_volume());

        let solved = build_solved(&config).unwrap();
        prop_assert_eq!(validate_round_trip(&state, &solved, state.reverse_log()), Ok(()));
        prop_assert_eq!(state.validate_reverse_log(), Ok(()));
    }

    #[test]
    fn pours_conserve_volume(
        config in arbitrary_config(),
        seed in any::<u64>(),
        steps in 0usize..30,
        pours in arbitrary_pours(),
    ) {
        let mut state = scrambled(&config, seed, steps);
        let totals = state.color_totals();
        for (from, to) in pours {
            let _ = state.pour(from, to);
            prop_assert_eq!(state.total_volume(), config.total_volume());
            if !config.use_bags {
                prop_assert_eq!(&state.color_totals(), &totals);
            }
        }
    }

    #[test]
    fn pours_respect_capacity_and_color(
        config in arbitrary_config(),
        seed in any::<u64>(),
        steps in 0usize..30,
        pours in arbitrary_pours(),
    ) {
        let mut state = scrambled(&config, seed, steps);
        for (from, to) in pours {
            let before = state.clone();
            match state.pour_without_side_effects(from, to) {
                Ok(moved) => {
                    prop_assert!(moved >= 1);
                    let source = before.container(from).unwrap();
                    let target = before.container(to).unwrap();
                    let color = source.top().unwrap();
                    prop_assert!(target.top().map_or(true, |top| top == color));
                    prop_assert!(moved <= source.top_run());
                    prop_assert_eq!(state.container(to).unwrap().top(), Some(color));
                    prop_assert_eq!(state.container(to).unwrap().len(), target.len() + moved);
                }
                Err(_) => {
                    prop_assert!(state.same_layout(&before));
                    prop_assert_eq!(state.empty_bottle_count(), before.empty_bottle_count());
                    prop_assert_eq!(state.empty_jar_count(), before.empty_jar_count());
                }
            }
            prop_assert!(all_units_fit(&state));
        }
    }

    #[test]
    fn empty_counters_match_contents(
        config in arbitrary_config(),
        seed in any::<u64>(),
        pours in arbitrary_pours(),
    ) {
        let mut state = scrambled(&config, seed, 20);
        for (from, to) in pours {
            let _ = state.pour(from, to);
            let empty_bottles = state
                .bottles()
                .iter()
                .filter_map(Slot::container)
                .filter(|c| c.is_empty())
                .count();
            let empty_jars = state.jars().iter().filter(|c| c.is_empty()).count();
            prop_assert_eq!(state.empty_bottle_count(), empty_bottles);
            prop_assert_eq!(state.empty_jar_count(), empty_jars);
        }
    }

    #[test]
    fn legal_moves_are_exactly_the_accepted_pours(
        config in arbitrary_config(),
        seed in any::<u64>(),
        steps in 0usize..30,
    ) {
        let state = scrambled(&config, seed, steps);
        let legal = state.enumerate_legal_moves();
        let count = config.container_count();
        for from in 0..count {
            for to in 0..count {
                let mut trial = state.clone();
                let accepted = trial.pour_without_side_effects(from, to).ok();
                let listed = legal
                    .iter()
                    .find(|m| m.from == from && m.to == to)
                    .map(|m| m.units);
                prop_assert_eq!(accepted, listed);
            }
        }
    }

    #[test]
    fn collection_reaches_a_fixed_point(
        config in arbitrary_config(),
        seed in any::<u64>(),
        steps in 0usize..30,
        pours in arbitrary_pours(),
    ) {
        let config = config.with_bags(true);
        let mut state = scrambled(&config, seed, steps);
        for (from, to) in pours {
            if state.pour(from, to).is_err() {
                continue;
            }
            let bags = state.bags().cloned();
            let before = state.clone();
            prop_assert!(state.check_and_collect().is_empty());
            prop_assert_eq!(state.bags().cloned(), bags);
            prop_assert!(state.same_layout(&before));
        }
    }
}
