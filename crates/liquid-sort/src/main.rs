//! CLI entry point for the liquid sort generator.
//!
//! Usage:
//!   liquid-sort generate [options]
//!   liquid-sort check <state.json> | --stdin [options]
//!   liquid-sort moves <state.json> | --stdin
//!   liquid-sort pour <state.json> | --stdin --from <i> --to <j>
//!
//! Results are printed to stdout as JSON. Logs go to stderr and are
//! filtered with `RUST_LOG` (default: info).

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use liquid_sort::{
    build_solved, default_difficulty, search, DeadlockReport, GameConfig, GameState, GenError,
    GenerationMode, GenerationReport, GeneratorConfig, LegalMove, Move, SearchResult, Snapshot,
    SolverConfig, Verdict,
};

#[derive(Parser)]
#[command(name = "liquid-sort")]
#[command(about = "Generate and check liquid sort puzzles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new puzzle
    Generate {
        /// Total number of bottles
        #[arg(long, default_value = "8")]
        bottles: usize,

        /// Units per bottle
        #[arg(long, default_value = "4")]
        capacity: usize,

        /// Bottles left empty in the solved layout
        #[arg(long, default_value = "2")]
        empty: usize,

        /// Number of colors
        #[arg(long, default_value = "6")]
        colors: usize,

        /// Number of auxiliary jars
        #[arg(long, default_value = "0")]
        jars: usize,

        /// Units per jar
        #[arg(long, default_value = "0")]
        jar_capacity: usize,

        /// Collect completed bottles into bags
        #[arg(long)]
        bags: bool,

        /// Reverse steps to apply (default: scaled to the puzzle size)
        #[arg(long)]
        steps: Option<usize>,

        /// Fill bottles at random instead of generating backwards
        #[arg(long, conflicts_with = "steps")]
        random: bool,

        /// Seed for a reproducible puzzle
        #[arg(long)]
        seed: Option<u64>,

        /// Generation attempts before giving up on validation failures
        #[arg(long, default_value = "5")]
        retries: usize,

        /// Attempts to find each reverse step (default: min(50, 5 * bottles))
        #[arg(long)]
        attempts_per_step: Option<usize>,
    },

    /// Search a puzzle state for a solution
    Check {
        /// Path to state JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read state from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// Maximum states to expand
        #[arg(long, default_value = "1000")]
        max_states: usize,

        /// Maximum pours from the starting state
        #[arg(long, default_value = "10")]
        max_depth: usize,
    },

    /// List legal pours and deadlock details for a state
    Moves {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        #[arg(long)]
        stdin: bool,
    },

    /// Apply one player pour and print the resulting state
    Pour {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        #[arg(long)]
        stdin: bool,

        /// Source container index
        #[arg(long)]
        from: usize,

        /// Destination container index
        #[arg(long)]
        to: usize,
    },
}

/// Output format for generation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateOutput {
    state: Snapshot,
    report: GenerationReport,
    reverse_log: Vec<Move>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<SearchResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MovesOutput {
    won: bool,
    moves: Vec<LegalMove>,
    deadlock: DeadlockReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PourOutput {
    moved: usize,
    retired: Vec<usize>,
    won: bool,
    state: Snapshot,
}

/// Failure output, printed to stdout like every other result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorOutput {
    valid: bool,
    reason: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            bottles,
            capacity,
            empty,
            colors,
            jars,
            jar_capacity,
            bags,
            steps,
            random,
            seed,
            retries,
            attempts_per_step,
        } => {
            let config = GameConfig::new(bottles, capacity, empty, colors)
                .with_jars(jars, jar_capacity)
                .with_bags(bags);
            let generator = GeneratorConfig { attempts_per_step };
            run_generate(config, steps, random, seed, retries, &generator)
        }
        Commands::Check {
            file,
            stdin,
            max_states,
            max_depth,
        } => read_state(file, stdin).map(|state| {
            let config = SolverConfig {
                max_states,
                max_depth,
            };
            let result = search(&state, &config);
            let ok = result.verdict != Verdict::Unsolvable;
            (to_json(&result), ok)
        }),
        Commands::Moves { file, stdin } => read_state(file, stdin).map(|state| {
            let output = MovesOutput {
                won: state.is_won(),
                moves: state.enumerate_legal_moves(),
                deadlock: state.analyze_deadlock(),
            };
            (to_json(&output), true)
        }),
        Commands::Pour {
            file,
            stdin,
            from,
            to,
        } => read_state(file, stdin).and_then(|mut state| {
            let before = state.retired_count();
            let moved = state.pour(from, to).map_err(|e| e.to_string())?;
            let retired = (0..state.config().bottles)
                .filter(|&i| state.is_retired(i))
                .collect::<Vec<_>>();
            if retired.len() > before {
                info!(collected = retired.len() - before, "bottles collected");
            }
            let output = PourOutput {
                moved,
                retired,
                won: state.is_won(),
                state: state.snapshot(),
            };
            Ok((to_json(&output), true))
        }),
    };

    match result {
        Ok((json, ok)) => {
            println!("{}", json);
            if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(reason) => {
            let output = ErrorOutput {
                valid: false,
                reason,
            };
            println!("{}", to_json(&output));
            ExitCode::FAILURE
        }
    }
}

fn run_generate(
    config: GameConfig,
    steps: Option<usize>,
    random: bool,
    seed: Option<u64>,
    retries: usize,
    generator: &GeneratorConfig,
) -> Result<(String, bool), String> {
    let mut state = build_solved(&config).map_err(|e| e.to_string())?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mode = if random {
        GenerationMode::PureRandom
    } else {
        GenerationMode::Reverse(steps.unwrap_or_else(|| default_difficulty(&config, &mut rng)))
    };
    info!(?mode, bottles = config.bottles, colors = config.colors, "generating puzzle");

    let mut last_error = None;
    for attempt in 1..=retries.max(1) {
        match state.generate(mode, &mut rng, generator) {
            Ok(report) => {
                // Random fills carry no proof, so attach the search verdict
                let solvability = random.then(|| search(&state, &SolverConfig::default()));
                let output = GenerateOutput {
                    state: state.snapshot(),
                    report,
                    reverse_log: state.reverse_log().to_vec(),
                    note: None,
                    search: solvability,
                };
                return Ok((to_json(&output), true));
            }
            Err(
                err @ GenError::Degenerate {
                    target_steps,
                    attempts,
                },
            ) => {
                warn!(target_steps, attempts, "puzzle degenerated to the solved layout");
                let report = GenerationReport {
                    target_steps: Some(target_steps),
                    attempts,
                    ..Default::default()
                }
                .describe(&state);
                let output = GenerateOutput {
                    state: state.snapshot(),
                    report,
                    reverse_log: Vec::new(),
                    note: Some(err.to_string()),
                    search: None,
                };
                return Ok((to_json(&output), true));
            }
            Err(err @ GenError::Validation(_)) => {
                warn!(attempt, error = %err, "discarding unverified puzzle");
                last_error = Some(err);
            }
        }
    }

    Err(last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "generation failed".to_string()))
}

fn read_state(file: Option<PathBuf>, stdin: bool) -> Result<GameState, String> {
    let json_content = if stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else if let Some(path) = file {
        fs::read_to_string(&path).map_err(|e| format!("Failed to read file {:?}: {}", path, e))?
    } else {
        return Err("Must provide either a file path or --stdin".to_string());
    };

    let snapshot: Snapshot = serde_json::from_str(&json_content)
        .map_err(|e| format!("Error parsing state JSON: {}", e))?;
    GameState::from_snapshot(snapshot).map_err(|e| e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"valid\":false,\"reason\":\"{}\"}}", e))
}
