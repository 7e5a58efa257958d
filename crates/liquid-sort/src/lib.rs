//! Liquid sort puzzle library.
//!
//! Puzzles are generated backwards from the solved layout, and every
//! generated puzzle is replayed forward to prove it returns to the solved
//! layout before it is handed out. A bounded forward search gives a
//! solvability signal for states that were not generated that way.

pub mod bags;
pub mod builder;
pub mod error;
pub mod generator;
pub mod pour;
pub mod pruning;
pub mod puzzle;
pub mod solver;
pub mod state;
pub mod validator;

// Re-export main types
pub use bags::{Bags, BAG_SLOTS};
pub use builder::{build_solved, color_pool};
pub use error::{ConfigError, GenError, Rejected, SnapshotError, ValidationError};
pub use generator::{default_difficulty, GenerationMode, GenerationReport, GeneratorConfig};
pub use pour::LegalMove;
pub use pruning::{fast_reject, RejectReason};
pub use puzzle::{Color, Container, GameConfig, Move, Slot, MAX_BOTTLES, MAX_CAPACITY, MAX_JARS};
pub use solver::{is_plausibly_solvable, search, SearchResult, SolverConfig, Verdict};
pub use state::{create_game, DeadlockReport, GameState, Snapshot, TopColorGroup};
pub use validator::validate_round_trip;
