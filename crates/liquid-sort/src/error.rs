//! Error types for puzzle creation, pouring, generation and validation.

use thiserror::Error;

use crate::puzzle::Color;

/// Malformed puzzle parameters. No state is constructed when these occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("total bottles ({bottles}) must be greater than empty bottles ({empty})")]
    NotEnoughBottles { bottles: usize, empty: usize },

    #[error("bottle capacity must be positive")]
    ZeroCapacity,

    #[error("number of colors must be positive")]
    ZeroColors,

    #[error("jar capacity must be positive when jars exist (jar count {jar_count})")]
    ZeroJarCapacity { jar_count: usize },

    #[error("{field} is {value}, the limit is {max}")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("{colors} colors cannot be spread over {filled} filled bottles of capacity {capacity}")]
    TooManyColors {
        colors: usize,
        filled: usize,
        capacity: usize,
    },
}

/// An illegal pour. This is a normal negative result: the state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("cannot pour a container into itself")]
    SameContainer,

    #[error("container index {index} is out of range")]
    InvalidIndex { index: usize },

    #[error("container {index} has been retired")]
    RetiredContainer { index: usize },

    #[error("source container is empty")]
    SourceEmpty,

    #[error("destination container is full")]
    DestinationFull,

    #[error("top colors do not match ({poured} onto {top})")]
    ColorMismatch { poured: Color, top: Color },
}

/// Round-trip replay of a reverse log failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("replay step {step} ({from} -> {to}) was rejected: {reason}")]
    ReplayRejected {
        step: usize,
        from: usize,
        to: usize,
        reason: Rejected,
    },

    #[error("replay step {step} moved {moved} units, expected {expected}")]
    AmountMismatch {
        step: usize,
        expected: usize,
        moved: usize,
    },

    #[error("replayed state is not a won state")]
    NotSolved,

    #[error("replayed state differs from the solved layout")]
    LayoutMismatch,
}

/// Generation outcomes other than a freshly scrambled, validated puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// Not even the first reverse step could be applied. The state is left
    /// in its solved form and the session can continue.
    #[error("no reverse step could be applied in {attempts} attempts ({target_steps} requested); the puzzle is already solved")]
    Degenerate { target_steps: usize, attempts: usize },

    #[error("round-trip validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// A snapshot could not be turned back into a game state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("expected {expected} {kind}, found {found}")]
    ContainerCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{kind} {index} holds {len} units but its capacity is {capacity}")]
    Overfilled {
        kind: &'static str,
        index: usize,
        len: usize,
        capacity: usize,
    },

    #[error("color {color} is outside the {colors} configured colors")]
    UnknownColor { color: Color, colors: usize },

    #[error("retired bottles are only allowed in bag mode")]
    RetiredWithoutBags,

    #[error("bag bound to color {color} outside the {colors} configured colors")]
    UnknownBagColor { color: Color, colors: usize },

    #[error("color {color} is bound to more than one bag")]
    DuplicateBag { color: Color },

    #[error("bags report {found} collected units, retired bottles hold {expected}")]
    CollectedMismatch { expected: usize, found: usize },
}
