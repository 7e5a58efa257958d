//! Round-trip validation of reverse logs.
//!
//! Every recorded backward pour must be undone by a forward pour of the same
//! amount, newest first, and the replay must end exactly on the solved
//! layout. Replay runs on a scratch copy and never collects bottles.

use tracing::{debug, trace};

use crate::error::ValidationError;
use crate::puzzle::Move;
use crate::state::GameState;

/// Replay `log` backwards from `scrambled` and compare with `solved`
pub fn validate_round_trip(
    scrambled: &GameState,
    solved: &GameState,
    log: &[Move],
) -> Result<(), ValidationError> {
    let mut replay = scrambled.scratch();
    for (step, mv) in log.iter().enumerate().rev() {
        let moved = replay
            .pour_without_side_effects(mv.to, mv.from)
            .map_err(|reason| ValidationError::ReplayRejected {
                step,
                from: mv.to,
                to: mv.from,
                reason,
            })?;
        if moved != mv.amount {
            return Err(ValidationError::AmountMismatch {
                step,
                expected: mv.amount,
                moved,
            });
        }
        trace!(step, moved, "replayed step");
    }

    if !replay.is_won() {
        return Err(ValidationError::NotSolved);
    }
    if !replay.same_layout(solved) {
        return Err(ValidationError::LayoutMismatch);
    }
    debug!(steps = log.len(), "round trip verified");
    Ok(())
}

impl GameState {
    /// Check the state's own reverse log against the solved layout of its
    /// configuration.
    pub fn validate_reverse_log(&self) -> Result<(), ValidationError> {
        let mut solved = self.scratch();
        solved.reset_to_solved();
        validate_round_trip(self, &solved, &self.reverse_log)
    }
}
