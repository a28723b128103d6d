//! Errors surfaced by a solve.
//!
//! Malformed constraint systems (double assignment, several unknown wires in
//! one constraint, division by the zero coefficient) are not errors: the
//! solver panics on them.

use std::fmt;

use crate::constraint::HintId;

/// Error returned by a hint implementation.
pub type HintError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error(
        "invalid witness size, got {got}, expected {expected} = {public} (public) + {secret} (secret)"
    )]
    WitnessSize {
        got: usize,
        expected: usize,
        public: usize,
        secret: usize,
    },
    #[error("solver missing hint(s): {}", .0.join(", "))]
    MissingHints(Vec<String>),
    #[error(transparent)]
    Unsatisfied(#[from] UnsatisfiedConstraintError),
    #[error("hint {name} ({id}) failed: {source}")]
    HintExecution {
        id: HintId,
        name: String,
        source: HintError,
    },
    #[error("missing hint function {0}")]
    MissingHintFunction(HintId),
    #[error("solver didn't assign a value to all wires ({solved} of {total})")]
    IncompleteAssignment { solved: usize, total: usize },
    #[error("could not start solver workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A constraint that does not hold under the current assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatisfiedConstraintError {
    /// Constraint id
    pub constraint: usize,
    /// Raw operands of the failed check
    pub reason: String,
    /// Resolved debug trace, when the constraint carries one
    pub debug_info: Option<String>,
}

impl fmt::Display for UnsatisfiedConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.debug_info {
            Some(info) => write!(f, "constraint #{} is not satisfied: {}", self.constraint, info),
            None => write!(
                f,
                "constraint #{} is not satisfied: {}",
                self.constraint, self.reason
            ),
        }
    }
}

impl std::error::Error for UnsatisfiedConstraintError {}
