//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum ArmDqnError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The dimension of a state does not match the input of the network.
    #[error("State dimension mismatch: expected {expected}, got {got}")]
    StateDimMismatch {
        /// Dimension expected by the network.
        expected: usize,
        /// Dimension of the given state.
        got: usize,
    },

    /// An action index out of the action space.
    #[error("Action {action} is out of range for {n_actions} actions")]
    InvalidAction {
        /// The given action index.
        action: usize,
        /// The number of discrete actions.
        n_actions: usize,
    },
}
