//! Error taxonomy for the engine.
//!
//! Signal errors come from degenerate spectrum slices, mode errors from a
//! mode's build or update step, and engine errors from transitions.

use thiserror::Error;

use crate::modes::ModeKind;

/// Degenerate input to the signal mapping utilities
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("band {start}..{end} is empty in a {len}-bin spectrum")]
    EmptyBand { start: usize, end: usize, len: usize },
}

/// Failure while building or updating a visualization mode
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModeError {
    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("scene object {id} is missing or is not a {expected}")]
    MissingObject { id: usize, expected: &'static str },

    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

/// Failure reported by the mode state machine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to build {mode} scene: {source}")]
    Construction {
        mode: ModeKind,
        #[source]
        source: ModeError,
    },

    #[error("no visualization could be built (last error: {0})")]
    NoFallback(ModeError),
}
