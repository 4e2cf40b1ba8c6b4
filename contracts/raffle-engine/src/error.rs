use bravo_common::ConfigError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaffleError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("no validated tickets to draw from")]
    EmptyPool,

    #[error("draw {draw_id} is already in progress")]
    SessionInProgress { draw_id: u64 },

    #[error("no transition from {phase} on {input}")]
    InvalidTransition { phase: String, input: String },

    #[error("picked index {index} is outside a pool of {pool_size}")]
    PickOutOfRange { index: usize, pool_size: usize },
}

/// Failures when re-checking a published draw.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("invalid hex: {field}")]
    InvalidHex { field: String },

    #[error("commit pre-image mismatch: commit(seed) != published commit")]
    CommitMismatch,

    #[error("cannot verify a draw over an empty pool")]
    EmptyPool,

    #[error("winner index mismatch: derived {derived}, claimed {claimed}")]
    IndexMismatch { derived: usize, claimed: usize },
}
