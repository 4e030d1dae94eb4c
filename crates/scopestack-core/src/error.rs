//! Error types.

use thiserror::Error;

pub type StackResult<T> = Result<T, StackError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("Stack allocation failed: requested {requested} bytes, available {available}")]
    OutOfSpace { requested: usize, available: usize },

    #[error("Alignment error: {align} is not a power of two")]
    InvalidAlignment { align: usize },

    #[error("Size overflow: {count} elements of {elem_size} bytes")]
    SizeOverflow { count: usize, elem_size: usize },

    #[error("Pointer does not refer to a live block of this stack")]
    ForeignPointer,

    #[error("Copy of {copy} bytes exceeds block of {limit} bytes")]
    CopyOverrun { copy: usize, limit: usize },

    #[error("Stack handle used after its arena was shut down or rebound")]
    StaleHandle,

    #[error("Rewind target {target} is above the bump offset {current}")]
    RewindForward { target: usize, current: usize },

    #[error("Invalid capacity")]
    InvalidCapacity,

    #[error("Backing allocation of {capacity} bytes failed")]
    AllocFailed { capacity: usize },

    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    #[error("A stack is already installed on this thread")]
    AlreadyInstalled,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for StackError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StackError::LockPoisoned(e.to_string())
    }
}

impl StackError {
    /// Returns true for the one expected failure: the arena ran out of room.
    pub fn is_out_of_space(&self) -> bool {
        matches!(self, StackError::OutOfSpace { .. })
    }

    pub fn config(msg: impl Into<String>) -> Self {
        StackError::Config(msg.into())
    }
}
