//! # Orchestra Core Errors
//!
//! Crate-level error type for code that drives a [`Stage`](crate::Stage)
//! through its whole lifecycle and wants a single error to propagate with `?`.
//!
//! The phase-specific errors live next to the stage in
//! [`stage::error`](crate::stage::error); this enum only wraps them.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::stage::error::{PlayError, SetupError};

#[derive(Debug, ThisError)]
pub enum Error {
    /// A player failed during the setup phase; the stage was rolled back.
    #[error("Stage setup failed: {0}")]
    Setup(#[from] SetupError),

    /// One or more players failed during the play phase.
    #[error("Stage play failed: {0}")]
    Play(#[from] PlayError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
