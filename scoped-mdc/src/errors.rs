//! Error types for scoped diagnostic context.
//!
//! Failures of the wrapped unit of work are never represented here: they
//! pass through the scope untouched. These errors cover misuse of the
//! context stacks and configuration loading.

use thiserror::Error;

/// The main error type for scoped-mdc operations.
#[derive(Debug, Error)]
pub enum MdcError {
    /// A key was popped more times than it was pushed.
    #[error("Unbalanced pop: no context value pushed for key '{key}'")]
    UnbalancedPop {
        /// The key whose stack was already empty.
        key: String,
    },

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MdcError {
    /// Creates an unbalanced pop error for a key.
    #[must_use]
    pub fn unbalanced_pop(key: impl Into<String>) -> Self {
        Self::UnbalancedPop { key: key.into() }
    }

    /// Returns true if this error signals a broken push/pop pairing.
    #[must_use]
    pub const fn is_unbalanced_pop(&self) -> bool {
        matches!(self, Self::UnbalancedPop { .. })
    }
}

/// Result type for scoped-mdc operations.
pub type MdcResult<T> = Result<T, MdcError>;
