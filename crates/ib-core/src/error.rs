//! # AppError
//!
//! Centralized error handling for the ita-board ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all ib-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Thread referenced by a legacy export)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., body too long, denylisted content)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Anti-forgery failure (missing or invalid double-submit token)
    #[error("csrf rejected: {0}")]
    CsrfError(String),

    /// Rate ceiling exceeded for a client address
    #[error("too many requests: {0}")]
    RateLimitExceeded(String),

    /// The hosted datastore call failed (network, non-2xx, bad payload)
    #[error("upstream datastore error: {0}")]
    Upstream(String),
}

/// A specialized Result type for ita-board logic.
pub type Result<T> = std::result::Result<T, AppError>;
