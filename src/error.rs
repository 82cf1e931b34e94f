//! Application-wide error types.
//!
//! This module provides a unified error hierarchy for the application.
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum, aggregating the typed
//!   errors of each subsystem
//! - Subsystem errors (e.g. [`StatsError`], [`ArtworkError`]) stay close to
//!   the code that produces them and convert automatically
//! - The presentation layer maps variants to its own status codes; nothing
//!   in this crate knows about HTTP response codes

use crate::artwork::{ArtworkError, StoreError};
use crate::sources::domain::StatsError;
use crate::verify::VerifyError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Statistics upstream error (primary data - always surfaced)
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Artwork resolution error
    #[error("Artwork error: {0}")]
    Artwork(#[from] ArtworkError),

    /// Temporary artwork store error
    #[error("Artwork store error: {0}")]
    Store(#[from] StoreError),

    /// Human-verification gate error
    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
