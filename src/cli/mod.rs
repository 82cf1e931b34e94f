//! Command-line interface for rewind-fm.
//!
//! This module provides CLI commands that exercise the service boundary:
//! top lists, genre resolution, listen-time estimation and artwork
//! fetching, plus the wrapped counter and config bootstrapping.

mod commands;

pub use commands::{Cli, Commands, run_command};
