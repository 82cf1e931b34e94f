//! Rewind.fm - listening statistics and artwork aggregation.
//!
//! Aggregates per-user listening statistics, genre signals and artwork
//! from several independent, unreliable music-metadata services and
//! returns normalized results to a presentation layer.
//!
//! # Architecture
//!
//! - [`net`] - resilient outbound request layer shared by every upstream
//! - [`cache`] - TTL and LRU caches backing statistics and memoized lookups
//! - [`sources`] - per-upstream adapters normalizing heterogeneous JSON
//!   into typed records
//! - [`genre`] - popularity-weighted multi-source genre resolution
//! - [`artwork`] - image waterfall behind admission-controlled downloads,
//!   plus the temporary upload store
//! - [`listen_time`] - parallel track-duration estimation
//! - [`service`] - the boundary facade a routing layer calls
//! - [`metrics`], [`ratelimit`], [`verify`] - collaborator objects the
//!   routing layer composes around its handlers
//!
//! The CLI in [`cli`] drives the same boundary a request-routing layer
//! would.

pub mod artwork;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod genre;
pub mod listen_time;
pub mod metrics;
pub mod net;
pub mod ratelimit;
pub mod service;
pub mod sources;
pub mod verify;

pub use error::{Error, Result};
