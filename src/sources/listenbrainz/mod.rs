//! ListenBrainz statistics adapter.
//!
//! Primary-data tier: errors here propagate to the boundary instead of
//! degrading. All calls go through a TTL cache keyed by endpoint path and
//! sorted query parameters.

mod client;
pub mod dto;

pub use client::{StatsClient, StatsOptions};
