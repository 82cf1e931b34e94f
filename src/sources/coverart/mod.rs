//! Cover Art Archive adapter.
//!
//! Fetches release front covers, trying a descending sequence of
//! thumbnail sizes. No API key required, but please respect their rate
//! limits.

mod client;

pub use client::CoverArtClient;
