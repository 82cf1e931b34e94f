//! Last.fm tag/image adapter.
//!
//! Best-effort tier: artist photos, album art and folksonomy tags via the
//! keyed audioscrobbler API. An unconfigured API key simply yields empty
//! results; so does any upstream error.

mod client;
pub mod dto;

pub use client::LastFmClient;
