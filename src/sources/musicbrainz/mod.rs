//! MusicBrainz metadata/relations adapter.
//!
//! Best-effort tier: artist details (tags, genres, url relations), artist
//! search, and recording lengths. Any upstream problem degrades to
//! `None`/empty rather than propagating - genre and image resolution are
//! best-effort by design.

mod adapter;
mod client;
pub mod dto;

pub use adapter::normalize_image_resource;
pub(crate) use adapter::commons_image_url;
pub use client::{ArtistDetails, MusicBrainzClient};
