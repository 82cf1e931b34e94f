//! Artwork resolution - unified interface for fetching listener artwork.
//!
//! Resolves an image for a user from multiple sources with fixed priority:
//! 1. Artist photo from the tag/image service (album art fallback within it)
//! 2. Artist image via metadata-page relations (entity-claim fallback)
//! 3. Release cover art, ranked by listen count, sizes descending
//!
//! # Design
//!
//! Every request passes admission control first: a queue-depth check
//! (reject fast with [`ArtworkError::QueueFull`]) and then a bounded
//! download-slot wait (reject with [`ArtworkError::QueueBusy`] on
//! timeout). Slots and queue positions are released on every exit path.
//! Image bytes are never cached - per-identifier lookups are memoized by
//! the source clients, but the final binary fetch always happens fresh.

mod queue;
mod store;
mod waterfall;

pub use queue::{Admission, DownloadQueue, QueueOptions};
pub use store::{ArtworkStore, StoreError, StoreOptions};
pub use waterfall::{ArtworkResolver, BinaryImageFetcher, RelationImageSource, WaterfallOptions};

use crate::sources::domain::StatsError;

/// A resolved image, returned once per request.
#[derive(Debug, Clone)]
pub struct ImageResult {
    /// Image MIME type as reported by the winning source
    pub content_type: String,
    /// Image bytes
    pub bytes: Vec<u8>,
    /// Requests ahead of this one at admission time (informational)
    pub queue_position: usize,
}

/// Artwork resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArtworkError {
    /// The download queue is at capacity; try again shortly
    #[error("image queue is full")]
    QueueFull,

    /// No download slot freed up within the wait budget
    #[error("image queue is busy")]
    QueueBusy,

    /// Every candidate source came up empty
    #[error("artwork unavailable")]
    Unavailable,

    /// The statistics lookup feeding candidate generation failed
    #[error(transparent)]
    Stats(#[from] StatsError),
}
