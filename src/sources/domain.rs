//! Internal domain models for listener statistics and artwork resolution.
//!
//! These types are OUR types - they don't change when external APIs change.
//! All external API responses get converted into these types by the
//! per-upstream clients.

use crate::net::NetError;

/// An artist referenced by listener statistics.
///
/// The identifier is the first non-empty MusicBrainz ID the statistics
/// payload offered (primary id, then the alternates list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    /// Display name
    pub name: String,
    /// MusicBrainz artist ID, when the statistics service knew one
    pub mbid: Option<String>,
}

/// A normalized genre/tag signal for one artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreTag {
    /// Lowercased, trimmed tag name
    pub name: String,
    /// Vote count reported by the upstream, or 1 when absent
    pub weight: u64,
}

impl GenreTag {
    /// Normalize a raw upstream tag. Returns `None` for blank names.
    pub fn normalized(name: &str, count: Option<u64>) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            weight: count.filter(|count| *count > 0).unwrap_or(1),
        })
    }
}

/// Downloaded image bytes plus their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A release whose cover art may be fetchable, ranked for lookup order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArt {
    /// MusicBrainz release ID
    pub release_mbid: String,
    /// Cover Art Archive release ID, when the statistics payload carried
    /// one (preferred for cover lookups)
    pub caa_release_mbid: Option<String>,
    /// Highest listen count observed for this release across release and
    /// recording statistics; orders cover lookups, never shown to users
    pub weight: u64,
}

/// A track entry used by the duration estimator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPlay {
    pub name: String,
    pub recording_mbid: Option<String>,
    pub listen_count: u64,
}

/// Errors from the statistics upstream (primary data - always surfaced).
#[derive(Debug, Clone, thiserror::Error)]
pub enum StatsError {
    /// The user (or resource) does not exist upstream
    #[error("listener not found")]
    NotFound,

    /// The upstream answered with a server-class status
    #[error("statistics service unavailable")]
    Unavailable,

    /// The upstream answered with something that is not a statistics
    /// payload; carries a short diagnostic excerpt
    #[error("bad statistics response: {0}")]
    BadResponse(String),

    /// Any other non-success status
    #[error("statistics request failed with status {0}")]
    RequestFailed(u16),

    /// The retry budget ran out without a response
    #[error("statistics service unreachable: {0}")]
    Unreachable(String),
}

impl From<NetError> for StatsError {
    fn from(error: NetError) -> Self {
        Self::Unreachable(error.to_string())
    }
}
