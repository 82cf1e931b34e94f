//! Trait definitions for upstream lookups.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.
//!
//! # Example
//!
//! ```ignore
//! use rewind_fm::sources::traits::RecordingApi;
//!
//! // In production code:
//! async fn lookup<T: RecordingApi>(api: &T, mbid: &str) -> Option<u64> {
//!     api.recording_length(mbid).await
//! }
//!
//! // In tests:
//! struct FixedLengths { ... }
//! impl RecordingApi for FixedLengths { ... }
//! ```

use async_trait::async_trait;

use super::coverart::CoverArtClient;
use super::domain::{ArtistRef, GenreTag, ImagePayload, ReleaseArt, StatsError, TrackPlay};
use super::lastfm::LastFmClient;
use super::listenbrainz::StatsClient;
use super::listenbrainz::dto::ReleaseArtTally;
use super::musicbrainz::MusicBrainzClient;

/// Domain-level view of the statistics service for the resolvers.
#[async_trait]
pub trait StatsApi: Send + Sync {
    /// The user's top artists as domain references.
    async fn top_artist_refs(
        &self,
        username: &str,
        count: usize,
    ) -> Result<Vec<ArtistRef>, StatsError>;

    /// The user's top tracks with play counts.
    async fn track_plays(&self, username: &str, count: usize)
    -> Result<Vec<TrackPlay>, StatsError>;

    /// Ranked cover-art candidates across release and recording stats.
    async fn cover_candidates(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<ReleaseArt>, StatsError>;

    /// Total listens summed over the user's listening activity.
    async fn total_listens(&self, username: &str) -> Result<u64, StatsError>;
}

/// Weighted tag signals for one artist.
#[async_trait]
pub trait TagApi: Send + Sync {
    /// Tag set for the artist; empty when nothing is known.
    async fn artist_tags(&self, artist: &ArtistRef) -> Vec<GenreTag>;
}

/// Artist name to identifier resolution.
#[async_trait]
pub trait ArtistSearchApi: Send + Sync {
    /// Best-match identifier for an artist name.
    async fn search_artist(&self, name: &str) -> Option<String>;
}

/// Recording duration lookup.
#[async_trait]
pub trait RecordingApi: Send + Sync {
    /// Duration in milliseconds, or `None` when unknown.
    async fn recording_length(&self, mbid: &str) -> Option<u64>;
}

/// Artist photo resolution via the tag/image service.
#[async_trait]
pub trait ArtistPhotoApi: Send + Sync {
    /// A fetchable photo URL for the artist, or `None`.
    async fn photo_url(&self, artist: &ArtistRef) -> Option<String>;
}

/// Relation-derived artist image candidates.
#[async_trait]
pub trait RelationImageApi: Send + Sync {
    /// Fetchable image URLs discovered via the artist's metadata page.
    async fn relation_image_urls(&self, mbid: &str) -> Vec<String>;
}

/// Binary image download.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch `url` and return its payload when it is an image.
    async fn fetch_image(&self, url: &str) -> Option<ImagePayload>;
}

/// Release cover lookup.
#[async_trait]
pub trait CoverArtApi: Send + Sync {
    /// The release's front cover, or `None` when the archive has none.
    async fn front_cover(&self, art: &ReleaseArt) -> Option<ImagePayload>;
}

// Implement traits for real clients

#[async_trait]
impl StatsApi for StatsClient {
    async fn top_artist_refs(
        &self,
        username: &str,
        count: usize,
    ) -> Result<Vec<ArtistRef>, StatsError> {
        let artists = self.top_artists(username, count).await?;
        Ok(artists.iter().filter_map(|entry| entry.artist_ref()).collect())
    }

    async fn track_plays(
        &self,
        username: &str,
        count: usize,
    ) -> Result<Vec<TrackPlay>, StatsError> {
        let recordings = self.top_recordings(username, count).await?;
        Ok(recordings.iter().map(|entry| entry.track_play()).collect())
    }

    async fn cover_candidates(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<ReleaseArt>, StatsError> {
        let mut tally = ReleaseArtTally::default();
        for release in self.top_releases(username, limit).await? {
            tally.add(
                release.caa_release_mbid.as_deref(),
                release.caa_release_mbid.as_deref(),
                release.plays(),
            );
            tally.add(
                release.release_mbid.as_deref(),
                release.caa_release_mbid.as_deref(),
                release.plays(),
            );
        }
        for recording in self.top_recordings(username, limit).await? {
            tally.add(
                recording.caa_release_mbid.as_deref(),
                recording.caa_release_mbid.as_deref(),
                recording.plays(),
            );
            tally.add(
                recording.release_mbid.as_deref(),
                recording.caa_release_mbid.as_deref(),
                recording.plays(),
            );
        }
        Ok(tally.ranked(limit))
    }

    async fn total_listens(&self, username: &str) -> Result<u64, StatsError> {
        let activity = self.listening_activity(username).await?;
        Ok(activity.iter().map(|bucket| bucket.plays()).sum())
    }
}

#[async_trait]
impl ArtistSearchApi for MusicBrainzClient {
    async fn search_artist(&self, name: &str) -> Option<String> {
        MusicBrainzClient::search_artist(self, name).await
    }
}

#[async_trait]
impl RecordingApi for MusicBrainzClient {
    async fn recording_length(&self, mbid: &str) -> Option<u64> {
        MusicBrainzClient::recording_length(self, mbid).await
    }
}

#[async_trait]
impl ArtistPhotoApi for LastFmClient {
    async fn photo_url(&self, artist: &ArtistRef) -> Option<String> {
        self.artist_photo_url(artist).await
    }
}

#[async_trait]
impl CoverArtApi for CoverArtClient {
    async fn front_cover(&self, art: &ReleaseArt) -> Option<ImagePayload> {
        CoverArtClient::front_cover(self, art).await
    }
}
