//! Candidate waterfall for listener artwork.
//!
//! Candidate sources are tried strictly in priority order and the first
//! image payload short-circuits the rest - a losing source never costs
//! another network call once a winner exists.

use std::sync::Arc;

use async_trait::async_trait;

use super::queue::DownloadQueue;
use super::{ArtworkError, ImageResult};
use crate::net::Transport;
use crate::sources::domain::ImagePayload;
use crate::sources::musicbrainz::MusicBrainzClient;
use crate::sources::traits::{
    ArtistPhotoApi, CoverArtApi, ImageFetcher, RelationImageApi, StatsApi,
};
use crate::sources::wikidata::WikidataClient;

/// Tuning for candidate generation.
#[derive(Debug, Clone)]
pub struct WaterfallOptions {
    /// How many top artists/releases to consider per request
    pub lookup_limit: usize,
}

/// Resolves one artwork image per request through the source waterfall.
pub struct ArtworkResolver {
    queue: Arc<DownloadQueue>,
    stats: Arc<dyn StatsApi>,
    photos: Arc<dyn ArtistPhotoApi>,
    relations: Arc<dyn RelationImageApi>,
    covers: Arc<dyn CoverArtApi>,
    fetcher: Arc<dyn ImageFetcher>,
    lookup_limit: usize,
}

impl ArtworkResolver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<DownloadQueue>,
        stats: Arc<dyn StatsApi>,
        photos: Arc<dyn ArtistPhotoApi>,
        relations: Arc<dyn RelationImageApi>,
        covers: Arc<dyn CoverArtApi>,
        fetcher: Arc<dyn ImageFetcher>,
        options: WaterfallOptions,
    ) -> Self {
        Self {
            queue,
            stats,
            photos,
            relations,
            covers,
            fetcher,
            lookup_limit: options.lookup_limit.max(1),
        }
    }

    /// Current queue depth (informational, for status reporting).
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Resolve an image for the user's top listening.
    ///
    /// Admission happens before any lookup: a full queue rejects without
    /// a single network call, and a slot-wait timeout gives the queue
    /// position back before returning. Once fetching starts it runs to
    /// completion or upstream failure - there is no request-wide deadline.
    pub async fn fetch_top_artist_image(
        &self,
        username: &str,
    ) -> Result<ImageResult, ArtworkError> {
        let admission = self.queue.admit()?;
        let _permit = self.queue.acquire_slot().await?;

        let payload = self.resolve(username).await?;
        match payload {
            Some(payload) => Ok(ImageResult {
                content_type: payload.content_type,
                bytes: payload.bytes,
                queue_position: admission.ahead(),
            }),
            None => Err(ArtworkError::Unavailable),
        }
    }

    async fn resolve(&self, username: &str) -> Result<Option<ImagePayload>, ArtworkError> {
        let artists = self
            .stats
            .top_artist_refs(username, self.lookup_limit)
            .await?;

        for artist in &artists {
            if let Some(url) = self.photos.photo_url(artist).await
                && let Some(payload) = self.fetcher.fetch_image(&url).await
            {
                tracing::debug!(artist = %artist.name, "artwork from artist photo");
                return Ok(Some(payload));
            }
        }

        for artist in &artists {
            let Some(mbid) = &artist.mbid else {
                continue;
            };
            for url in self.relations.relation_image_urls(mbid).await {
                if let Some(payload) = self.fetcher.fetch_image(&url).await {
                    tracing::debug!(artist = %artist.name, "artwork from relation image");
                    return Ok(Some(payload));
                }
            }
        }

        for candidate in self
            .stats
            .cover_candidates(username, self.lookup_limit)
            .await?
        {
            if let Some(payload) = self.covers.front_cover(&candidate).await {
                tracing::debug!(release = %candidate.release_mbid, "artwork from release cover");
                return Ok(Some(payload));
            }
        }

        Ok(None)
    }
}

/// Production relation-image source: "image" relations from the artist's
/// metadata page, falling back to the entity-claim image reached through
/// the page's cross-referenced identifier.
pub struct RelationImageSource {
    musicbrainz: Arc<MusicBrainzClient>,
    wikidata: Arc<WikidataClient>,
}

impl RelationImageSource {
    pub fn new(musicbrainz: Arc<MusicBrainzClient>, wikidata: Arc<WikidataClient>) -> Self {
        Self { musicbrainz, wikidata }
    }
}

#[async_trait]
impl RelationImageApi for RelationImageSource {
    async fn relation_image_urls(&self, mbid: &str) -> Vec<String> {
        let Some(details) = self.musicbrainz.artist_details(mbid).await else {
            return Vec::new();
        };
        if !details.image_urls.is_empty() {
            return details.image_urls;
        }
        let Some(qid) = details.wikidata_qid else {
            return Vec::new();
        };
        self.wikidata.entity_image_url(&qid).await.into_iter().collect()
    }
}

/// Production binary fetcher over the shared image pool.
pub struct BinaryImageFetcher {
    transport: Arc<dyn Transport>,
}

impl BinaryImageFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ImageFetcher for BinaryImageFetcher {
    async fn fetch_image(&self, url: &str) -> Option<ImagePayload> {
        let response = match self.transport.get(url, &[]).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(url, %error, "image fetch failed");
                return None;
            }
        };
        response
            .into_image()
            .map(|(content_type, bytes)| ImagePayload {
                content_type,
                bytes,
            })
    }
}
