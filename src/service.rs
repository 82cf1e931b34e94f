//! Boundary facade - wires clients, caches and resolvers together.
//!
//! This is the surface the presentation layer talks to:
//! top artists/tracks/albums, genre, listen minutes and artwork. All
//! shared state (connection pools, caches, the download queue) is owned
//! here and injected into the components that need it - there are no
//! process-wide singletons.

use std::sync::Arc;
use std::time::Duration;

use crate::artwork::{
    ArtworkResolver, BinaryImageFetcher, DownloadQueue, ImageResult, QueueOptions,
    RelationImageSource, WaterfallOptions,
};
use crate::config::Config;
use crate::error::Result;
use crate::genre::{GenreResolver, TagSource};
use crate::listen_time::{ListenTimeEstimator, ListenTimeOptions};
use crate::net::{Transport, UpstreamClient, UpstreamOptions};
use crate::sources::coverart::CoverArtClient;
use crate::sources::lastfm::LastFmClient;
use crate::sources::listenbrainz::{StatsClient, StatsOptions};
use crate::sources::musicbrainz::MusicBrainzClient;
use crate::sources::wikidata::WikidataClient;

/// Accept header for the binary image pool.
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";

/// High-level service over all upstream aggregation.
pub struct RewindService {
    stats: Arc<StatsClient>,
    genre: GenreResolver,
    artwork: ArtworkResolver,
    listen_time: ListenTimeEstimator,
}

impl RewindService {
    /// Build the full service from configuration. Each upstream gets its
    /// own connection pool, initialized once and reused for every call.
    pub fn new(config: &Config) -> Self {
        let timeout = Duration::from_secs(config.http.timeout_secs);
        let json_options = UpstreamOptions {
            attempts: config.http.attempts,
            ..UpstreamOptions::json_api(config.upstreams.user_agent.clone(), timeout)
        };

        let stats: Arc<StatsClient> = Arc::new(StatsClient::new(
            Arc::new(UpstreamClient::new(
                config.upstreams.listenbrainz_url.clone(),
                &json_options,
            )),
            StatsOptions {
                primary_range: config.stats.range.clone(),
                cache_ttl: Duration::from_secs(config.stats.cache_ttl_secs),
                cache_capacity: config.stats.cache_capacity,
                max_top_results: config.stats.max_top_results,
            },
        ));
        let musicbrainz = Arc::new(MusicBrainzClient::new(Arc::new(UpstreamClient::new(
            config.upstreams.musicbrainz_url.clone(),
            &json_options,
        ))));
        let lastfm = Arc::new(LastFmClient::new(
            Arc::new(UpstreamClient::new(
                config.upstreams.lastfm_url.clone(),
                &json_options,
            )),
            config.upstreams.lastfm_api_key.clone(),
        ));
        let wikidata = Arc::new(WikidataClient::new(Arc::new(UpstreamClient::new(
            config.upstreams.wikidata_url.clone(),
            &json_options,
        ))));
        let coverart = Arc::new(CoverArtClient::new(Arc::new(UpstreamClient::new(
            config.upstreams.coverart_url.clone(),
            &UpstreamOptions {
                accept: None,
                follow_redirects: false,
                ..json_options.clone()
            },
        ))));
        let image_pool: Arc<dyn Transport> = Arc::new(UpstreamClient::new(
            String::new(),
            &UpstreamOptions {
                accept: Some(IMAGE_ACCEPT.to_string()),
                ..json_options.clone()
            },
        ));

        let genre = GenreResolver::new(
            stats.clone(),
            Arc::new(TagSource::new(lastfm.clone(), musicbrainz.clone())),
            musicbrainz.clone(),
        );

        let queue = Arc::new(DownloadQueue::new(QueueOptions {
            queue_limit: config.artwork.queue_limit,
            concurrency: config.artwork.concurrency,
            slot_timeout: Duration::from_secs(config.artwork.queue_timeout_secs),
        }));
        let artwork = ArtworkResolver::new(
            queue,
            stats.clone(),
            lastfm,
            Arc::new(RelationImageSource::new(musicbrainz.clone(), wikidata)),
            coverart,
            Arc::new(BinaryImageFetcher::new(image_pool)),
            WaterfallOptions {
                lookup_limit: config.artwork.lookup_limit,
            },
        );

        let listen_time = ListenTimeEstimator::new(
            stats.clone(),
            musicbrainz,
            ListenTimeOptions {
                sample_limit: config.stats.average_sample_limit,
                default_average_minutes: config.stats.average_track_minutes,
            },
        );

        Self {
            stats,
            genre,
            artwork,
            listen_time,
        }
    }

    /// The user's top artist names, count clamped to the configured cap.
    pub async fn top_artists(&self, username: &str, count: usize) -> Result<Vec<String>> {
        let count = self.stats.clamp_count(count);
        let artists = self.stats.top_artists(username, count).await?;
        Ok(artists
            .into_iter()
            .map(|entry| {
                entry
                    .artist_name
                    .unwrap_or_else(|| "Unknown artist".to_string())
            })
            .collect())
    }

    /// The user's top track names.
    pub async fn top_tracks(&self, username: &str, count: usize) -> Result<Vec<String>> {
        let count = self.stats.clamp_count(count);
        let tracks = self.stats.top_recordings(username, count).await?;
        Ok(tracks
            .into_iter()
            .map(|entry| {
                entry
                    .track_name
                    .unwrap_or_else(|| "Unknown track".to_string())
            })
            .collect())
    }

    /// The user's top release names.
    pub async fn top_albums(&self, username: &str, count: usize) -> Result<Vec<String>> {
        let count = self.stats.clamp_count(count);
        let releases = self.stats.top_releases(username, count).await?;
        Ok(releases
            .into_iter()
            .map(|entry| {
                entry
                    .release_name
                    .unwrap_or_else(|| "Unknown release".to_string())
            })
            .collect())
    }

    /// Dominant genre across the user's top artists.
    pub async fn top_genre(&self, username: &str) -> Result<String> {
        Ok(self.genre.top_genre(username).await?)
    }

    /// Genre for a single artist by name.
    pub async fn genre_for_artist(&self, name: &str) -> String {
        self.genre.genre_for_artist(name).await
    }

    /// Estimated listen minutes, comma-grouped ("0" when none).
    pub async fn estimate_listen_minutes(&self, username: &str) -> Result<String> {
        Ok(self.listen_time.estimate_listen_minutes(username).await?)
    }

    /// Average sampled track length in minutes, when known.
    pub async fn average_track_minutes(&self, username: &str) -> Result<Option<f64>> {
        Ok(self.listen_time.average_track_minutes(username).await?)
    }

    /// Artwork for the user's top listening, through the queue/waterfall.
    pub async fn fetch_artist_image(&self, username: &str) -> Result<ImageResult> {
        Ok(self.artwork.fetch_top_artist_image(username).await?)
    }

    /// Current artwork queue depth.
    pub fn image_queue_depth(&self) -> usize {
        self.artwork.queue_depth()
    }
}
