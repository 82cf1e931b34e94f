//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits
//! aggressively. A 503 gets exactly one extra attempt after a fixed
//! delay; after that the lookup gives up silently. Callers treat `None`
//! as "unknown" - this whole adapter is best-effort.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use super::{adapter, dto};
use crate::cache::LruMap;
use crate::net::Transport;
use crate::sources::domain::GenreTag;

/// Artist detail cache entries kept per process.
const DETAIL_CACHE_ENTRIES: usize = 256;

/// Recording length cache entries kept per process.
const LENGTH_CACHE_ENTRIES: usize = 512;

/// Wait before the single extra attempt after a 503.
const RATE_LIMIT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Everything we keep from one artist page: normalized tag signals plus
/// pre-extracted image material.
#[derive(Debug, Clone, Default)]
pub struct ArtistDetails {
    /// Weighted genre votes
    pub genres: Vec<GenreTag>,
    /// Weighted folksonomy tags
    pub tags: Vec<GenreTag>,
    /// Fetchable image URLs from "image" url relations, in page order
    pub image_urls: Vec<String>,
    /// Wikidata QID from a "wikidata" url relation
    pub wikidata_qid: Option<String>,
}

/// MusicBrainz API client with per-identifier memoization.
pub struct MusicBrainzClient {
    transport: Arc<dyn Transport>,
    details: Mutex<LruMap<String, Option<ArtistDetails>>>,
    lengths: Mutex<LruMap<String, Option<u64>>>,
    retry_delay: Duration,
}

impl MusicBrainzClient {
    /// Create a new client over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            details: Mutex::new(LruMap::new(DETAIL_CACHE_ENTRIES)),
            lengths: Mutex::new(LruMap::new(LENGTH_CACHE_ENTRIES)),
            retry_delay: RATE_LIMIT_RETRY_DELAY,
        }
    }

    /// Create a client whose 503 retry does not sleep (for tests).
    #[cfg(test)]
    pub fn without_retry_delay(transport: Arc<dyn Transport>) -> Self {
        Self {
            retry_delay: Duration::ZERO,
            ..Self::new(transport)
        }
    }

    /// Fetch tags, genres and relation-derived image material for an
    /// artist, memoized per MBID for the process lifetime (including
    /// failed lookups - the page is not going to appear mid-process).
    pub async fn artist_details(&self, mbid: &str) -> Option<ArtistDetails> {
        if mbid.is_empty() {
            return None;
        }
        if let Some(cached) = self.details.lock().get(&mbid.to_string()) {
            return cached;
        }

        let response: Option<dto::ArtistDetailResponse> = self
            .get_json(
                &format!("/artist/{mbid}"),
                &[
                    ("fmt", "json".to_string()),
                    ("inc", "tags+genres+url-rels".to_string()),
                ],
            )
            .await;
        let details = response.map(|response| ArtistDetails {
            genres: adapter::normalize_tags(&response.genres),
            tags: adapter::normalize_tags(&response.tags),
            image_urls: adapter::image_relation_urls(&response.relations),
            wikidata_qid: adapter::wikidata_qid(&response.relations),
        });

        self.details.lock().insert(mbid.to_string(), details.clone());
        details
    }

    /// Find an artist MBID by name, best match only.
    pub async fn search_artist(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        let response: dto::ArtistSearchResponse = self
            .get_json(
                "/artist/",
                &[
                    ("fmt", "json".to_string()),
                    ("limit", "1".to_string()),
                    ("query", format!("artist:\"{name}\"")),
                ],
            )
            .await?;
        response
            .artists
            .first()
            .and_then(|hit| hit.id.clone())
            .filter(|id| !id.is_empty())
    }

    /// Look up a recording's length in milliseconds, memoized per MBID.
    /// Zero-length recordings count as unknown.
    pub async fn recording_length(&self, mbid: &str) -> Option<u64> {
        if mbid.is_empty() {
            return None;
        }
        if let Some(cached) = self.lengths.lock().get(&mbid.to_string()) {
            return cached;
        }

        let response: Option<dto::RecordingResponse> = self
            .get_json(&format!("/recording/{mbid}"), &[("fmt", "json".to_string())])
            .await;
        let length = response
            .and_then(|response| response.length)
            .filter(|length| *length > 0);

        self.lengths.lock().insert(mbid.to_string(), length);
        length
    }

    /// GET and decode a JSON document, degrading to `None` on any failure.
    /// A 503 (rate limiting) gets exactly one extra attempt after a delay.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Option<T> {
        let mut response = match self.transport.get(path, params).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(path, %error, "musicbrainz request failed");
                return None;
            }
        };

        if response.status.as_u16() == 503 {
            tokio::time::sleep(self.retry_delay).await;
            response = match self.transport.get(path, params).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(path, %error, "musicbrainz retry failed");
                    return None;
                }
            };
        }

        if !response.is_success() {
            tracing::debug!(path, status = response.status.as_u16(), "musicbrainz lookup skipped");
            return None;
        }
        serde_json::from_slice(&response.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::traits::mocks::{MockTransport, json_response};

    const DETAIL_BODY: &str = r#"{
        "name": "Radiohead",
        "genres": [{"name": "art rock", "count": 7}],
        "tags": [{"name": "rock", "count": 15}],
        "relations": [
            {"type": "wikidata", "url": {"resource": "https://www.wikidata.org/wiki/Q10811"}},
            {"type": "image", "url": {"resource": "https://example.com/band.jpg"}}
        ]
    }"#;

    #[tokio::test]
    async fn test_artist_details_normalizes_and_memoizes() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(
            200,
            DETAIL_BODY,
        )]));
        let client = MusicBrainzClient::new(transport.clone());

        let details = client.artist_details("mbid-1").await.unwrap();
        assert_eq!(details.genres[0].name, "art rock");
        assert_eq!(details.wikidata_qid.as_deref(), Some("Q10811"));
        assert_eq!(details.image_urls, vec!["https://example.com/band.jpg".to_string()]);

        // Second lookup is served from the memo cache.
        let again = client.artist_details("mbid-1").await.unwrap();
        assert_eq!(again.genres.len(), 1);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_lookup_retries_exactly_once() {
        let transport = Arc::new(MockTransport::returning(vec![
            json_response(503, ""),
            json_response(200, r#"{"length": 215000}"#),
        ]));
        let client = MusicBrainzClient::without_retry_delay(transport.clone());

        assert_eq!(client.recording_length("rec-1").await, Some(215000));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_gives_up_silently() {
        let transport = Arc::new(MockTransport::returning(vec![
            json_response(503, ""),
            json_response(503, ""),
        ]));
        let client = MusicBrainzClient::without_retry_delay(transport.clone());

        assert_eq!(client.recording_length("rec-1").await, None);
        assert_eq!(transport.calls().len(), 2, "only one extra attempt after a 503");
    }

    #[tokio::test]
    async fn test_recording_length_memoizes_missing_results() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(404, "")]));
        let client = MusicBrainzClient::new(transport.clone());

        assert_eq!(client.recording_length("rec-unknown").await, None);
        assert_eq!(client.recording_length("rec-unknown").await, None);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_length_counts_as_unknown() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(
            200,
            r#"{"length": 0}"#,
        )]));
        let client = MusicBrainzClient::new(transport);
        assert_eq!(client.recording_length("rec-0").await, None);
    }

    #[tokio::test]
    async fn test_search_artist_returns_first_hit() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(
            200,
            r#"{"artists": [{"id": "mbid-9"}, {"id": "mbid-10"}]}"#,
        )]));
        let client = MusicBrainzClient::new(transport.clone());

        assert_eq!(client.search_artist("Plaid").await.as_deref(), Some("mbid-9"));
        let calls = transport.calls();
        assert_eq!(calls[0].0, "/artist/");
        assert!(
            calls[0]
                .1
                .iter()
                .any(|(name, value)| name == "query" && value == "artist:\"Plaid\"")
        );
    }

    #[tokio::test]
    async fn test_empty_inputs_short_circuit() {
        let transport = Arc::new(MockTransport::returning(vec![]));
        let client = MusicBrainzClient::new(transport.clone());

        assert!(client.artist_details("").await.is_none());
        assert!(client.search_artist("").await.is_none());
        assert!(client.recording_length("").await.is_none());
        assert!(transport.calls().is_empty());
    }
}
