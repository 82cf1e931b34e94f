//! Last.fm HTTP client
//!
//! The audioscrobbler API is one endpoint with a `method` parameter and
//! an API key. Error conditions come back as 200s with an error code in
//! the body, so the envelope is checked before the typed payload is used.
//!
//! Known quirk: artists without real photos get a placeholder image whose
//! URL embeds a well-known hash; those are filtered out, otherwise every
//! artist would "have" the same grey star.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::dto;
use crate::cache::LruMap;
use crate::net::Transport;
use crate::sources::domain::{ArtistRef, GenreTag};

/// Placeholder image hashes served for artists without real photos.
const PLACEHOLDER_HASHES: [&str; 1] = ["2a96cbd8b46e442fc41c2b86b821562f"];

/// How many tags to keep from a toptags response.
const MAX_TAG_RESULTS: usize = 25;

/// How many top albums to scan for a usable album image.
const TOP_ALBUM_LIMIT: usize = 5;

/// Artist photo URL cache entries kept per process.
const PHOTO_CACHE_ENTRIES: usize = 256;

/// Last.fm API client. Without an API key every lookup is empty.
pub struct LastFmClient {
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    photo_urls: Mutex<LruMap<String, Option<String>>>,
}

impl LastFmClient {
    /// Create a new client; `api_key` of `None` disables the upstream.
    pub fn new(transport: Arc<dyn Transport>, api_key: Option<String>) -> Self {
        Self {
            transport,
            api_key: api_key.filter(|key| !key.is_empty()),
            photo_urls: Mutex::new(LruMap::new(PHOTO_CACHE_ENTRIES)),
        }
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Weighted folksonomy tags for an artist, normalized and capped.
    pub async fn top_tags(&self, artist: &ArtistRef) -> Vec<GenreTag> {
        let Some(response): Option<dto::TopTagsResponse> =
            self.call("artist.gettoptags", artist, &[]).await
        else {
            return Vec::new();
        };
        let mut tags: Vec<GenreTag> = Vec::new();
        for entry in response
            .toptags
            .map(|toptags| toptags.tag)
            .unwrap_or_default()
            .iter()
            .take(MAX_TAG_RESULTS)
        {
            let Some(tag) = entry
                .name
                .as_deref()
                .and_then(|name| GenreTag::normalized(name, entry.weight()))
            else {
                continue;
            };
            // Deduplicate per artist, keeping the heavier vote.
            if let Some(existing) = tags.iter_mut().find(|existing| existing.name == tag.name) {
                existing.weight = existing.weight.max(tag.weight);
            } else {
                tags.push(tag);
            }
        }
        tags
    }

    /// Best artist photo URL: the artist page image, falling back to the
    /// artwork of a top album. Memoized per artist.
    pub async fn artist_photo_url(&self, artist: &ArtistRef) -> Option<String> {
        let cache_key = format!(
            "{}|{}",
            artist.name.to_lowercase(),
            artist.mbid.as_deref().unwrap_or("")
        );
        if let Some(cached) = self.photo_urls.lock().get(&cache_key) {
            return cached;
        }

        let url = self.resolve_photo_url(artist).await;
        self.photo_urls.lock().insert(cache_key, url.clone());
        url
    }

    async fn resolve_photo_url(&self, artist: &ArtistRef) -> Option<String> {
        let info: Option<dto::ArtistInfoResponse> = self.call("artist.getinfo", artist, &[]).await;
        if let Some(url) = info
            .and_then(|response| response.artist)
            .and_then(|artist| select_image(&artist.image))
        {
            return Some(url);
        }

        let albums: dto::TopAlbumsResponse = self
            .call(
                "artist.gettopalbums",
                artist,
                &[("limit", TOP_ALBUM_LIMIT.to_string())],
            )
            .await?;
        albums
            .topalbums
            .map(|topalbums| topalbums.album)
            .unwrap_or_default()
            .iter()
            .find_map(|album| select_image(&album.image))
    }

    /// Call one API method for an artist, degrading to `None` on any
    /// failure (missing key, transport error, error envelope, bad JSON).
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        artist: &ArtistRef,
        extra: &[(&str, String)],
    ) -> Option<T> {
        let api_key = self.api_key.as_ref()?;
        if artist.name.is_empty() {
            return None;
        }

        let mut params = vec![
            ("method", method.to_string()),
            ("api_key", api_key.clone()),
            ("format", "json".to_string()),
            ("autocorrect", "1".to_string()),
            ("artist", artist.name.clone()),
        ];
        if let Some(mbid) = artist.mbid.as_ref().filter(|mbid| !mbid.is_empty()) {
            params.push(("mbid", mbid.clone()));
        }
        params.extend(extra.iter().map(|(name, value)| (*name, value.clone())));

        let response = match self.transport.get("", &params).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(method, %error, "last.fm request failed");
                return None;
            }
        };
        if !response.is_success() {
            tracing::debug!(method, status = response.status.as_u16(), "last.fm lookup skipped");
            return None;
        }

        let data: Value = serde_json::from_slice(&response.body).ok()?;
        if let Some(error) = data.get("error").filter(|error| !error.is_null()) {
            tracing::debug!(
                method,
                %error,
                message = data.get("message").and_then(|value| value.as_str()).unwrap_or(""),
                "last.fm error envelope"
            );
            return None;
        }
        serde_json::from_value(data).ok()
    }
}

/// Pick the best image URL from a sized image list: placeholders and
/// empty slots are skipped, larger sizes win, ties keep list order.
fn select_image(images: &[dto::ImageEntry]) -> Option<String> {
    let mut candidates: Vec<(u8, &str)> = images
        .iter()
        .filter(|image| !image.url.is_empty() && !is_placeholder(&image.url))
        .map(|image| (size_rank(&image.size), image.url.as_str()))
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates.first().map(|(_, url)| url.to_string())
}

fn is_placeholder(url: &str) -> bool {
    let lowered = url.to_lowercase();
    PLACEHOLDER_HASHES
        .iter()
        .any(|placeholder| lowered.contains(placeholder))
}

fn size_rank(size: &str) -> u8 {
    match size.to_lowercase().as_str() {
        "mega" => 6,
        "extralarge" => 5,
        "large" => 4,
        "medium" => 3,
        "small" => 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::traits::mocks::{MockTransport, json_response};

    fn artist() -> ArtistRef {
        ArtistRef {
            name: "Burial".to_string(),
            mbid: Some("mbid-b".to_string()),
        }
    }

    fn keyed(transport: Arc<MockTransport>) -> LastFmClient {
        LastFmClient::new(transport, Some("test-key".to_string()))
    }

    fn image(url: &str, size: &str) -> dto::ImageEntry {
        dto::ImageEntry {
            url: url.to_string(),
            size: size.to_string(),
        }
    }

    #[test]
    fn test_select_image_prefers_larger_sizes() {
        let images = vec![
            image("https://x/small.png", "small"),
            image("https://x/mega.png", "mega"),
            image("https://x/large.png", "large"),
        ];
        assert_eq!(select_image(&images).as_deref(), Some("https://x/mega.png"));
    }

    #[test]
    fn test_select_image_skips_placeholders_and_blanks() {
        let images = vec![
            image("", "mega"),
            image(
                "https://lastfm.example/2a96cbd8b46e442fc41c2b86b821562f.png",
                "extralarge",
            ),
            image("https://x/real.png", "medium"),
        ];
        assert_eq!(select_image(&images).as_deref(), Some("https://x/real.png"));
    }

    #[test]
    fn test_select_image_empty_when_nothing_usable() {
        assert!(select_image(&[image("", "mega")]).is_none());
        assert!(select_image(&[]).is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_key_makes_no_requests() {
        let transport = Arc::new(MockTransport::returning(vec![]));
        let client = LastFmClient::new(transport.clone(), None);

        assert!(client.top_tags(&artist()).await.is_empty());
        assert!(client.artist_photo_url(&artist()).await.is_none());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_top_tags_normalizes_and_dedupes() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(
            200,
            r#"{"toptags": {"tag": [
                {"name": "Dubstep", "count": 100},
                {"name": "dubstep", "count": 40},
                {"name": "electronic", "count": 74},
                {"name": "  ", "count": 10}
            ]}}"#,
        )]));
        let client = keyed(transport);

        let tags = client.top_tags(&artist()).await;
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], GenreTag { name: "dubstep".to_string(), weight: 100 });
        assert_eq!(tags[1].name, "electronic");
    }

    #[tokio::test]
    async fn test_error_envelope_degrades_to_empty() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(
            200,
            r#"{"error": 29, "message": "Rate limit exceeded"}"#,
        )]));
        let client = keyed(transport);

        assert!(client.top_tags(&artist()).await.is_empty());
    }

    #[tokio::test]
    async fn test_photo_url_from_artist_info() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(
            200,
            r##"{"artist": {"image": [{"#text": "https://x/photo.png", "size": "extralarge"}]}}"##,
        )]));
        let client = keyed(transport.clone());

        assert_eq!(
            client.artist_photo_url(&artist()).await.as_deref(),
            Some("https://x/photo.png")
        );

        // Memoized: a second resolution makes no further requests.
        client.artist_photo_url(&artist()).await;
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_photo_url_falls_back_to_top_albums() {
        let transport = Arc::new(MockTransport::returning(vec![
            json_response(
                200,
                r##"{"artist": {"image": [{"#text": "https://x/2a96cbd8b46e442fc41c2b86b821562f.png", "size": "mega"}]}}"##,
            ),
            json_response(
                200,
                r##"{"topalbums": {"album": [
                    {"name": "Untrue", "image": [{"#text": "https://x/album.png", "size": "large"}]}
                ]}}"##,
            ),
        ]));
        let client = keyed(transport.clone());

        assert_eq!(
            client.artist_photo_url(&artist()).await.as_deref(),
            Some("https://x/album.png")
        );

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(
            calls[1]
                .1
                .iter()
                .any(|(name, value)| name == "method" && value == "artist.gettopalbums")
        );
    }
}
