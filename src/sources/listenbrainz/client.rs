//! ListenBrainz statistics client.
//!
//! Fronted by a TTL cache keyed on (endpoint path, sorted query
//! parameters). Responses are validated strictly (this is primary data):
//! a 404 maps to `NotFound`, server errors to `Unavailable`, and any
//! non-JSON or envelope-less body to `BadResponse` with a short excerpt.
//!
//! Statistics are requested for a configured primary range; when the
//! expected list comes back empty (a successful response, not an error)
//! the call is retried once against `all_time` and the last payload wins.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::dto::{ActivityBucket, TopArtistEntry, TopRecordingEntry, TopReleaseEntry};
use crate::cache::TtlCache;
use crate::net::Transport;
use crate::sources::domain::StatsError;

/// Fallback range used when the primary range yields an empty list.
const FULL_RANGE: &str = "all_time";

type CacheKey = (String, Vec<(String, String)>);

/// Tuning for the statistics client.
#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Primary statistics range (e.g. "year")
    pub primary_range: String,
    /// How long cached payloads stay valid
    pub cache_ttl: Duration,
    /// Maximum number of cached payloads
    pub cache_capacity: usize,
    /// Upper bound for caller-requested top-N counts
    pub max_top_results: usize,
}

/// Statistics service client with a TTL cache in front.
pub struct StatsClient {
    transport: Arc<dyn Transport>,
    cache: Mutex<TtlCache<CacheKey, Value>>,
    primary_range: String,
    max_top_results: usize,
}

impl StatsClient {
    /// Create a client over the given transport.
    pub fn new(transport: Arc<dyn Transport>, options: StatsOptions) -> Self {
        Self {
            transport,
            cache: Mutex::new(TtlCache::new(options.cache_ttl, options.cache_capacity)),
            primary_range: options.primary_range,
            max_top_results: options.max_top_results.max(1),
        }
    }

    /// Clamp a caller-requested count into the supported range.
    pub fn clamp_count(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_top_results)
    }

    /// The user's top artists, newest-range first with all-time fallback.
    pub async fn top_artists(
        &self,
        username: &str,
        count: usize,
    ) -> Result<Vec<TopArtistEntry>, StatsError> {
        let payload = self
            .stat_payload(username, "artists", "artists", Some(count))
            .await?;
        list(&payload, "artists")
    }

    /// The user's top recordings.
    pub async fn top_recordings(
        &self,
        username: &str,
        count: usize,
    ) -> Result<Vec<TopRecordingEntry>, StatsError> {
        let payload = self
            .stat_payload(username, "recordings", "recordings", Some(count))
            .await?;
        list(&payload, "recordings")
    }

    /// The user's top releases.
    pub async fn top_releases(
        &self,
        username: &str,
        count: usize,
    ) -> Result<Vec<TopReleaseEntry>, StatsError> {
        let payload = self
            .stat_payload(username, "releases", "releases", Some(count))
            .await?;
        list(&payload, "releases")
    }

    /// Listen-count buckets over time for the user.
    pub async fn listening_activity(
        &self,
        username: &str,
    ) -> Result<Vec<ActivityBucket>, StatsError> {
        let payload = self
            .stat_payload(username, "listening-activity", "listening_activity", None)
            .await?;
        list(&payload, "listening_activity")
    }

    /// Fetch one statistics endpoint, trying the primary range first and
    /// falling back to all-time only when the expected list is empty.
    /// Errors are fatal; they never trigger the fallback range.
    async fn stat_payload(
        &self,
        username: &str,
        endpoint: &str,
        list_key: &str,
        count: Option<usize>,
    ) -> Result<Value, StatsError> {
        let mut ranges = vec![self.primary_range.clone()];
        if self.primary_range != FULL_RANGE {
            ranges.push(FULL_RANGE.to_string());
        }

        let path = format!("/stats/user/{}/{}", urlencoding::encode(username), endpoint);
        let mut last_payload = Value::Object(Default::default());
        for range in ranges {
            let mut params = vec![("range", range)];
            if let Some(count) = count {
                params.push(("count", count.to_string()));
            }
            let payload = self.fetch(&path, &params).await?;
            let has_items = payload
                .get(list_key)
                .and_then(Value::as_array)
                .map(|items| !items.is_empty())
                .unwrap_or(false);
            last_payload = payload;
            if has_items {
                break;
            }
        }
        Ok(last_payload)
    }

    /// Cached GET of one statistics path. Validates the response and
    /// memoizes the payload envelope contents.
    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Value, StatsError> {
        let mut sorted: Vec<(String, String)> = params
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        sorted.sort();
        let key = (path.to_string(), sorted);

        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(hit);
        }

        let response = self.transport.get(path, params).await?;
        let status = response.status.as_u16();
        if status == 404 {
            return Err(StatsError::NotFound);
        }
        if status >= 500 {
            return Err(StatsError::Unavailable);
        }
        if !response.is_success() {
            return Err(StatsError::RequestFailed(status));
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            // Empty-but-successful bodies are treated as an empty payload
            // and deliberately not cached.
            return Ok(Value::Object(Default::default()));
        }

        let json_content = response
            .content_type
            .as_deref()
            .map(|content_type| content_type.contains("application/json"))
            .unwrap_or(false);
        if !json_content {
            return Err(StatsError::BadResponse(format!(
                "unexpected response (status {}, content-type {}): {}",
                status,
                response.content_type.as_deref().unwrap_or("none"),
                non_empty(response.snippet())
            )));
        }

        let data: Value = serde_json::from_slice(&response.body).map_err(|_| {
            StatsError::BadResponse(format!(
                "undecodable JSON body (status {}): {}",
                status,
                non_empty(response.snippet())
            ))
        })?;
        let payload = data
            .get("payload")
            .cloned()
            .ok_or_else(|| StatsError::BadResponse("missing payload envelope".to_string()))?;

        self.cache.lock().insert(key, payload.clone());
        Ok(payload)
    }
}

fn non_empty(snippet: String) -> String {
    if snippet.is_empty() {
        "empty body".to_string()
    } else {
        snippet
    }
}

/// Deserialize a list field from a payload, treating absence as empty.
fn list<T: DeserializeOwned>(payload: &Value, key: &str) -> Result<Vec<T>, StatsError> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|error| StatsError::BadResponse(format!("malformed {key} list: {error}"))),
    }
}
