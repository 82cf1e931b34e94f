//! Resilient outbound HTTP layer.
//!
//! Every upstream gets its own [`UpstreamClient`]: a persistent
//! `reqwest::Client` pool with an identifying user-agent, plus shared
//! retry behaviour for idempotent GETs. Transient failures (connection
//! errors and 500/502/503/504 responses) are retried up to a fixed
//! budget with linear backoff; exhausting the budget on connection
//! failures surfaces [`NetError::Unreachable`]. Non-2xx statuses are
//! *not* errors here - status inspection is the caller's job.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION};

/// Status codes that indicate a transient upstream problem worth retrying.
const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Delay unit for linear backoff between retries (attempt n waits n units).
const BACKOFF_UNIT: Duration = Duration::from_millis(300);

/// Maximum length of the body snippet carried in diagnostics.
const SNIPPET_LIMIT: usize = 200;

/// Connection options for one upstream pool.
#[derive(Debug, Clone)]
pub struct UpstreamOptions {
    /// User-agent header identifying this application to the upstream
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Total GET attempts (first try + retries)
    pub attempts: u32,
    /// Optional Accept header (e.g. image accept list for binary pools)
    pub accept: Option<String>,
    /// Whether reqwest may follow redirects itself. Disabled for the
    /// cover-art pool, which follows at most one redirect manually.
    pub follow_redirects: bool,
}

impl UpstreamOptions {
    /// JSON-API defaults for the given user agent.
    pub fn json_api(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
            attempts: 3,
            accept: Some("application/json".to_string()),
            follow_redirects: true,
        }
    }
}

/// Response snapshot handed back to callers.
///
/// The body is fully read before returning so retry/backoff decisions
/// never hold a live connection.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Interpret the response as image bytes.
    ///
    /// Returns the content type and body when the request succeeded, the
    /// content type names an image, and the body is non-empty.
    pub fn into_image(self) -> Option<(String, Vec<u8>)> {
        if !self.is_success() || self.body.is_empty() {
            return None;
        }
        let content_type = self.content_type?;
        if !content_type.to_ascii_lowercase().contains("image") {
            return None;
        }
        Some((content_type, self.body))
    }

    /// Truncated, lossily-decoded body excerpt for error diagnostics.
    pub fn snippet(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        let trimmed = text.trim();
        if trimmed.len() > SNIPPET_LIMIT {
            let mut end = SNIPPET_LIMIT;
            while !trimmed.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &trimmed[..end])
        } else {
            trimmed.to_string()
        }
    }
}

/// Errors from the resilient layer itself.
///
/// Only raised when the retry budget is exhausted without ever getting a
/// response; upstream status codes are reported via [`UpstreamResponse`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetError {
    #[error("upstream unreachable after {attempts} attempts: {message}")]
    Unreachable { attempts: u32, message: String },
}

/// Transport seam for upstream GETs.
///
/// Production code uses [`UpstreamClient`]; tests substitute scripted
/// transports to exercise validation and fallback logic offline.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// GET a path (or absolute URL) with query parameters.
    async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<UpstreamResponse, NetError>;
}

/// Persistent connection pool for one upstream service.
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    attempts: u32,
}

impl UpstreamClient {
    /// Build a pool for `base_url` with the given options.
    pub fn new(base_url: impl Into<String>, options: &UpstreamOptions) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(accept) = &options.accept
            && let Ok(value) = HeaderValue::from_str(accept)
        {
            headers.insert(ACCEPT, value);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(&options.user_agent)
            .timeout(options.timeout)
            .gzip(true)
            .default_headers(headers);
        if !options.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }
        let client = builder.build().expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            attempts: options.attempts.max(1),
        }
    }

    /// GET `path` (or an absolute URL) with retry on transient failures.
    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<UpstreamResponse, NetError> {
        let url = self.request_url(path);
        let mut last_error: Option<reqwest::Error> = None;

        for attempt in 0..self.attempts {
            if attempt > 0 {
                tokio::time::sleep(BACKOFF_UNIT * attempt).await;
            }

            let mut request = self.client.get(&url);
            if !params.is_empty() {
                request = request.query(params);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(%url, attempt, %error, "upstream request failed");
                    last_error = Some(error);
                    continue;
                }
            };

            let status = response.status();
            if RETRYABLE_STATUSES.contains(&status.as_u16()) && attempt + 1 < self.attempts {
                tracing::debug!(%url, attempt, %status, "retrying after server error");
                continue;
            }

            let content_type = header_string(response.headers(), CONTENT_TYPE.as_str());
            let location = header_string(response.headers(), LOCATION.as_str());
            match response.bytes().await {
                Ok(body) => {
                    return Ok(UpstreamResponse {
                        status,
                        content_type,
                        location,
                        body: body.to_vec(),
                    });
                }
                Err(error) => {
                    tracing::debug!(%url, attempt, %error, "failed to read upstream body");
                    last_error = Some(error);
                }
            }
        }

        Err(NetError::Unreachable {
            attempts: self.attempts,
            message: last_error
                .map(|error| error.to_string())
                .unwrap_or_else(|| "no response".to_string()),
        })
    }

    fn request_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

#[async_trait::async_trait]
impl Transport for UpstreamClient {
    async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<UpstreamResponse, NetError> {
        UpstreamClient::get(self, path, params).await
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, content_type: Option<&str>, body: &[u8]) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(|value| value.to_string()),
            location: None,
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_request_url_joins_relative_paths() {
        let options = UpstreamOptions::json_api("test/1.0", Duration::from_secs(1));
        let client = UpstreamClient::new("https://api.example.com/1", &options);
        assert_eq!(
            client.request_url("/stats/user/alice/artists"),
            "https://api.example.com/1/stats/user/alice/artists"
        );
        assert_eq!(
            client.request_url("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_into_image_accepts_image_payload() {
        let result = response(200, Some("image/jpeg"), b"\xff\xd8\xff").into_image();
        assert_eq!(result, Some(("image/jpeg".to_string(), b"\xff\xd8\xff".to_vec())));
    }

    #[test]
    fn test_into_image_rejects_non_image_content_type() {
        assert!(response(200, Some("text/html"), b"<html>").into_image().is_none());
    }

    #[test]
    fn test_into_image_rejects_failures_and_empty_bodies() {
        assert!(response(404, Some("image/png"), b"x").into_image().is_none());
        assert!(response(500, Some("image/png"), b"x").into_image().is_none());
        assert!(response(200, Some("image/png"), b"").into_image().is_none());
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        let snippet = response(200, None, long.as_bytes()).snippet();
        assert_eq!(snippet.len(), 203); // 200 chars + "..."
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_snippet_trims_short_bodies() {
        let snippet = response(200, None, b"  short body \n").snippet();
        assert_eq!(snippet, "short body");
    }
}
