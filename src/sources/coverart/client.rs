//! Cover Art Archive HTTP client
//!
//! API: https://coverartarchive.org
//!
//! The archive answers `/{release-id}/front-{size}` with a redirect to
//! the image host. Redirect-following is disabled on this pool; each
//! attempt follows at most one redirect manually, so a redirect loop can
//! never eat the request budget. Sizes are tried from largest thumbnail
//! down to the unsized original; the first image payload wins.

use std::sync::Arc;

use crate::net::Transport;
use crate::sources::domain::{ImagePayload, ReleaseArt};

/// Thumbnail suffixes in lookup order, largest first.
const SIZE_SUFFIXES: [&str; 6] = ["-1200", "-1000", "-800", "-500", "-250", ""];

/// Redirect statuses worth following (once).
const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Cover Art Archive client.
pub struct CoverArtClient {
    transport: Arc<dyn Transport>,
}

impl CoverArtClient {
    /// Create a new client over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch the front cover for a release, walking the size ladder.
    ///
    /// The Cover Art Archive release ID is preferred when the statistics
    /// payload supplied one; the plain release ID is the fallback key.
    pub async fn front_cover(&self, art: &ReleaseArt) -> Option<ImagePayload> {
        let release_id = art
            .caa_release_mbid
            .as_deref()
            .unwrap_or(&art.release_mbid);
        if release_id.is_empty() {
            return None;
        }

        for suffix in SIZE_SUFFIXES {
            let path = format!("/{release_id}/front{suffix}");
            if let Some(payload) = self.fetch_candidate(&path).await {
                return Some(payload);
            }
        }
        None
    }

    /// Fetch one sized candidate, following at most one redirect.
    async fn fetch_candidate(&self, path: &str) -> Option<ImagePayload> {
        let mut response = self.transport.get(path, &[]).await.ok()?;

        if REDIRECT_STATUSES.contains(&response.status.as_u16()) {
            let location = response.location.clone()?;
            response = self.transport.get(&location, &[]).await.ok()?;
        }

        response
            .into_image()
            .map(|(content_type, bytes)| ImagePayload {
                content_type,
                bytes,
            })
    }
}
