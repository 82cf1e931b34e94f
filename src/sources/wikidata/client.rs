//! Wikidata EntityData client
//!
//! Resolves the image (P18) claim of an entity to a fetchable Commons
//! URL. One entity page per QID, memoized for the process lifetime.

use std::sync::Arc;

use parking_lot::Mutex;

use super::dto;
use crate::cache::LruMap;
use crate::net::Transport;
use crate::sources::musicbrainz::commons_image_url;

/// Entity image cache entries kept per process.
const IMAGE_CACHE_ENTRIES: usize = 256;

/// Claim key for "image".
const IMAGE_CLAIM: &str = "P18";

/// Wikidata entity-claim client with per-QID memoization.
pub struct WikidataClient {
    transport: Arc<dyn Transport>,
    images: Mutex<LruMap<String, Option<String>>>,
}

impl WikidataClient {
    /// Create a new client over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            images: Mutex::new(LruMap::new(IMAGE_CACHE_ENTRIES)),
        }
    }

    /// The entity's best image URL via its P18 claim, or `None`.
    pub async fn entity_image_url(&self, qid: &str) -> Option<String> {
        if qid.is_empty() {
            return None;
        }
        if let Some(cached) = self.images.lock().get(&qid.to_string()) {
            return cached;
        }

        let url = self.resolve_image_url(qid).await;
        self.images.lock().insert(qid.to_string(), url.clone());
        url
    }

    async fn resolve_image_url(&self, qid: &str) -> Option<String> {
        let response = match self.transport.get(&format!("/{qid}.json"), &[]).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(qid, %error, "wikidata request failed");
                return None;
            }
        };
        if !response.is_success() {
            tracing::debug!(qid, status = response.status.as_u16(), "wikidata lookup skipped");
            return None;
        }

        let document: dto::EntityResponse = serde_json::from_slice(&response.body).ok()?;
        let entity = document.entities.get(qid)?;
        entity
            .claims
            .get(IMAGE_CLAIM)
            .into_iter()
            .flatten()
            .find_map(|claim| claim.string_value())
            .map(commons_image_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::traits::mocks::{MockTransport, json_response};

    const ENTITY_BODY: &str = r#"{
        "entities": {
            "Q10811": {
                "claims": {
                    "P18": [
                        {"mainsnak": {"datavalue": {"value": "Radiohead 2018.jpg"}}}
                    ]
                }
            }
        }
    }"#;

    #[tokio::test]
    async fn test_entity_image_resolves_commons_url() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(
            200,
            ENTITY_BODY,
        )]));
        let client = WikidataClient::new(transport.clone());

        let url = client.entity_image_url("Q10811").await.unwrap();
        assert!(url.contains("Special:FilePath"));
        assert!(url.contains("Radiohead_2018.jpg"));
        assert_eq!(transport.calls()[0].0, "/Q10811.json");
    }

    #[tokio::test]
    async fn test_entity_image_memoizes_misses() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(
            200,
            r#"{"entities": {"Q1": {"claims": {}}}}"#,
        )]));
        let client = WikidataClient::new(transport.clone());

        assert!(client.entity_image_url("Q1").await.is_none());
        assert!(client.entity_image_url("Q1").await.is_none());
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_degrades_to_none() {
        let transport = Arc::new(MockTransport::returning(vec![json_response(500, "")]));
        let client = WikidataClient::new(transport);

        assert!(client.entity_image_url("Q2").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_qid_short_circuits() {
        let transport = Arc::new(MockTransport::returning(vec![]));
        let client = WikidataClient::new(transport.clone());
        assert!(client.entity_image_url("").await.is_none());
        assert!(transport.calls().is_empty());
    }
}
