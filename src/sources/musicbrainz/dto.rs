//! MusicBrainz API Data Transfer Objects
//!
//! These types match EXACTLY what the MusicBrainz API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the musicbrainz module - convert via the adapter.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! We use the /artist endpoint (with `inc=tags+genres+url-rels`) for tag
//! and relation lookups, /artist/?query= for name search, and /recording
//! for track lengths.

use serde::Deserialize;

/// Artist lookup response with tags, genres and url relations included
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistDetailResponse {
    pub name: Option<String>,
    pub genres: Vec<TagEntry>,
    pub tags: Vec<TagEntry>,
    pub relations: Vec<RelationEntry>,
}

/// A tag or genre vote entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagEntry {
    pub name: Option<String>,
    pub count: Option<i64>,
}

impl TagEntry {
    /// Vote count as a weight; negative and zero votes count as absent.
    pub fn weight(&self) -> Option<u64> {
        self.count.filter(|count| *count > 0).map(|count| count as u64)
    }
}

/// A url relation on an artist page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelationEntry {
    #[serde(rename = "type")]
    pub relation_type: Option<String>,
    pub url: Option<RelationUrl>,
}

impl RelationEntry {
    /// The relation's target URL, when present.
    pub fn resource(&self) -> Option<&str> {
        self.url
            .as_ref()
            .and_then(|url| url.resource.as_deref())
            .filter(|resource| !resource.is_empty())
    }
}

/// Target of a url relation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelationUrl {
    pub resource: Option<String>,
}

/// Artist search response (`/artist/?query=...`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistSearchResponse {
    pub artists: Vec<ArtistSearchHit>,
}

/// One artist search hit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistSearchHit {
    pub id: Option<String>,
}

/// Recording lookup response; we only need the length
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordingResponse {
    /// Duration in milliseconds
    pub length: Option<u64>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    #[test]
    fn test_parse_artist_with_tags_and_genres() {
        let json = r#"{
            "name": "Radiohead",
            "genres": [
                {"name": "art rock", "count": 7},
                {"name": "alternative rock", "count": 12}
            ],
            "tags": [
                {"name": "seen live", "count": 40},
                {"name": "rock", "count": 15}
            ],
            "relations": []
        }"#;

        let artist: ArtistDetailResponse =
            serde_json::from_str(json).expect("Should parse artist detail");
        assert_eq!(artist.genres.len(), 2);
        assert_eq!(artist.tags.len(), 2);
        assert_eq!(artist.genres[1].weight(), Some(12));
    }

    #[test]
    fn test_parse_url_relations() {
        let json = r#"{
            "name": "Radiohead",
            "relations": [
                {
                    "type": "wikidata",
                    "url": {"resource": "https://www.wikidata.org/wiki/Q10811"}
                },
                {
                    "type": "image",
                    "url": {"resource": "https://commons.wikimedia.org/wiki/File:Radiohead.jpg"}
                }
            ]
        }"#;

        let artist: ArtistDetailResponse = serde_json::from_str(json).unwrap();
        assert_eq!(artist.relations.len(), 2);
        assert_eq!(
            artist.relations[0].relation_type.as_deref(),
            Some("wikidata")
        );
        assert_eq!(
            artist.relations[1].resource(),
            Some("https://commons.wikimedia.org/wiki/File:Radiohead.jpg")
        );
    }

    #[test]
    fn test_parse_artist_search() {
        let json = r#"{
            "created": "2026-01-01T00:00:00.000Z",
            "count": 1,
            "artists": [{"id": "a74b1b7f-71a5-4011-9441-d0b5e4122711", "name": "Radiohead"}]
        }"#;

        let search: ArtistSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            search.artists[0].id.as_deref(),
            Some("a74b1b7f-71a5-4011-9441-d0b5e4122711")
        );
    }

    #[test]
    fn test_parse_recording_length() {
        let recording: RecordingResponse =
            serde_json::from_str(r#"{"title": "Paranoid Android", "length": 387000}"#).unwrap();
        assert_eq!(recording.length, Some(387000));

        let no_length: RecordingResponse = serde_json::from_str(r#"{"title": "Untitled"}"#).unwrap();
        assert_eq!(no_length.length, None);
    }

    #[test]
    fn test_tag_weight_clamps_nonpositive_votes() {
        let tag = TagEntry {
            name: Some("rock".to_string()),
            count: Some(-3),
        };
        assert_eq!(tag.weight(), None);
    }
}
