//! Last.fm API Data Transfer Objects
//!
//! These types match EXACTLY what the audioscrobbler 2.0 API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the lastfm module.
//!
//! API Reference: https://www.last.fm/api
//!
//! Errors come back as `{"error": <code>, "message": ...}` with a 200
//! status, so every envelope carries optional error fields.

use serde::Deserialize;

/// `artist.getinfo` envelope
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistInfoResponse {
    pub artist: Option<ArtistInfo>,
    pub error: Option<i64>,
    pub message: Option<String>,
}

/// Artist block inside `artist.getinfo`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistInfo {
    pub image: Vec<ImageEntry>,
}

/// One sized image slot
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImageEntry {
    #[serde(rename = "#text")]
    pub url: String,
    pub size: String,
}

/// `artist.gettopalbums` envelope
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopAlbumsResponse {
    pub topalbums: Option<TopAlbums>,
    pub error: Option<i64>,
    pub message: Option<String>,
}

/// Album list inside `artist.gettopalbums`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopAlbums {
    pub album: Vec<AlbumEntry>,
}

/// One top album
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlbumEntry {
    pub name: Option<String>,
    pub image: Vec<ImageEntry>,
}

/// `artist.gettoptags` envelope
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopTagsResponse {
    pub toptags: Option<TopTags>,
    pub error: Option<i64>,
    pub message: Option<String>,
}

/// Tag list inside `artist.gettoptags`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopTags {
    pub tag: Vec<TagEntry>,
}

/// One tag vote
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagEntry {
    pub name: Option<String>,
    pub count: Option<i64>,
}

impl TagEntry {
    /// Vote count as a weight; non-positive votes count as absent.
    pub fn weight(&self) -> Option<u64> {
        self.count.filter(|count| *count > 0).map(|count| count as u64)
    }
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================
