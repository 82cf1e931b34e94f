//! Genre resolution from weighted tag signals.
//!
//! A listener's genre is decided by tallying tag votes across their top
//! artists into two counters: a "popular" counter fed only by tags from a
//! curated popular-genre set (or ending in a strong genre suffix), and a
//! "fallback" counter fed by every qualifying tag. The popular counter
//! wins when it has anything; ties break by first-seen order. Noise tags
//! ("seen live" and friends) never reach either counter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::sources::domain::{ArtistRef, GenreTag, StatsError};
use crate::sources::lastfm::LastFmClient;
use crate::sources::musicbrainz::MusicBrainzClient;
use crate::sources::traits::{ArtistSearchApi, StatsApi, TagApi};

/// Sentinel returned when no tag survives selection.
pub const NO_GENRE: &str = "no genre";

/// How many top artists contribute tag votes.
const GENRE_ARTIST_COUNT: usize = 10;

/// Tags that say nothing about genre.
const IGNORED_TAGS: [&str; 5] = ["seen live", "favorites", "favourites", "favorite", "ireland"];

/// Curated set of broadly recognised genres.
const POPULAR_GENRES: [&str; 23] = [
    "pop", "rock", "hip hop", "rap", "electronic", "edm", "indie", "metal", "jazz", "folk",
    "country", "r&b", "soul", "classical", "blues", "house", "techno", "ambient", "punk", "k-pop",
    "latin", "dance", "lo-fi",
];

/// Suffixes that mark a tag as a genre even off the curated list.
const GENRE_SUFFIXES: [&str; 7] = ["pop", "rock", "metal", "jazz", "folk", "house", "core"];

/// Whether a normalized tag belongs in the popular counter.
fn is_popular(name: &str) -> bool {
    POPULAR_GENRES.contains(&name)
        || GENRE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn is_ignored(name: &str) -> bool {
    IGNORED_TAGS.contains(&name)
}

/// Two-counter weighted tally with first-seen tie-breaking.
#[derive(Debug, Default)]
pub struct GenreTally {
    popular: Vec<(String, u64)>,
    fallback: Vec<(String, u64)>,
}

impl GenreTally {
    /// Add one artist's tag set to the counters.
    pub fn add(&mut self, tags: &[GenreTag]) {
        for tag in tags {
            if is_ignored(&tag.name) {
                continue;
            }
            bump(&mut self.fallback, &tag.name, tag.weight);
            if is_popular(&tag.name) {
                bump(&mut self.popular, &tag.name, tag.weight);
            }
        }
    }

    /// The winning tag, title-cased, or `None` when both counters are empty.
    pub fn select(&self) -> Option<String> {
        let counter = if self.popular.is_empty() {
            &self.fallback
        } else {
            &self.popular
        };
        let mut best: Option<&(String, u64)> = None;
        for entry in counter {
            // Strict comparison keeps the first-seen entry on ties.
            if best.map(|(_, weight)| entry.1 > *weight).unwrap_or(true) {
                best = Some(entry);
            }
        }
        best.map(|(name, _)| title_case(name))
    }
}

fn bump(counter: &mut Vec<(String, u64)>, name: &str, weight: u64) {
    if let Some(entry) = counter.iter_mut().find(|(existing, _)| existing == name) {
        entry.1 += weight;
    } else {
        counter.push((name.to_string(), weight));
    }
}

/// Title-case a normalized tag for presentation ("hip hop" → "Hip Hop",
/// "k-pop" → "K-Pop", "r&b" → "R&B").
fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_boundary = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_boundary {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            at_boundary = false;
        } else {
            result.push(ch);
            at_boundary = true;
        }
    }
    result
}

/// Production tag source: the tag/image service when configured, the
/// metadata service's artist detail (genres + tags) otherwise.
pub struct TagSource {
    lastfm: Arc<LastFmClient>,
    musicbrainz: Arc<MusicBrainzClient>,
}

impl TagSource {
    pub fn new(lastfm: Arc<LastFmClient>, musicbrainz: Arc<MusicBrainzClient>) -> Self {
        Self { lastfm, musicbrainz }
    }
}

#[async_trait]
impl TagApi for TagSource {
    async fn artist_tags(&self, artist: &ArtistRef) -> Vec<GenreTag> {
        if self.lastfm.is_configured() {
            let tags = self.lastfm.top_tags(artist).await;
            if !tags.is_empty() {
                return tags;
            }
        }

        let Some(mbid) = artist.mbid.as_deref() else {
            return Vec::new();
        };
        let Some(details) = self.musicbrainz.artist_details(mbid).await else {
            return Vec::new();
        };

        // Genre votes first, folksonomy tags after; dedupe keeps the
        // heavier weight per name.
        let mut merged: Vec<GenreTag> = Vec::new();
        for tag in details.genres.into_iter().chain(details.tags) {
            if let Some(existing) = merged.iter_mut().find(|existing| existing.name == tag.name) {
                existing.weight = existing.weight.max(tag.weight);
            } else {
                merged.push(tag);
            }
        }
        merged
    }
}

/// Resolves a user's (or single artist's) dominant genre.
pub struct GenreResolver {
    stats: Arc<dyn StatsApi>,
    tags: Arc<dyn TagApi>,
    search: Arc<dyn ArtistSearchApi>,
}

impl GenreResolver {
    pub fn new(
        stats: Arc<dyn StatsApi>,
        tags: Arc<dyn TagApi>,
        search: Arc<dyn ArtistSearchApi>,
    ) -> Self {
        Self { stats, tags, search }
    }

    /// Dominant genre across the user's top artists.
    ///
    /// Statistics failures propagate; tag lookups degrade silently, so a
    /// user whose artists have no tags simply gets the sentinel.
    pub async fn top_genre(&self, username: &str) -> Result<String, StatsError> {
        let artists = self
            .stats
            .top_artist_refs(username, GENRE_ARTIST_COUNT)
            .await?;

        let mut tally = GenreTally::default();
        for artist in &artists {
            let tags = self.tags.artist_tags(artist).await;
            tally.add(&tags);
        }

        Ok(tally.select().unwrap_or_else(|| NO_GENRE.to_string()))
    }

    /// Genre for one artist by name, via identifier search.
    pub async fn genre_for_artist(&self, name: &str) -> String {
        let Some(mbid) = self.search.search_artist(name).await else {
            return NO_GENRE.to_string();
        };
        let artist = ArtistRef {
            name: name.to_string(),
            mbid: Some(mbid),
        };
        let tags = self.tags.artist_tags(&artist).await;

        let mut tally = GenreTally::default();
        tally.add(&tags);
        tally.select().unwrap_or_else(|| NO_GENRE.to_string())
    }
}
