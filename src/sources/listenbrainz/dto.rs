//! ListenBrainz API Data Transfer Objects
//!
//! These types match EXACTLY what the ListenBrainz statistics API returns
//! inside its `{"payload": ...}` envelope. DO NOT add fields that aren't in
//! the API response. DO NOT use these types outside the listenbrainz module
//! except through their conversion helpers.
//!
//! API Reference: https://listenbrainz.readthedocs.io/en/latest/users/api/statistics.html

use serde::Deserialize;

use crate::sources::domain::{ArtistRef, ReleaseArt, TrackPlay};

/// One artist entry from `/stats/user/{user}/artists`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopArtistEntry {
    pub artist_name: Option<String>,
    pub artist_mbid: Option<String>,
    pub artist_mbids: Vec<String>,
    pub listen_count: i64,
}

impl TopArtistEntry {
    /// First non-empty MusicBrainz ID: the primary id wins, then the
    /// first entry of the alternates list.
    pub fn mbid(&self) -> Option<String> {
        self.artist_mbid
            .as_ref()
            .filter(|mbid| !mbid.is_empty())
            .cloned()
            .or_else(|| self.artist_mbids.iter().find(|mbid| !mbid.is_empty()).cloned())
    }

    /// Convert to a domain reference; `None` when the entry has no name.
    pub fn artist_ref(&self) -> Option<ArtistRef> {
        let name = self.artist_name.as_ref().filter(|name| !name.is_empty())?;
        Some(ArtistRef {
            name: name.clone(),
            mbid: self.mbid(),
        })
    }

    /// Listen count clamped to zero.
    pub fn plays(&self) -> u64 {
        self.listen_count.max(0) as u64
    }
}

/// One recording entry from `/stats/user/{user}/recordings`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopRecordingEntry {
    pub track_name: Option<String>,
    pub recording_mbid: Option<String>,
    pub release_mbid: Option<String>,
    pub caa_release_mbid: Option<String>,
    pub listen_count: i64,
}

impl TopRecordingEntry {
    /// Listen count clamped to zero.
    pub fn plays(&self) -> u64 {
        self.listen_count.max(0) as u64
    }

    /// Convert to the estimator's track shape.
    pub fn track_play(&self) -> TrackPlay {
        TrackPlay {
            name: self
                .track_name
                .clone()
                .unwrap_or_else(|| "Unknown track".to_string()),
            recording_mbid: self
                .recording_mbid
                .as_ref()
                .filter(|mbid| !mbid.is_empty())
                .cloned(),
            listen_count: self.plays(),
        }
    }
}

/// One release entry from `/stats/user/{user}/releases`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopReleaseEntry {
    pub release_name: Option<String>,
    pub release_mbid: Option<String>,
    pub caa_release_mbid: Option<String>,
    pub listen_count: i64,
}

impl TopReleaseEntry {
    /// Listen count clamped to zero.
    pub fn plays(&self) -> u64 {
        self.listen_count.max(0) as u64
    }
}

/// One bucket from `/stats/user/{user}/listening-activity`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityBucket {
    pub time_range: Option<String>,
    pub listen_count: i64,
}

impl ActivityBucket {
    /// Listen count clamped to zero.
    pub fn plays(&self) -> u64 {
        self.listen_count.max(0) as u64
    }
}

/// Accumulate ranked cover-art candidates from release and recording
/// statistics. A candidate's weight is the highest listen count observed
/// for it in either list.
#[derive(Debug, Default)]
pub struct ReleaseArtTally {
    entries: Vec<ReleaseArt>,
}

impl ReleaseArtTally {
    /// Record one (release, caa-release) pair with a listen count.
    pub fn add(
        &mut self,
        release_mbid: Option<&str>,
        caa_release_mbid: Option<&str>,
        listen_count: u64,
    ) {
        let Some(release_mbid) = release_mbid.filter(|mbid| !mbid.is_empty()) else {
            return;
        };
        let caa_release_mbid = caa_release_mbid
            .filter(|mbid| !mbid.is_empty())
            .map(|mbid| mbid.to_string());
        let weight = listen_count.max(1);

        if let Some(existing) = self.entries.iter_mut().find(|entry| {
            entry.release_mbid == release_mbid && entry.caa_release_mbid == caa_release_mbid
        }) {
            existing.weight = existing.weight.max(weight);
            return;
        }
        self.entries.push(ReleaseArt {
            release_mbid: release_mbid.to_string(),
            caa_release_mbid,
            weight,
        });
    }

    /// Candidates sorted by descending weight, trimmed to `limit`.
    pub fn ranked(mut self, limit: usize) -> Vec<ReleaseArt> {
        self.entries.sort_by(|a, b| b.weight.cmp(&a.weight));
        self.entries.truncate(limit);
        self.entries
    }
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
    fn test_parse_artist_entry() {
        let json = r#"{
            "artist_name": "Boards of Canada",
            "artist_mbid": "69158f97-4c07-4c4e-baf8-4e4ab1ed666e",
            "artist_mbids": ["69158f97-4c07-4c4e-baf8-4e4ab1ed666e"],
            "listen_count": 214
        }"#;

        let entry: TopArtistEntry = serde_json::from_str(json).expect("Should parse artist entry");
        assert_eq!(entry.artist_name.as_deref(), Some("Boards of Canada"));
        assert_eq!(entry.plays(), 214);
        assert_eq!(
            entry.mbid().as_deref(),
            Some("69158f97-4c07-4c4e-baf8-4e4ab1ed666e")
        );
    }

    #[test]
    fn test_artist_mbid_falls_back_to_alternates() {
        let json = r#"{
            "artist_name": "Unknown Collective",
            "artist_mbids": ["", "1b2c3d4e-aaaa-bbbb-cccc-1234567890ab"],
            "listen_count": 3
        }"#;

        let entry: TopArtistEntry = serde_json::from_str(json).unwrap();
        assert_eq!(
            entry.mbid().as_deref(),
            Some("1b2c3d4e-aaaa-bbbb-cccc-1234567890ab")
        );
    }

    #[test]
    fn test_parse_minimal_recording_entry() {
        let entry: TopRecordingEntry = serde_json::from_str(r#"{"track_name": "Roygbiv"}"#).unwrap();
        assert_eq!(entry.track_name.as_deref(), Some("Roygbiv"));
        assert_eq!(entry.plays(), 0);
        assert!(entry.track_play().recording_mbid.is_none());
    }

    #[test]
    fn test_negative_listen_count_clamps_to_zero() {
        let entry: TopReleaseEntry =
            serde_json::from_str(r#"{"release_name": "Geogaddi", "listen_count": -5}"#).unwrap();
        assert_eq!(entry.plays(), 0);
    }

    #[test]
    fn test_parse_activity_bucket() {
        let bucket: ActivityBucket =
            serde_json::from_str(r#"{"time_range": "2025", "listen_count": 1420}"#).unwrap();
        assert_eq!(bucket.plays(), 1420);
    }
}

#[cfg(test)]
mod tally_tests {
    use super::*;

    #[test]
    fn test_tally_keeps_highest_weight_per_pair() {
        let mut tally = ReleaseArtTally::default();
        tally.add(Some("rel-1"), Some("caa-1"), 4);
        tally.add(Some("rel-1"), Some("caa-1"), 9);
        tally.add(Some("rel-1"), Some("caa-1"), 2);

        let ranked = tally.ranked(10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].weight, 9);
    }

    #[test]
    fn test_tally_ranks_descending_and_trims() {
        let mut tally = ReleaseArtTally::default();
        tally.add(Some("rel-low"), None, 1);
        tally.add(Some("rel-high"), None, 50);
        tally.add(Some("rel-mid"), None, 10);

        let ranked = tally.ranked(2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].release_mbid, "rel-high");
        assert_eq!(ranked[1].release_mbid, "rel-mid");
    }

    #[test]
    fn test_tally_skips_missing_release_and_floors_weight() {
        let mut tally = ReleaseArtTally::default();
        tally.add(None, Some("caa-1"), 100);
        tally.add(Some(""), None, 100);
        tally.add(Some("rel-1"), None, 0);

        let ranked = tally.ranked(10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].weight, 1);
    }
}
