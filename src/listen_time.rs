//! Listen-time estimation.
//!
//! Converts a user's listen counts into estimated wall-clock minutes: a
//! sample of their top tracks yields a play-count-weighted average track
//! length, which scales the total listen count from listening-activity
//! statistics. Track durations resolve concurrently with a bounded
//! worker count; tracks whose duration stays unknown are excluded from
//! both sums so they never drag the average toward a default.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream;

use crate::sources::domain::StatsError;
use crate::sources::traits::{RecordingApi, StatsApi};

/// Concurrent duration lookups in flight at once.
const DURATION_WORKERS: usize = 6;

/// Hard ceiling on the track sample, whatever the configuration says.
const SAMPLE_LIMIT_CEILING: usize = 200;

/// Milliseconds per minute, as a float for the final conversion.
const MS_PER_MINUTE: f64 = 60_000.0;

/// Tuning for the estimator.
#[derive(Debug, Clone)]
pub struct ListenTimeOptions {
    /// How many top tracks to sample for the average
    pub sample_limit: usize,
    /// Average track minutes assumed when no duration resolves
    pub default_average_minutes: f64,
}

/// Estimates listen minutes for a user.
pub struct ListenTimeEstimator {
    stats: Arc<dyn StatsApi>,
    recordings: Arc<dyn RecordingApi>,
    sample_limit: usize,
    default_average_minutes: f64,
}

impl ListenTimeEstimator {
    pub fn new(
        stats: Arc<dyn StatsApi>,
        recordings: Arc<dyn RecordingApi>,
        options: ListenTimeOptions,
    ) -> Self {
        Self {
            stats,
            recordings,
            sample_limit: options.sample_limit.clamp(1, SAMPLE_LIMIT_CEILING),
            default_average_minutes: options.default_average_minutes,
        }
    }

    /// Play-count-weighted average track length in minutes.
    ///
    /// `None` when no sampled track contributed a known duration; the
    /// caller substitutes its configured default.
    pub async fn average_track_minutes(&self, username: &str) -> Result<Option<f64>, StatsError> {
        let tracks = self.stats.track_plays(username, self.sample_limit).await?;

        // Distinct identifiers in first-seen order.
        let mut unique_mbids: Vec<String> = Vec::new();
        for track in &tracks {
            if let Some(mbid) = &track.recording_mbid
                && !unique_mbids.contains(mbid)
            {
                unique_mbids.push(mbid.clone());
            }
        }

        let mut lengths: HashMap<String, u64> = HashMap::new();
        if !unique_mbids.is_empty() {
            let lookups = stream::iter(unique_mbids.into_iter().map(|mbid| {
                let recordings = Arc::clone(&self.recordings);
                async move {
                    let length = recordings.recording_length(&mbid).await;
                    (mbid, length)
                }
            }))
            .buffer_unordered(DURATION_WORKERS)
            .collect::<Vec<_>>()
            .await;
            for (mbid, length) in lookups {
                if let Some(length) = length {
                    lengths.insert(mbid, length);
                }
            }
        }

        let mut total_length_ms: u64 = 0;
        let mut total_listens: u64 = 0;
        for track in &tracks {
            if track.listen_count == 0 {
                continue;
            }
            let Some(mbid) = &track.recording_mbid else {
                continue;
            };
            let length_ms = match lengths.get(mbid) {
                Some(length) => Some(*length),
                None => {
                    // A lookup may have raced to completion without a
                    // usable result; one direct (memoized) retry settles it.
                    let length = self.recordings.recording_length(mbid).await;
                    if let Some(length) = length {
                        lengths.insert(mbid.clone(), length);
                    }
                    length
                }
            };
            let Some(length_ms) = length_ms else {
                continue;
            };
            total_length_ms += length_ms * track.listen_count;
            total_listens += track.listen_count;
        }

        if total_listens == 0 {
            return Ok(None);
        }
        Ok(Some(
            (total_length_ms as f64 / total_listens as f64) / MS_PER_MINUTE,
        ))
    }

    /// Estimated total listen minutes as a comma-grouped integer string,
    /// or `"0"` when the user has no recorded listens.
    pub async fn estimate_listen_minutes(&self, username: &str) -> Result<String, StatsError> {
        let total_listens = self.stats.total_listens(username).await?;
        if total_listens == 0 {
            return Ok("0".to_string());
        }

        let average_minutes = self
            .average_track_minutes(username)
            .await?
            .unwrap_or(self.default_average_minutes);
        let total_minutes = (total_listens as f64 * average_minutes).max(0.0) as u64;
        Ok(group_thousands(total_minutes))
    }
}

/// Format an integer with comma thousand separators (12500 → "12,500").
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::domain::TrackPlay;
    use crate::sources::traits::mocks::{MockRecordings, MockStats};

    fn track(name: &str, mbid: Option<&str>, plays: u64) -> TrackPlay {
        TrackPlay {
            name: name.to_string(),
            recording_mbid: mbid.map(|mbid| mbid.to_string()),
            listen_count: plays,
        }
    }

    fn estimator(stats: MockStats, recordings: MockRecordings) -> ListenTimeEstimator {
        ListenTimeEstimator::new(
            Arc::new(stats),
            Arc::new(recordings),
            ListenTimeOptions {
                sample_limit: 50,
                default_average_minutes: 3.5,
            },
        )
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(12_500), "12,500");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[tokio::test]
    async fn test_weighted_average() {
        let stats = MockStats {
            tracks: vec![track("A", Some("rec-a"), 2), track("B", Some("rec-b"), 1)],
            ..Default::default()
        };
        let recordings = MockRecordings {
            lengths: [
                ("rec-a".to_string(), 180_000),
                ("rec-b".to_string(), 240_000),
            ]
            .into(),
            ..Default::default()
        };

        let average = estimator(stats, recordings)
            .average_track_minutes("alice")
            .await
            .unwrap()
            .unwrap();
        // (180000*2 + 240000*1) / 3 / 60000 = 3.33 minutes
        assert!((average - 10.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_durations_excluded_from_both_sums() {
        let stats = MockStats {
            tracks: vec![
                track("Known", Some("rec-a"), 2),
                track("Unknown duration", Some("rec-x"), 100),
                track("No identifier", None, 50),
            ],
            ..Default::default()
        };
        let recordings = MockRecordings {
            lengths: [("rec-a".to_string(), 180_000)].into(),
            ..Default::default()
        };

        let average = estimator(stats, recordings)
            .average_track_minutes("alice")
            .await
            .unwrap()
            .unwrap();
        assert!((average - 3.0).abs() < 1e-9, "only the known track counts");
    }

    #[tokio::test]
    async fn test_no_contributing_tracks_yields_none() {
        let stats = MockStats {
            tracks: vec![track("A", Some("rec-a"), 3), track("B", None, 2)],
            ..Default::default()
        };

        let average = estimator(stats, MockRecordings::default())
            .average_track_minutes("alice")
            .await
            .unwrap();
        assert!(average.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_looked_up_once() {
        let stats = MockStats {
            tracks: vec![
                track("Single", Some("rec-a"), 1),
                track("Album version", Some("rec-a"), 4),
            ],
            ..Default::default()
        };
        let recordings = Arc::new(MockRecordings {
            lengths: [("rec-a".to_string(), 200_000)].into(),
            ..Default::default()
        });
        let estimator = ListenTimeEstimator::new(
            Arc::new(stats),
            recordings.clone(),
            ListenTimeOptions {
                sample_limit: 50,
                default_average_minutes: 3.5,
            },
        );

        estimator.average_track_minutes("alice").await.unwrap();
        assert_eq!(recordings.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_listens_formats_as_zero_string() {
        let stats = MockStats {
            total: 0,
            ..Default::default()
        };

        let minutes = estimator(stats, MockRecordings::default())
            .estimate_listen_minutes("alice")
            .await
            .unwrap();
        assert_eq!(minutes, "0");
    }

    #[tokio::test]
    async fn test_estimate_uses_default_average_when_unknown() {
        let stats = MockStats {
            total: 1000,
            tracks: Vec::new(),
            ..Default::default()
        };

        let minutes = estimator(stats, MockRecordings::default())
            .estimate_listen_minutes("alice")
            .await
            .unwrap();
        // 1000 listens * 3.5 default minutes
        assert_eq!(minutes, "3,500");
    }

    #[tokio::test]
    async fn test_estimate_is_comma_grouped() {
        let stats = MockStats {
            total: 2500,
            tracks: vec![track("A", Some("rec-a"), 1)],
            ..Default::default()
        };
        let recordings = MockRecordings {
            lengths: [("rec-a".to_string(), 300_000)].into(),
            ..Default::default()
        };

        let minutes = estimator(stats, recordings)
            .estimate_listen_minutes("alice")
            .await
            .unwrap();
        // 2500 listens * 5 minutes = 12500
        assert_eq!(minutes, "12,500");
    }
}
