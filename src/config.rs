//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\rewind-fm\config.toml
//! - macOS: ~/Library/Application Support/rewind-fm/config.toml
//! - Linux: ~/.config/rewind-fm/config.toml
//!
//! The config file is human-readable and editable. Settings are loaded
//! at startup; every field has a sensible default, so a missing or
//! partial file always yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream service endpoints and credentials
    pub upstreams: UpstreamsConfig,

    /// Outbound HTTP behaviour
    pub http: HttpConfig,

    /// Statistics lookups and caching
    pub stats: StatsConfig,

    /// Artwork queue, waterfall and temporary store
    pub artwork: ArtworkConfig,

    /// Human-verification gate
    pub verify: VerifyConfig,

    /// Per-caller rate limits
    pub limits: RateLimitConfig,

    /// Wrapped-counter persistence
    pub metrics: MetricsConfig,
}

/// Upstream endpoints. Override these to point at mirrors or test doubles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    /// Listening-statistics service base URL
    pub listenbrainz_url: String,

    /// Music-metadata/relations service base URL
    pub musicbrainz_url: String,

    /// Cover-art service base URL (release endpoint)
    pub coverart_url: String,

    /// Entity-claim service base URL
    pub wikidata_url: String,

    /// Tag/image service endpoint
    pub lastfm_url: String,

    /// Tag/image service API key; absent disables that upstream
    pub lastfm_api_key: Option<String>,

    /// User-agent sent to every upstream
    pub user_agent: String,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            listenbrainz_url: "https://api.listenbrainz.org/1".to_string(),
            musicbrainz_url: "https://musicbrainz.org/ws/2".to_string(),
            coverart_url: "https://coverartarchive.org/release".to_string(),
            wikidata_url: "https://www.wikidata.org/wiki/Special:EntityData".to_string(),
            lastfm_url: "https://ws.audioscrobbler.com/2.0/".to_string(),
            lastfm_api_key: None,
            user_agent: concat!(
                "rewind-fm/",
                env!("CARGO_PKG_VERSION"),
                " (+https://github.com/rewind-fm/rewind-fm)"
            )
            .to_string(),
        }
    }
}

/// Outbound HTTP behaviour shared by all upstream pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Total GET attempts per request (first try + retries)
    pub attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 6,
            attempts: 3,
        }
    }
}

/// Statistics lookups and caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Primary statistics range ("week", "month", "year", "all_time")
    pub range: String,

    /// Statistics cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Statistics cache entry cap
    pub cache_capacity: usize,

    /// Upper bound for requested top-N counts
    pub max_top_results: usize,

    /// Top tracks sampled for the average track length
    pub average_sample_limit: usize,

    /// Average track minutes assumed when nothing resolves
    pub average_track_minutes: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            range: "year".to_string(),
            cache_ttl_secs: 60,
            cache_capacity: 256,
            max_top_results: 15,
            average_sample_limit: 50,
            average_track_minutes: 3.5,
        }
    }
}

/// Artwork queue, waterfall and temporary store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkConfig {
    /// Concurrent image downloads
    pub concurrency: usize,

    /// Admitted requests (waiting or downloading)
    pub queue_limit: usize,

    /// Seconds to wait for a download slot
    pub queue_timeout_secs: u64,

    /// Top artists/releases considered per request
    pub lookup_limit: usize,

    /// Uploaded artwork TTL in seconds
    pub store_ttl_secs: u64,

    /// Uploaded artwork size limit in bytes
    pub store_max_bytes: usize,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            queue_limit: 10,
            queue_timeout_secs: 15,
            lookup_limit: 15,
            store_ttl_secs: 3600,
            store_max_bytes: 6 * 1024 * 1024,
        }
    }
}

/// Human-verification gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Site key served to clients (informational here)
    pub site_key: Option<String>,

    /// Secret key for server-side verification
    pub secret_key: Option<String>,

    /// Provider verify endpoint
    pub verify_url: String,

    /// Verification request timeout in seconds
    pub timeout_secs: u64,

    /// How long passing tokens are remembered, in seconds
    pub cache_ttl_secs: u64,
}

impl VerifyConfig {
    /// The gate is active only when both keys are configured.
    pub fn enabled(&self) -> bool {
        self.site_key.as_deref().is_some_and(|key| !key.is_empty())
            && self.secret_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            site_key: None,
            secret_key: None,
            verify_url: "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string(),
            timeout_secs: 5,
            cache_ttl_secs: 120,
        }
    }
}

/// Per-caller rate limits, by handler group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Default requests per minute
    pub default_per_minute: u32,

    /// Statistics handlers, requests per minute
    pub stats_per_minute: u32,

    /// Image handlers, requests per minute
    pub image_per_minute: u32,

    /// Salt mixed into caller-identity hashing
    pub salt: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_per_minute: 90,
            stats_per_minute: 45,
            image_per_minute: 15,
            salt: String::new(),
        }
    }
}

/// Wrapped-counter persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Counter file location
    pub count_file: PathBuf,

    /// Date the counter started, shown next to the value
    pub count_since: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            count_file: PathBuf::from("data/wrapped-count.txt"),
            count_since: "2025-10-26".to_string(),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rewind-fm"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    // Ensure directory exists
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::CreateDir(dir.clone(), e))?;

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, &path)
        .map_err(|e| ConfigError::Rename(temp_path, path.clone(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[upstreams]"));
        assert!(toml.contains("[http]"));
        assert!(toml.contains("[stats]"));
        assert!(toml.contains("[artwork]"));
        assert!(toml.contains("[limits]"));
        assert!(toml.contains("[metrics]"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.upstreams.lastfm_api_key = Some("test-key-123".to_string());
        config.stats.range = "month".to_string();
        config.artwork.concurrency = 4;

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(
            parsed.upstreams.lastfm_api_key,
            Some("test-key-123".to_string())
        );
        assert_eq!(parsed.stats.range, "month");
        assert_eq!(parsed.artwork.concurrency, 4);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // Config with only some fields
        let toml = r#"
[stats]
range = "all_time"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        // Specified field is set
        assert_eq!(config.stats.range, "all_time");

        // Other fields use defaults
        assert_eq!(config.stats.cache_capacity, 256);
        assert_eq!(config.artwork.queue_limit, 10);
        assert!(config.upstreams.listenbrainz_url.contains("listenbrainz"));
    }

    #[test]
    fn test_verify_enabled_requires_both_keys() {
        let mut verify = VerifyConfig::default();
        assert!(!verify.enabled());

        verify.site_key = Some("site".to_string());
        assert!(!verify.enabled());

        verify.secret_key = Some("secret".to_string());
        assert!(verify.enabled());

        verify.site_key = Some(String::new());
        assert!(!verify.enabled());
    }
}
