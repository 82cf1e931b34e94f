//! Moving-window rate limiting.
//!
//! The limiter is an explicit object the routing collaborator composes
//! around handlers - nothing here hooks into request dispatch. Callers
//! are keyed by a salted hash of their identity (an address, a session
//! id), so the raw identity never sits in memory as a map key.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// Hex characters kept from the identity hash.
const KEY_LENGTH: usize = 32;

/// Tuning for one limiter.
#[derive(Debug, Clone)]
pub struct RateLimitOptions {
    /// Requests allowed per window
    pub quota: u32,
    /// Window length
    pub window: Duration,
    /// Salt mixed into identity hashing
    pub salt: String,
}

/// Outcome of a limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request admitted; `remaining` may go to the rate-limit headers
    Allowed { remaining: u32 },
    /// Request rejected; retry after the oldest hit leaves the window
    Limited { retry_after: Duration },
}

/// Moving-window request limiter.
pub struct RateLimiter {
    quota: u32,
    window: Duration,
    salt: String,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(options: RateLimitOptions) -> Self {
        Self {
            quota: options.quota.max(1),
            window: options.window,
            salt: options.salt,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `identity` and decide whether it may proceed.
    pub fn check(&self, identity: &str) -> Decision {
        let key = self.hashed_key(identity);
        let now = Instant::now();

        let mut hits = self.hits.lock();
        // Identities whose windows fully drained can go away entirely.
        hits.retain(|_, timestamps| {
            timestamps
                .back()
                .map(|last| now.duration_since(*last) < self.window)
                .unwrap_or(false)
        });

        let timestamps = hits.entry(key).or_default();
        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() as u32 >= self.quota {
            let retry_after = timestamps
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return Decision::Limited { retry_after };
        }

        timestamps.push_back(now);
        Decision::Allowed {
            remaining: self.quota - timestamps.len() as u32,
        }
    }

    fn hashed_key(&self, identity: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        hasher.update(b"|");
        hasher.update(self.salt.as_bytes());
        let digest = hasher.finalize();
        let mut key = String::with_capacity(KEY_LENGTH);
        for byte in digest.iter().take(KEY_LENGTH / 2) {
            key.push_str(&format!("{byte:02x}"));
        }
        key
    }
}
