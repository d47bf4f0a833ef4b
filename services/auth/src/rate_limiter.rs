//! Rate limiter for preventing brute force attacks on login

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Rate limiter configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    #[serde(rename = "ban_seconds")]
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

impl RateLimiterConfig {
    /// Create a new RateLimiterConfig from environment variables
    ///
    /// # Environment Variables
    /// - `LOGIN_MAX_ATTEMPTS` (default: 5, at least 1)
    /// - `LOGIN_WINDOW_SECONDS` (default: 300)
    /// - `LOGIN_BAN_SECONDS` (default: 3600)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Config::builder()
            .set_default("max_attempts", i64::from(defaults.max_attempts))?
            .set_default("window_seconds", defaults.window_seconds)?
            .set_default("ban_seconds", defaults.ban_duration_seconds)?
            .add_source(Environment::with_prefix("LOGIN").try_parsing(true))
            .build()?;

        let config: Self = config.try_deserialize()?;
        if config.max_attempts == 0 {
            anyhow::bail!("LOGIN_MAX_ATTEMPTS must be at least 1");
        }

        Ok(config)
    }
}

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Number of attempts
    attempts: u32,
    /// Last attempt time
    last_attempt: Instant,
    /// Ban expiration time
    ban_expires: Option<Instant>,
}

#[derive(Debug)]
struct Entries {
    by_key: HashMap<String, RateLimiterEntry>,
    last_sweep: Instant,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<Entries>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(Entries {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    /// An entry whose window has passed and which carries no running ban
    /// behaves exactly like a missing one
    fn is_stale(&self, entry: &RateLimiterEntry, now: Instant) -> bool {
        entry.ban_expires.is_none_or(|ban_expires| now >= ban_expires)
            && now.duration_since(entry.last_attempt) >= self.window()
    }

    /// Record an attempt for `key` and tell whether it may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        // at most one sweep per window
        if now.duration_since(entries.last_sweep) >= self.window() {
            let before = entries.by_key.len();
            entries.by_key.retain(|_, entry| !self.is_stale(entry, now));
            entries.last_sweep = now;
            debug!(
                "Rate limiter dropped {} stale entries",
                before - entries.by_key.len()
            );
        }

        let entry = entries
            .by_key
            .entry(key.to_string())
            .or_insert(RateLimiterEntry {
                attempts: 0,
                last_attempt: now,
                ban_expires: None,
            });

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entry.attempts = 0;
                entry.ban_expires = None;
            } else {
                return false;
            }
        }

        if now.duration_since(entry.last_attempt) >= self.window() {
            entry.attempts = 0;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Banned key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        entry.last_attempt = now;

        true
    }

    /// Forget the attempts recorded for `key`
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.by_key.remove(key);
    }
}
