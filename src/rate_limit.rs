//! Per-client fixed-window rate limiting for the lead route.
//!
//! Each client identifier owns a [`RateWindowEntry`]. A request opens a new
//! window when none exists or the current one is older than the window length;
//! otherwise it increments the counter and is allowed while the count stays
//! within the limit. The increment happens even for denied requests.
//!
//! The table lives in a bounded moka cache: entries expire one window after
//! their last update, which is indistinguishable from a window reset, and the
//! total number of tracked clients is capped.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use moka::sync::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Requests allowed per client per window.
pub const MAX_REQUESTS: u32 = 10;
/// Window length.
pub const WINDOW: Duration = Duration::from_secs(60);
/// Upper bound on tracked client identifiers.
pub const MAX_TRACKED_CLIENTS: u64 = 100_000;

/// Decides whether a client may issue another request.
pub trait RateLimiter: Send + Sync {
    /// Records one request for `client_id` and returns whether it is allowed.
    fn allow(&self, client_id: &str) -> bool;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Request count for one client within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindowEntry {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

/// In-process fixed-window limiter.
pub struct FixedWindowLimiter {
    entries: Cache<String, RateWindowEntry>,
    max_requests: u32,
    window: ChronoDuration,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// 10 requests per 60 seconds on the system clock.
    pub fn new() -> Self {
        Self::with_limits(MAX_REQUESTS, WINDOW)
    }

    pub fn with_limits(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder()
            .time_to_live(window)
            .max_capacity(MAX_TRACKED_CLIENTS)
            .build();

        Self {
            entries,
            max_requests,
            window: ChronoDuration::from_std(window).unwrap_or(ChronoDuration::MAX),
            clock,
        }
    }

    /// Current entry for a client, if one is tracked.
    pub fn entry(&self, client_id: &str) -> Option<RateWindowEntry> {
        self.entries.get(client_id)
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self, client_id: &str) -> bool {
        let now = self.clock.now();
        let window = self.window;

        // Upserts on the same key are serialized, so check-and-increment is atomic.
        let entry = self
            .entries
            .entry(client_id.to_string())
            .and_upsert_with(|existing| match existing.map(|e| e.into_value()) {
                Some(current) if now - current.window_start <= window => RateWindowEntry {
                    count: current.count.saturating_add(1),
                    window_start: current.window_start,
                },
                _ => RateWindowEntry {
                    count: 1,
                    window_start: now,
                },
            })
            .into_value();

        let allowed = entry.count <= self.max_requests;
        if !allowed {
            tracing::warn!(
                "Rate limit exceeded for client {} ({} requests in current window)",
                client_fingerprint(client_id),
                entry.count
            );
        }
        allowed
    }
}

/// Short SHA-256 fingerprint of a client identifier, for logs.
pub fn client_fingerprint(client_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_id.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}
