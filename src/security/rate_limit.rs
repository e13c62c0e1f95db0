//! Fixed-window rate limiting keyed by client identity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Request count for one client within the current window.
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

impl WindowEntry {
    fn fresh(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) > window
    }

    fn try_admit(&mut self, now: Instant, window: Duration, max_requests: u32) -> bool {
        if self.is_expired(now, window) {
            *self = Self::fresh(now);
            true
        } else if self.count < max_requests {
            self.count += 1;
            true
        } else {
            // Rejections leave the count alone.
            false
        }
    }
}

/// Per-key fixed-window counter.
///
/// Keys live in a sharded map; the shard lock is held across lookup and
/// update, so concurrent admissions for one key never overshoot the limit.
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Admit or reject one request from `key`.
    pub fn admit(&self, key: &str) -> bool {
        self.admit_at(key, Instant::now())
    }

    /// Admit or reject one request from `key` observed at `now`.
    pub fn admit_at(&self, key: &str, now: Instant) -> bool {
        // Existing keys are updated without allocating.
        if let Some(mut entry) = self.entries.get_mut(key) {
            return entry.try_admit(now, self.window, self.max_requests);
        }

        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                occupied
                    .get_mut()
                    .try_admit(now, self.window, self.max_requests)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(WindowEntry::fresh(now));
                true
            }
        }
    }

    /// Drop entries whose window has expired. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_expired(now, self.window));
        before.saturating_sub(self.entries.len())
    }

    /// Number of clients currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Periodically evicts stale entries until shutdown.
pub struct RateLimitSweeper {
    limiter: Arc<RateLimiter>,
    interval: Duration,
}

impl RateLimitSweeper {
    pub fn new(limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        Self { limiter, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Rate limit sweeper starting");

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.limiter.sweep();
                    let remaining = self.limiter.len();
                    metrics::record_rate_limit_entries(remaining);
                    tracing::debug!(removed, remaining, "Swept rate limit entries");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
