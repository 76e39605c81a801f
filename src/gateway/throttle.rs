use crate::config::{MAX_THROTTLE_MINUTES, ThrottlingConfig};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

struct Attempts {
    count: u32,
    window_start: Instant,
}

#[derive(Default)]
struct Inner {
    attempts: HashMap<String, Attempts>,
    blocked_until: HashMap<String, Instant>,
    next_sweep: Option<Instant>,
}

impl Inner {
    /// Drop closed windows and lapsed blocks, at most once per window.
    fn sweep(&mut self, now: Instant, window: Duration) {
        if self.next_sweep.is_some_and(|at| now < at) {
            return;
        }
        self.attempts
            .retain(|_, attempts| now.duration_since(attempts.window_start) < window);
        self.blocked_until.retain(|_, until| *until > now);
        self.next_sweep = Some(now + window);
    }
}

/// Blocks client IPs that trip the detector too often.
///
/// Attempts are counted in a window opened by the first attempt; reaching
/// `max_attempts` inside the window blocks the IP for `block_duration`.
pub struct IpThrottle {
    enabled: bool,
    max_attempts: u32,
    window: Duration,
    block_duration: Duration,
    inner: Mutex<Inner>,
}

impl IpThrottle {
    pub fn new(config: &ThrottlingConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_attempts: config.max_attempts,
            window: minutes(config.time_window_minutes),
            block_duration: minutes(config.block_duration_minutes),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn is_blocked(&self, ip: &str) -> bool {
        self.is_blocked_at(ip, Instant::now())
    }

    /// Returns true when this attempt put the IP on the blocklist.
    pub fn record_failed_attempt(&self, ip: &str) -> bool {
        self.record_failed_attempt_at(ip, Instant::now())
    }

    fn is_blocked_at(&self, ip: &str, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };

        match inner.blocked_until.get(ip).copied() {
            Some(until) if until > now => true,
            Some(_) => {
                inner.blocked_until.remove(ip);
                false
            }
            None => false,
        }
    }

    fn record_failed_attempt_at(&self, ip: &str, now: Instant) -> bool {
        if !self.enabled {
            return false;
        }
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };

        let window = self.window;
        inner.sweep(now, window);

        let attempts = inner
            .attempts
            .entry(ip.to_string())
            .or_insert(Attempts {
                count: 0,
                window_start: now,
            });
        if now.duration_since(attempts.window_start) >= window {
            attempts.count = 0;
            attempts.window_start = now;
        }
        attempts.count += 1;

        if attempts.count < self.max_attempts {
            return false;
        }

        warn!(
            "Throttling threshold reached for IP {}. Blocking for {} minutes.",
            ip,
            self.block_duration.as_secs() / 60
        );
        inner.attempts.remove(ip);
        inner
            .blocked_until
            .insert(ip.to_string(), now + self.block_duration);
        true
    }
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.min(MAX_THROTTLE_MINUTES) * 60)
}
