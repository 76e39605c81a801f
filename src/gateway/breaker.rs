use crate::config::CircuitBreakerConfig;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
enum State {
    Closed { failures: u32 },
    Open { until: Instant },
    /// One trial call is in flight; another is allowed if it never reports back.
    HalfOpen { since: Instant },
}

/// Stops calling the scoring service after repeated failures.
///
/// Closed counts consecutive failures; reaching `failure_threshold` opens the
/// breaker for `open_duration`, during which calls are refused. The first call
/// after that is a trial: success closes the breaker, failure reopens it.
pub struct CircuitBreaker {
    enabled: bool,
    failure_threshold: u32,
    open_duration: Duration,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            enabled: config.enabled,
            failure_threshold: config.failure_threshold.max(1),
            open_duration: Duration::from_secs(config.open_duration_seconds),
            state: Mutex::new(State::Closed { failures: 0 }),
        }
    }

    /// Whether a call may go out now.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn record_success(&self) {
        if !self.enabled {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if matches!(*state, State::HalfOpen { .. }) {
            info!("Model service recovered, closing circuit breaker");
        }
        *state = State::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .map(|state| !matches!(*state, State::Closed { .. }))
            .unwrap_or(false)
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }
        let Ok(mut state) = self.state.lock() else {
            return true;
        };

        match *state {
            State::Closed { .. } => true,
            State::Open { until } if now < until => false,
            State::HalfOpen { since } if now.duration_since(since) < self.open_duration => false,
            State::Open { .. } | State::HalfOpen { .. } => {
                *state = State::HalfOpen { since: now };
                true
            }
        }
    }

    fn record_failure_at(&self, now: Instant) {
        if !self.enabled {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        let failures = match *state {
            State::Closed { failures } => failures + 1,
            State::HalfOpen { .. } => self.failure_threshold,
            State::Open { .. } => return,
        };

        if failures >= self.failure_threshold {
            warn!(
                "Opening circuit breaker for {}s after {} model service failures",
                self.open_duration.as_secs(),
                failures
            );
            *state = State::Open {
                until: now + self.open_duration,
            };
        } else {
            *state = State::Closed { failures };
        }
    }
}
