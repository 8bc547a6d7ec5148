//! Circuit breaker guarding the outbound source client.
//!
//! Closed: calls flow, outcomes feed a rolling window. Open: calls are
//! rejected immediately until the reset timeout elapses. HalfOpen: exactly
//! one probe call is allowed; its outcome decides between Closed and a fresh
//! Open period.

use log::{info, warn};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::shared::config::BreakerConfig;
use crate::shared::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
enum State {
    Closed,
    Open { until: Instant },
    HalfOpen { probe_in_flight: bool },
}

#[derive(Debug)]
struct Inner {
    state: State,
    successes: u32,
    failures: u32,
    window_start: Instant,
}

impl Inner {
    fn roll_window(&mut self, window: Duration) {
        if self.window_start.elapsed() > window {
            self.successes = 0;
            self.failures = 0;
            self.window_start = Instant::now();
        }
    }

    fn reset_counters(&mut self) {
        self.successes = 0;
        self.failures = 0;
        self.window_start = Instant::now();
    }
}

pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: State::Closed,
                successes: 0,
                failures: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Gate a call. `Err(CircuitOpen)` means the call must not be attempted;
    /// `Ok` in the half-open state grants the single probe slot.
    pub async fn try_acquire(&self) -> AppResult<()> {
        let mut inner = self.inner.lock().await;

        match inner.state {
            State::Closed => Ok(()),
            State::Open { until } => {
                if Instant::now() >= until {
                    inner.state = State::HalfOpen {
                        probe_in_flight: true,
                    };
                    info!("circuit breaker half-open, allowing probe call");
                    Ok(())
                } else {
                    Err(AppError::CircuitOpen(
                        "source circuit breaker is open, rejecting call".to_string(),
                    ))
                }
            }
            State::HalfOpen { probe_in_flight } => {
                if probe_in_flight {
                    Err(AppError::CircuitOpen(
                        "source circuit breaker is half-open, probe in flight".to_string(),
                    ))
                } else {
                    inner.state = State::HalfOpen {
                        probe_in_flight: true,
                    };
                    Ok(())
                }
            }
        }
    }

    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;

        match inner.state {
            State::HalfOpen { .. } => {
                info!("circuit breaker probe succeeded, closing circuit");
                inner.state = State::Closed;
                inner.reset_counters();
            }
            _ => {
                inner.roll_window(self.config.window);
                inner.successes += 1;
            }
        }
    }

    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;

        match inner.state {
            State::HalfOpen { .. } => {
                warn!(
                    "circuit breaker probe failed, reopening for {:?}",
                    self.config.reset_timeout
                );
                inner.state = State::Open {
                    until: Instant::now() + self.config.reset_timeout,
                };
                inner.reset_counters();
            }
            State::Open { .. } => {}
            State::Closed => {
                inner.roll_window(self.config.window);
                inner.failures += 1;

                let total = inner.successes + inner.failures;
                if total >= self.config.volume_threshold {
                    let error_rate = inner.failures as f32 / total as f32 * 100.0;
                    if error_rate >= self.config.error_rate_threshold {
                        warn!(
                            "circuit breaker tripped: {:.1}% errors over {} calls, open for {:?}",
                            error_rate, total, self.config.reset_timeout
                        );
                        inner.state = State::Open {
                            until: Instant::now() + self.config.reset_timeout,
                        };
                        inner.reset_counters();
                    }
                }
            }
        }
    }

    pub async fn state(&self) -> BreakerState {
        let inner = self.inner.lock().await;
        match inner.state {
            State::Closed => BreakerState::Closed,
            State::Open { .. } => BreakerState::Open,
            State::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }
}
