//! Outbound HTTP client for the movie metadata source.
//!
//! This is the sole egress point: it owns the concurrency pool, the request
//! rate limit, retry with backoff, the per-attempt timeout and the shared
//! circuit breaker. Every failure leaves here already classified.

use governor::{Quota, RateLimiter as GovernorRateLimiter};
use log::{debug, info, warn};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use crate::shared::config::{BreakerConfig, GatewayConfig};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::mask_secret;

use super::circuit_breaker::CircuitBreaker;
use super::retry_policy::{retry_after_hint, RetryPolicy};

type DirectRateLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

pub struct SourceClient {
    http: Client,
    base_url: String,
    bearer_token: String,
    /// Bounded FIFO pool for outbound calls; shared by every caller.
    pool: Semaphore,
    rate_limiter: DirectRateLimiter,
    retry_policy: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
    attempt_timeout: Duration,
}

impl SourceClient {
    pub fn new(
        base_url: &str,
        bearer_token: &str,
        gateway: &GatewayConfig,
        breaker: BreakerConfig,
    ) -> Self {
        info!(
            "Source client initialized for {} (token {}, pool size {})",
            base_url,
            mask_secret(bearer_token),
            gateway.pool_size
        );

        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
            pool: Semaphore::new(gateway.pool_size),
            rate_limiter: Self::create_rate_limiter(
                gateway.requests_per_second,
                gateway.burst_size,
            ),
            retry_policy: RetryPolicy::new(
                gateway.max_retries,
                gateway.base_delay,
                gateway.max_delay,
            ),
            breaker: Arc::new(CircuitBreaker::new(breaker)),
            attempt_timeout: gateway.attempt_timeout,
        }
    }

    fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> DirectRateLimiter {
        let period = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::MAX
        };

        let burst = NonZeroU32::new(burst_size.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        GovernorRateLimiter::direct(quota)
    }

    /// Issue a request against the source, returning the parsed JSON body.
    ///
    /// Transient failures (network, timeout, 429, 5xx) are retried with
    /// backoff inside the configured budget; other 4xx fail immediately. A
    /// breaker rejection is returned as `CircuitOpen` without any attempt.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<Value> {
        // Queue on the bounded pool before anything else; FIFO wakeup
        let _permit = self
            .pool
            .acquire()
            .await
            .map_err(|_| AppError::Internal("outbound concurrency pool closed".to_string()))?;

        let correlation_id = Uuid::new_v4();
        let url = format!("{}{}", self.base_url, path);
        let mut last_error =
            AppError::Internal(format!("request not attempted [request {}]", correlation_id));

        for attempt in 0..=self.retry_policy.max_retries {
            self.breaker.try_acquire().await.map_err(|e| match e {
                AppError::CircuitOpen(msg) => {
                    AppError::CircuitOpen(format!("{} [request {}]", msg, correlation_id))
                }
                other => other,
            })?;
            self.rate_limiter.until_ready().await;

            let send = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.bearer_token)
                .header("Accept", "application/json")
                .query(params)
                .send();

            let (error, retry_after) = match timeout(self.attempt_timeout, send).await {
                Ok(Ok(response)) => {
                    let status = response.status();

                    if status.is_success() {
                        self.breaker.record_success().await;
                        return self.parse_response(response, correlation_id).await;
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        self.breaker.record_failure().await;
                        let hint = retry_after_hint(response.headers());
                        (
                            AppError::Upstream {
                                status: status.as_u16(),
                                message: format!(
                                    "source returned {} for {} [request {}]",
                                    status, path, correlation_id
                                ),
                            },
                            hint,
                        )
                    } else {
                        // Other 4xx: the source answered, the request is just
                        // wrong; never retried and not held against the breaker
                        self.breaker.record_success().await;
                        return Err(AppError::Upstream {
                            status: status.as_u16(),
                            message: format!(
                                "source returned {} for {} [request {}]",
                                status, path, correlation_id
                            ),
                        });
                    }
                }
                Ok(Err(e)) => {
                    self.breaker.record_failure().await;
                    let classified = match AppError::from(e) {
                        AppError::Timeout(msg) => {
                            AppError::Timeout(format!("{} [request {}]", msg, correlation_id))
                        }
                        AppError::Network(msg) => {
                            AppError::Network(format!("{} [request {}]", msg, correlation_id))
                        }
                        other => other,
                    };
                    (classified, None)
                }
                Err(_) => {
                    self.breaker.record_failure().await;
                    (
                        AppError::Timeout(format!(
                            "attempt exceeded {:?} for {} [request {}]",
                            self.attempt_timeout, path, correlation_id
                        )),
                        None,
                    )
                }
            };

            if attempt < self.retry_policy.max_retries && error.is_retryable() {
                let delay = self.retry_policy.calculate_delay(attempt, retry_after);
                warn!(
                    "Source request {} {} failed (attempt {}/{}): {}. Retrying in {:?}",
                    method,
                    path,
                    attempt + 1,
                    self.retry_policy.max_retries + 1,
                    error,
                    delay
                );
                last_error = error;
                sleep(delay).await;
                continue;
            }

            return Err(error);
        }

        Err(last_error)
    }

    async fn parse_response(&self, response: Response, correlation_id: Uuid) -> AppResult<Value> {
        let body = response.text().await.map_err(|e| {
            AppError::Network(format!(
                "failed to read source response: {} [request {}]",
                e, correlation_id
            ))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            debug!(
                "unparsable source response [request {}]: {}",
                correlation_id, preview
            );
            AppError::Serialization(format!(
                "failed to parse source response: {} [request {}]",
                e, correlation_id
            ))
        })
    }

    /// The breaker shared by all calls on this client.
    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        Arc::clone(&self.breaker)
    }

    /// Check whether a request could run right now (testing/debugging)
    pub fn can_make_request_now(&self) -> bool {
        self.pool.available_permits() > 0 && self.rate_limiter.check().is_ok()
    }
}
