use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::mask_secret;
use std::env;
use std::time::Duration;

/// Tuning for the outbound gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Fixed size of the outbound concurrency pool.
    pub pool_size: usize,
    /// Sustained request rate toward the source.
    pub requests_per_second: f64,
    pub burst_size: u32,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Budget for a single attempt, independent of the breaker timeout.
    pub attempt_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            requests_per_second: 4.0,
            burst_size: 8,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

/// Tuning for the gateway circuit breaker.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Error percentage (0-100) that trips the breaker.
    pub error_rate_threshold: f32,
    /// Minimum calls inside the rolling window before the rate is evaluated.
    pub volume_threshold: u32,
    /// How long the breaker stays open before allowing a probe.
    pub reset_timeout: Duration,
    /// Width of the rolling window over which the error rate is computed.
    pub window: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            error_rate_threshold: 50.0,
            volume_threshold: 10,
            reset_timeout: Duration::from_secs(30),
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub source_base_url: String,
    pub source_api_token: String,
    /// When set, the Redis adapter is used instead of the in-memory cache.
    pub redis_url: Option<String>,
    /// Age in days beyond which a stored movie triggers a background resync.
    pub staleness_threshold_days: i64,
    pub default_cache_ttl_secs: u64,
    pub gateway: GatewayConfig,
    pub breaker: BreakerConfig,
}

impl AppConfig {
    /// Load configuration from the environment, with validated defaults.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").map_err(|_| {
            AppError::Validation("DATABASE_URL environment variable not found".to_string())
        })?;
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            return Err(AppError::Validation(
                "Invalid database URL format. Must start with postgres:// or postgresql://"
                    .to_string(),
            ));
        }

        let source_api_token = env::var("SOURCE_API_TOKEN").map_err(|_| {
            AppError::Validation("SOURCE_API_TOKEN environment variable not found".to_string())
        })?;

        let source_base_url = env::var("SOURCE_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());

        let config = Self {
            database_url,
            source_base_url,
            source_api_token,
            redis_url: env::var("REDIS_URL").ok(),
            staleness_threshold_days: env_parse("STALENESS_THRESHOLD_DAYS", 7),
            default_cache_ttl_secs: env_parse("DEFAULT_CACHE_TTL_SECS", 3600),
            gateway: GatewayConfig {
                pool_size: env_parse("GATEWAY_POOL_SIZE", 8),
                max_retries: env_parse("GATEWAY_MAX_RETRIES", 3),
                ..GatewayConfig::default()
            },
            breaker: BreakerConfig::default(),
        };

        log::info!(
            "Configuration loaded: source {} (token {})",
            config.source_base_url,
            mask_secret(&config.source_api_token)
        );

        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
