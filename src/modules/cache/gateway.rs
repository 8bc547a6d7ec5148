use async_trait::async_trait;
use serde_json::Value;

use crate::shared::errors::AppResult;

/// Key for a cached movie snapshot. Language is part of the key because the
/// source localizes titles and overview text.
pub fn movie_cache_key(source_id: i32, language: &str) -> String {
    format!("movie:{}:{}", source_id, language)
}

#[async_trait]
pub trait CacheGateway: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Value>>;

    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) -> AppResult<()>;

    async fn del(&self, key: &str) -> AppResult<()>;

    /// Drop everything. Meant for tests and operational resets.
    async fn reset(&self) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_cache_key_format() {
        assert_eq!(movie_cache_key(603, "en-US"), "movie:603:en-US");
        assert_eq!(movie_cache_key(1, "fr-FR"), "movie:1:fr-FR");
    }
}
