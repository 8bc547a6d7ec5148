use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use serde_json::Value;
use std::sync::Arc;

use crate::shared::errors::{AppError, AppResult};

use super::gateway::CacheGateway;

pub struct RedisCache {
    client: Arc<Client>,
}

impl RedisCache {
    pub fn new(redis_url: &str) -> AppResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::Cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    async fn connection(&self) -> AppResult<redis::aio::Connection> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| AppError::Cache(format!("Redis connection failed: {}", e)))
    }
}

#[async_trait]
impl CacheGateway for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let mut conn = self.connection().await?;

        // Be explicit about the expected return type from Redis:
        let data: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to get from cache: {}", e)))?;

        match data {
            Some(json) => {
                let value = serde_json::from_str(&json)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // seconds must be u64 for `SETEX`
    async fn set(&self, key: &str, value: &Value, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(value)?;

        // Make the return type explicit to avoid never-type fallback
        let _: () = conn
            .set_ex::<_, _, ()>(key, json, ttl_secs)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to set cache: {}", e)))?;

        Ok(())
    }

    async fn del(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;

        // `DEL` returns the deleted count; we don't need it here
        let _: () = conn
            .del::<_, ()>(key)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to delete from cache: {}", e)))?;

        Ok(())
    }

    async fn reset(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;

        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to flush cache: {}", e)))?;

        Ok(())
    }
}
