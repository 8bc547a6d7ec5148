//! Typed surface over the metadata source endpoints.
//!
//! Callers depend on [`MetadataGateway`]; the concrete [`SourceGateway`]
//! routes through [`SourceClient`], which enforces concurrency, rate limit,
//! retries and the circuit breaker.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use crate::shared::errors::AppResult;

use super::client::SourceClient;

#[async_trait]
pub trait MetadataGateway: Send + Sync {
    /// Fetch the full movie record, keywords included, in one call.
    async fn fetch_movie(&self, source_id: i32, language: &str) -> AppResult<Value>;

    async fn search_movies(&self, query: &str, page: u32, language: &str) -> AppResult<Value>;

    async fn popular(&self, page: u32, language: &str) -> AppResult<Value>;

    async fn trending(&self, page: u32, language: &str) -> AppResult<Value>;
}

pub struct SourceGateway {
    client: Arc<SourceClient>,
}

impl SourceGateway {
    pub fn new(client: Arc<SourceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetadataGateway for SourceGateway {
    async fn fetch_movie(&self, source_id: i32, language: &str) -> AppResult<Value> {
        self.client
            .request(
                Method::GET,
                &format!("/movie/{}", source_id),
                &[
                    ("language", language.to_string()),
                    ("append_to_response", "keywords".to_string()),
                ],
            )
            .await
    }

    async fn search_movies(&self, query: &str, page: u32, language: &str) -> AppResult<Value> {
        self.client
            .request(
                Method::GET,
                "/search/movie",
                &[
                    ("query", query.to_string()),
                    ("page", page.to_string()),
                    ("language", language.to_string()),
                ],
            )
            .await
    }

    async fn popular(&self, page: u32, language: &str) -> AppResult<Value> {
        self.client
            .request(
                Method::GET,
                "/movie/popular",
                &[
                    ("page", page.to_string()),
                    ("language", language.to_string()),
                ],
            )
            .await
    }

    async fn trending(&self, page: u32, language: &str) -> AppResult<Value> {
        self.client
            .request(
                Method::GET,
                "/trending/movie/day",
                &[
                    ("page", page.to_string()),
                    ("language", language.to_string()),
                ],
            )
            .await
    }
}
