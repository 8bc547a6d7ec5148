pub mod modules;
pub mod schema;
pub mod shared;

use std::sync::Arc;

use modules::{
    cache::{CacheGateway, MemoryCache, RedisCache},
    jobs::{InMemoryJobRegistry, JobRegistry, JobService},
    movie::{
        infrastructure::MovieRepositoryImpl, MovieRepository, MovieService,
    },
    provider::{MetadataGateway, SourceClient, SourceGateway},
    sync::SyncService,
};
use shared::{AppConfig, AppResult, Database};

/// Fully wired service graph. Construct once at startup and share.
pub struct AppServices {
    pub movies: Arc<MovieService>,
    pub sync: Arc<SyncService>,
    pub jobs: Arc<JobService>,
    pub cache: Arc<dyn CacheGateway>,
}

impl AppServices {
    /// Wire every service from configuration. Runs pending migrations, so the
    /// store is usable as soon as this returns.
    pub async fn initialize(config: AppConfig) -> AppResult<Self> {
        shared::utils::init_logger();

        let database = Arc::new(Database::new(&config.database_url)?);
        database.run_migrations()?;

        let client = Arc::new(SourceClient::new(
            &config.source_base_url,
            &config.source_api_token,
            &config.gateway,
            config.breaker.clone(),
        ));
        let gateway: Arc<dyn MetadataGateway> = Arc::new(SourceGateway::new(client));

        let repository: Arc<dyn MovieRepository> =
            Arc::new(MovieRepositoryImpl::new(Arc::clone(&database)));

        let cache: Arc<dyn CacheGateway> = match &config.redis_url {
            Some(url) => Arc::new(RedisCache::new(url)?),
            None => Arc::new(MemoryCache::new()),
        };

        let sync = Arc::new(SyncService::new(
            Arc::clone(&gateway),
            Arc::clone(&repository),
            Arc::clone(&cache),
        ));

        let movies = Arc::new(MovieService::new(
            Arc::clone(&repository),
            Arc::clone(&cache),
            Arc::clone(&sync),
            config.staleness_threshold_days,
            config.default_cache_ttl_secs,
        ));

        let registry: Arc<dyn JobRegistry> = Arc::new(InMemoryJobRegistry::new());
        let jobs = Arc::new(JobService::new(
            registry,
            Arc::clone(&sync),
            config.default_cache_ttl_secs,
        ));

        Ok(Self {
            movies,
            sync,
            jobs,
            cache,
        })
    }
}
