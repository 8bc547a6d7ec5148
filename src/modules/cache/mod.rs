pub mod gateway;
pub mod memory;
pub mod redis_cache;

pub use gateway::{movie_cache_key, CacheGateway};
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
