pub mod circuit_breaker;
pub mod client;
pub mod gateway;
pub mod retry_policy;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use client::SourceClient;
pub use gateway::{MetadataGateway, SourceGateway};
pub use retry_policy::RetryPolicy;
