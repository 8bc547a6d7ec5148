pub mod config;
pub mod database;
pub mod errors;
pub mod utils;

pub use config::{AppConfig, BreakerConfig, GatewayConfig};
pub use database::{Database, DbConnection, DbPool};
pub use errors::{AppError, AppResult};
