pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod catalog_repo;
pub mod redis_repo;
pub mod memory;

pub use database::DbClient;
pub use booking_repo::PgBookingStore;
pub use catalog_repo::{PgCategoryCatalog, PgProviderDirectory};
pub use redis_repo::{RedisClient, RedisNotifier};
pub use memory::{InMemoryBookingStore, InMemoryCategoryCatalog, InMemoryProviderDirectory};
