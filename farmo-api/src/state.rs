use std::sync::Arc;
use farmo_dispatch::{InstantBookingService, ResponseCoordinator};
use farmo_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InstantBookingService>,
    pub coordinator: Arc<ResponseCoordinator>,
    /// Rate limiting is skipped without Redis.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(service: Arc<InstantBookingService>, redis: Option<Arc<RedisClient>>, auth: AuthConfig) -> Self {
        Self {
            coordinator: service.coordinator(),
            service,
            redis,
            auth,
        }
    }
}
