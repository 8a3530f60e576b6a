use std::sync::Arc;
use std::net::SocketAddr;
use farmo_api::{app, worker, AppState, AuthConfig};
use farmo_core::{BookingStore, CategoryCatalog, LogNotifier, Notifier, ProviderDirectory};
use farmo_dispatch::InstantBookingService;
use farmo_store::app_config::{Config, StorageBackend};
use farmo_store::{
    DbClient, InMemoryBookingStore, InMemoryCategoryCatalog, InMemoryProviderDirectory, PgBookingStore,
    PgCategoryCatalog, PgProviderDirectory, RedisClient, RedisNotifier,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farmo_api=debug,farmo_dispatch=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Farmo dispatch API on port {}", config.server.port);

    // Redis Connection
    let redis = match &config.redis.url {
        Some(url) => Some(Arc::new(RedisClient::new(url).await?)),
        None => {
            tracing::warn!("No Redis configured, rate limiting disabled");
            None
        }
    };

    let notifier: Arc<dyn Notifier> = match (&redis, config.dispatch.redis_notifications) {
        (Some(redis), true) => Arc::new(RedisNotifier::new(
            redis.as_ref().clone(),
            &config.dispatch.notification_channel_prefix,
        )),
        _ => Arc::new(LogNotifier),
    };

    let (catalog, directory, store): (Arc<dyn CategoryCatalog>, Arc<dyn ProviderDirectory>, Arc<dyn BookingStore>) =
        match config.storage.backend {
            StorageBackend::Postgres => {
                let db = DbClient::new(&config.database.url, config.database.max_connections).await?;
                db.migrate().await?;
                (
                    Arc::new(PgCategoryCatalog::new(db.pool.clone())),
                    Arc::new(PgProviderDirectory::new(db.pool.clone())),
                    Arc::new(PgBookingStore::new(db.pool.clone())),
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, bookings are lost on restart");
                (
                    Arc::new(InMemoryCategoryCatalog::new()),
                    Arc::new(InMemoryProviderDirectory::new()),
                    Arc::new(InMemoryBookingStore::new()),
                )
            }
        };

    let service = Arc::new(InstantBookingService::new(catalog, directory, store, notifier));

    let app_state = AppState::new(
        service.clone(),
        redis,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    );

    tokio::spawn(worker::start_expiry_worker(
        service.coordinator(),
        config.dispatch.sweep_interval_seconds,
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>()
    ).await?;

    Ok(())
}
