use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use farmo_dispatch::ResponseCoordinator;

/// Periodically expires instant bookings whose deadline passed without an
/// acceptance. Reads expire lazily anyway; the sweep keeps stored statuses
/// and provider inboxes current when nobody is polling.
pub async fn start_expiry_worker(coordinator: Arc<ResponseCoordinator>, every_seconds: u64) {
    let mut ticker = interval(Duration::from_secs(every_seconds.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Expiry worker started, sweeping every {}s", every_seconds.max(1));

    loop {
        ticker.tick().await;
        match coordinator.sweep_overdue().await {
            Ok(0) => debug!("Expiry sweep found nothing overdue"),
            Ok(expired) => info!("Expiry sweep expired {} bookings", expired),
            Err(e) => error!("Expiry sweep failed: {}", e),
        }
    }
}
