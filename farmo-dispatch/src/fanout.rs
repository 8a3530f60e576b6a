use std::sync::Arc;
use uuid::Uuid;

use farmo_core::Notifier;
use farmo_shared::ProviderNotification;

/// Sends notifications on a background task. Must be called after the
/// booking change has been committed and its lock released.
pub fn spawn_notifications(notifier: Arc<dyn Notifier>, outbox: Vec<(Uuid, ProviderNotification)>) {
    if outbox.is_empty() {
        return;
    }

    tokio::spawn(async move {
        for (provider_id, notification) in outbox {
            if let Err(e) = notifier.notify(provider_id, &notification).await {
                tracing::warn!(
                    "Failed to notify provider {} about booking {}: {}",
                    provider_id,
                    notification.booking_id(),
                    e
                );
            }
        }
    });
}

pub fn withdrawn(booking_id: &str, providers: Vec<Uuid>, timestamp: i64) -> Vec<(Uuid, ProviderNotification)> {
    providers
        .into_iter()
        .map(|provider_id| {
            (
                provider_id,
                ProviderNotification::RequestWithdrawn {
                    booking_id: booking_id.to_string(),
                    timestamp,
                },
            )
        })
        .collect()
}
