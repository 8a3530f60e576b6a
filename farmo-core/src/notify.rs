use async_trait::async_trait;
use farmo_shared::ProviderNotification;
use uuid::Uuid;

use crate::repository::RepoResult;

/// Outbound channel to provider apps. Delivery is best effort; callers log
/// failures and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, provider_id: Uuid, notification: &ProviderNotification) -> RepoResult<()>;
}

/// Notifier that only writes to the log. Used when no broker is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, provider_id: Uuid, notification: &ProviderNotification) -> RepoResult<()> {
        tracing::info!(
            "Provider {} notified about booking {}",
            provider_id,
            notification.booking_id()
        );
        Ok(())
    }
}
