use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use farmo_core::{Booking, BookingStatus, BookingStore, LockedBooking, Notifier, RequestStatus};
use farmo_shared::ProviderNotification;

use crate::error::{DispatchError, DispatchResult};
use crate::fanout::{spawn_notifications, withdrawn};
use crate::lifecycle::BookingLifecycle;

/// Result of a successful decline
#[derive(Debug, Clone, Serialize)]
pub struct DeclineAck {
    pub booking_id: String,
    pub remaining_pending: usize,
    pub booking_status: BookingStatus,
}

/// Processes provider responses and deadline expiry.
///
/// Every operation holds the booking's lock for its whole check-and-write
/// sequence, so at most one accept can ever win. Notifications go out after
/// the commit.
pub struct ResponseCoordinator {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
}

impl ResponseCoordinator {
    pub fn new(store: Arc<dyn BookingStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub(crate) async fn lock(&self, booking_id: &str) -> DispatchResult<Box<dyn LockedBooking>> {
        self.store
            .lock(booking_id)
            .await?
            .ok_or_else(|| DispatchError::BookingNotFound(booking_id.to_string()))
    }

    pub(crate) fn notify(&self, outbox: Vec<(Uuid, ProviderNotification)>) {
        spawn_notifications(self.notifier.clone(), outbox);
    }

    /// Expires the locked booking if its deadline has passed and commits.
    /// Returns `Ok(true)` when it did; the lock is consumed either way.
    pub(crate) async fn expire_locked(&self, mut locked: Box<dyn LockedBooking>) -> DispatchResult<bool> {
        let now = Utc::now();
        let Some(retired) = BookingLifecycle::expire_if_overdue(locked.record_mut(), now) else {
            return Ok(false);
        };
        let booking_id = locked.record().booking.booking_id.clone();
        locked.commit().await?;

        tracing::warn!(
            "Booking {} expired with no acceptance, {} pending requests retired",
            booking_id,
            retired.len()
        );
        self.notify(withdrawn(&booking_id, retired, now.timestamp()));
        Ok(true)
    }

    /// First valid accept wins. Everyone else still pending is retired in
    /// the same commit.
    pub async fn accept(&self, booking_id: &str, provider_id: Uuid) -> DispatchResult<Booking> {
        let now = Utc::now();
        let mut locked = self.lock(booking_id).await?;

        if locked.record().booking.status != BookingStatus::Searching {
            return Err(DispatchError::AlreadyDecided(booking_id.to_string()));
        }
        if locked.record().booking.is_expired_at(now) {
            self.expire_locked(locked).await?;
            return Err(DispatchError::Expired(booking_id.to_string()));
        }

        let retired = BookingLifecycle::assign(locked.record_mut(), provider_id, now)?;
        let booking = locked.record().booking.clone();
        locked.commit().await?;

        tracing::info!(
            "Booking {} assigned to provider {}, {} competing requests withdrawn",
            booking_id,
            provider_id,
            retired.len()
        );

        let mut outbox = vec![(
            provider_id,
            ProviderNotification::BookingAssigned {
                booking_id: booking_id.to_string(),
                timestamp: now.timestamp(),
            },
        )];
        outbox.extend(withdrawn(booking_id, retired, now.timestamp()));
        self.notify(outbox);

        Ok(booking)
    }

    /// Records a decline. When it was the last pending request the booking
    /// expires right away.
    pub async fn decline(&self, booking_id: &str, provider_id: Uuid) -> DispatchResult<DeclineAck> {
        let now = Utc::now();
        let mut locked = self.lock(booking_id).await?;

        if locked.record().booking.is_expired_at(now) {
            self.expire_locked(locked).await?;
            return Err(DispatchError::NoPendingRequest(booking_id.to_string()));
        }
        if locked.record().booking.status != BookingStatus::Searching {
            return Err(DispatchError::NoPendingRequest(booking_id.to_string()));
        }

        let record = locked.record_mut();
        let request = record
            .pending_request_mut(provider_id)
            .ok_or_else(|| DispatchError::NoPendingRequest(booking_id.to_string()))?;
        request.respond(RequestStatus::Declined, now);

        let remaining_pending = record.pending_count();
        if remaining_pending == 0 {
            BookingLifecycle::transition(record, BookingStatus::Expired, now)?;
        }
        let booking_status = record.booking.status;
        locked.commit().await?;

        if booking_status == BookingStatus::Expired {
            tracing::info!("Booking {} expired, every provider declined", booking_id);
        } else {
            tracing::debug!(
                "Provider {} declined booking {}, {} still pending",
                provider_id,
                booking_id,
                remaining_pending
            );
        }

        Ok(DeclineAck {
            booking_id: booking_id.to_string(),
            remaining_pending,
            booking_status,
        })
    }

    /// Expires the booking if it is `Searching` and past its deadline.
    /// Calling it again is a no-op.
    pub async fn expire_if_due(&self, booking_id: &str) -> DispatchResult<bool> {
        let locked = self.lock(booking_id).await?;
        self.expire_locked(locked).await
    }

    /// Expires every overdue booking. Failures on one booking are logged and
    /// do not stop the sweep.
    pub async fn sweep_overdue(&self) -> DispatchResult<usize> {
        let overdue = self.store.overdue_searching(Utc::now()).await?;
        let mut expired = 0;
        for booking_id in overdue {
            match self.expire_if_due(&booking_id).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to expire booking {}: {}", booking_id, e),
            }
        }
        Ok(expired)
    }
}
