//! Fixtures shared by the unit tests of this crate.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use farmo_core::{Booking, BookingRecord, BookingStatus, InstantBookingRequest, Notifier, PriceUnit, RepoResult};
use farmo_shared::ProviderNotification;

/// Forwards every notification to a channel so tests can await them.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<(Uuid, ProviderNotification)>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Uuid, ProviderNotification)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, provider_id: Uuid, notification: &ProviderNotification) -> RepoResult<()> {
        self.tx.send((provider_id, notification.clone()))?;
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _provider_id: Uuid, _notification: &ProviderNotification) -> RepoResult<()> {
        Err("push gateway unreachable".into())
    }
}

/// Collects `count` notifications or gives up after a second.
pub async fn collect(
    rx: &mut mpsc::UnboundedReceiver<(Uuid, ProviderNotification)>,
    count: usize,
) -> Vec<(Uuid, ProviderNotification)> {
    let mut received = Vec::new();
    while received.len() < count {
        match tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv()).await {
            Ok(Some(item)) => received.push(item),
            _ => break,
        }
    }
    received
}

/// A `Searching` booking at (0, 0) with one pending round-1 request per provider.
pub fn searching_record(providers: &[Uuid]) -> BookingRecord {
    let now = Utc::now();
    let booking = Booking {
        booking_id: Booking::generate_id(),
        order_number: Booking::order_number_for(now, 1),
        customer_id: Uuid::new_v4(),
        category_id: Uuid::new_v4(),
        category_slug: "tractor".to_string(),
        provider_id: None,
        status: BookingStatus::Searching,
        address: "Near gram panchayat office".to_string(),
        lat: 0.0,
        lng: 0.0,
        quantity: 2,
        unit_price: 60_000,
        price_unit: PriceUnit::Hour,
        total_amount: 120_000,
        note: None,
        broadcast_count: 1,
        current_broadcast_radius_km: Some(15.0),
        start_job_otp: None,
        end_job_otp: None,
        cancellation_reason: None,
        cancelled_by: None,
        created_at: now,
        updated_at: now,
        expires_at: now + Duration::minutes(10),
        assigned_at: None,
        work_started_at: None,
        work_completed_at: None,
    };
    let requests = providers
        .iter()
        .map(|p| InstantBookingRequest::new(booking.booking_id.clone(), *p, 3.0, 1, booking.expires_at, now))
        .collect();
    BookingRecord::new(booking, requests)
}
