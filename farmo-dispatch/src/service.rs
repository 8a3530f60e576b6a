use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use farmo_core::geo::validate_coordinates;
use farmo_core::{
    Booking, BookingRecord, BookingStatus, BookingStore, CategoryCatalog, InstantBookingRequest, Notifier,
    PendingInstantRequest, ProviderDirectory,
};
use farmo_shared::{InstantBookingSummary, ProviderNotification};

use crate::broadcast::BroadcastEngine;
use crate::coordinator::{DeclineAck, ResponseCoordinator};
use crate::error::{DispatchError, DispatchResult};
use crate::fanout::withdrawn;
use crate::lifecycle::BookingLifecycle;

/// Customer input for a new instant booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstantBooking {
    pub category_slug: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub address: String,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

/// Quantities are stored in a signed 32-bit column.
const MAX_QUANTITY: u32 = i32::MAX as u32;

impl CreateInstantBooking {
    fn validate(&self) -> DispatchResult<()> {
        if self.category_slug.trim().is_empty() {
            return Err(DispatchError::InvalidRequest("category_slug is required".to_string()));
        }
        if self.quantity == 0 {
            return Err(DispatchError::InvalidRequest("quantity must be at least 1".to_string()));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(DispatchError::InvalidRequest(format!("quantity must be at most {}", MAX_QUANTITY)));
        }
        if self.address.trim().is_empty() {
            return Err(DispatchError::InvalidRequest("address is required".to_string()));
        }
        validate_coordinates(self.lat, self.lng)?;
        Ok(())
    }
}

/// Outcome of widening the search radius
#[derive(Debug, Clone, Serialize)]
pub struct WidenOutcome {
    pub booking: Booking,
    pub newly_notified: usize,
}

/// Entry point for the instant booking flow.
pub struct InstantBookingService {
    catalog: Arc<dyn CategoryCatalog>,
    store: Arc<dyn BookingStore>,
    broadcaster: BroadcastEngine,
    coordinator: Arc<ResponseCoordinator>,
}

impl InstantBookingService {
    pub fn new(
        catalog: Arc<dyn CategoryCatalog>,
        directory: Arc<dyn ProviderDirectory>,
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            catalog,
            broadcaster: BroadcastEngine::new(directory),
            coordinator: Arc::new(ResponseCoordinator::new(store.clone(), notifier)),
            store,
        }
    }

    pub fn coordinator(&self) -> Arc<ResponseCoordinator> {
        self.coordinator.clone()
    }

    /// Creates the booking, broadcasts it and persists both in one write.
    /// With nobody in range the booking is stored as `Expired` and the call
    /// fails with `NoProvidersNearby`.
    pub async fn create_instant_booking(
        &self,
        customer_id: Uuid,
        input: CreateInstantBooking,
    ) -> DispatchResult<Booking> {
        input.validate()?;

        let category = self
            .catalog
            .find_by_slug(&input.category_slug)
            .await?
            .ok_or_else(|| DispatchError::CategoryNotFound(input.category_slug.clone()))?;
        if !category.instant_enabled {
            return Err(DispatchError::InstantDisabled(category.slug));
        }
        let unit_price = category
            .effective_instant_price()
            .ok_or_else(|| DispatchError::PriceUnset(category.slug.clone()))?;
        let total_amount = unit_price
            .checked_mul(i64::from(input.quantity))
            .ok_or_else(|| DispatchError::InvalidRequest("total amount out of range".to_string()))?;

        let now = Utc::now();
        let sequence = self.store.next_order_sequence(now.date_naive()).await?;

        let booking = Booking {
            booking_id: Booking::generate_id(),
            order_number: Booking::order_number_for(now, sequence),
            customer_id,
            category_id: category.id,
            category_slug: category.slug.clone(),
            provider_id: None,
            status: BookingStatus::Searching,
            address: input.address.trim().to_string(),
            lat: input.lat,
            lng: input.lng,
            quantity: input.quantity,
            unit_price,
            price_unit: category.instant_price_unit,
            total_amount,
            note: input.note.filter(|n| !n.trim().is_empty()),
            broadcast_count: 0,
            current_broadcast_radius_km: None,
            start_job_otp: None,
            end_job_otp: None,
            cancellation_reason: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
            expires_at: BookingLifecycle::compute_expiry(now, &category),
            assigned_at: None,
            work_started_at: None,
            work_completed_at: None,
        };
        let mut record = BookingRecord::new(booking, Vec::new());

        let requests = self
            .broadcaster
            .broadcast_round(&mut record, category.instant_search_radius_km, now)
            .await?;

        if requests.is_empty() {
            BookingLifecycle::transition(&mut record, BookingStatus::Expired, now)?;
            self.store.insert(&record).await?;
            tracing::warn!(
                "No providers within {} km for booking {} in {}",
                category.instant_search_radius_km,
                record.booking.booking_id,
                category.slug
            );
            return Err(DispatchError::NoProvidersNearby {
                booking_id: record.booking.booking_id,
            });
        }

        self.store.insert(&record).await?;
        tracing::info!(
            "Instant booking {} ({}) created, broadcast to {} providers",
            record.booking.booking_id,
            record.booking.order_number,
            requests.len()
        );

        self.coordinator
            .notify(new_request_notifications(&record.booking, &requests));
        Ok(record.booking)
    }

    /// Customer status poll. Expires the booking first if it is overdue.
    pub async fn instant_booking_status(&self, booking_id: &str, customer_id: Uuid) -> DispatchResult<Booking> {
        let record = self.owned_by(booking_id, customer_id).await?;
        if !record.booking.is_expired_at(Utc::now()) {
            return Ok(record.booking);
        }

        self.coordinator.expire_if_due(booking_id).await?;
        Ok(self.owned_by(booking_id, customer_id).await?.booking)
    }

    /// Pending offers for a provider on bookings that are still live,
    /// nearest first. Overdue bookings found on the way are expired.
    pub async fn list_pending_requests(&self, provider_id: Uuid) -> DispatchResult<Vec<PendingInstantRequest>> {
        let now = Utc::now();
        let mut live = Vec::new();
        let mut overdue = Vec::new();

        for pending in self.store.pending_requests_for(provider_id).await? {
            if pending.booking.is_expired_at(now) {
                overdue.push(pending.booking.booking_id.clone());
            } else if pending.booking.status == BookingStatus::Searching {
                live.push(pending);
            }
        }

        overdue.dedup();
        for booking_id in overdue {
            if let Err(e) = self.coordinator.expire_if_due(&booking_id).await {
                tracing::warn!("Lazy expiry of booking {} failed: {}", booking_id, e);
            }
        }
        Ok(live)
    }

    pub async fn accept(&self, booking_id: &str, provider_id: Uuid) -> DispatchResult<Booking> {
        self.coordinator.accept(booking_id, provider_id).await
    }

    pub async fn decline(&self, booking_id: &str, provider_id: Uuid) -> DispatchResult<DeclineAck> {
        self.coordinator.decline(booking_id, provider_id).await
    }

    /// Customer withdraws a booking that is still searching.
    pub async fn cancel(&self, booking_id: &str, customer_id: Uuid, reason: &str) -> DispatchResult<Booking> {
        let now = Utc::now();
        let mut locked = self.coordinator.lock(booking_id).await?;
        if locked.record().booking.customer_id != customer_id {
            return Err(DispatchError::BookingNotFound(booking_id.to_string()));
        }
        if locked.record().booking.is_expired_at(now) {
            self.coordinator.expire_locked(locked).await?;
            return Err(DispatchError::Expired(booking_id.to_string()));
        }

        let retired = BookingLifecycle::cancel(locked.record_mut(), customer_id, reason, now)?;
        let booking = locked.record().booking.clone();
        locked.commit().await?;

        tracing::info!("Booking {} cancelled by customer {}", booking_id, customer_id);
        self.coordinator
            .notify(withdrawn(booking_id, retired, now.timestamp()));
        Ok(booking)
    }

    pub async fn start_job(&self, booking_id: &str, provider_id: Uuid, otp: &str) -> DispatchResult<Booking> {
        let now = Utc::now();
        let mut locked = self.coordinator.lock(booking_id).await?;
        BookingLifecycle::start_job(locked.record_mut(), provider_id, otp, now)?;
        let booking = locked.record().booking.clone();
        locked.commit().await?;

        tracing::info!("Provider {} started work on booking {}", provider_id, booking_id);
        Ok(booking)
    }

    pub async fn complete_job(&self, booking_id: &str, provider_id: Uuid, otp: &str) -> DispatchResult<Booking> {
        let now = Utc::now();
        let mut locked = self.coordinator.lock(booking_id).await?;
        BookingLifecycle::complete_job(locked.record_mut(), provider_id, otp, now)?;
        let booking = locked.record().booking.clone();
        locked.commit().await?;

        tracing::info!("Provider {} completed booking {}", provider_id, booking_id);
        Ok(booking)
    }

    /// Sends another round to providers that came into range with a larger
    /// radius. Providers notified in earlier rounds keep their requests.
    pub async fn rebroadcast(&self, booking_id: &str, customer_id: Uuid, radius_km: f64) -> DispatchResult<WidenOutcome> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(DispatchError::InvalidRequest("radius_km must be positive".to_string()));
        }

        let now = Utc::now();
        let mut locked = self.coordinator.lock(booking_id).await?;
        if locked.record().booking.customer_id != customer_id {
            return Err(DispatchError::BookingNotFound(booking_id.to_string()));
        }
        if locked.record().booking.status != BookingStatus::Searching {
            return Err(DispatchError::AlreadyDecided(booking_id.to_string()));
        }
        if locked.record().booking.is_expired_at(now) {
            self.coordinator.expire_locked(locked).await?;
            return Err(DispatchError::Expired(booking_id.to_string()));
        }
        let current = locked.record().booking.current_broadcast_radius_km.unwrap_or(0.0);
        if radius_km <= current {
            return Err(DispatchError::InvalidRequest(format!(
                "radius_km must exceed the current {} km",
                current
            )));
        }

        let requests = self
            .broadcaster
            .broadcast_round(locked.record_mut(), radius_km, now)
            .await?;
        let booking = locked.record().booking.clone();
        locked.commit().await?;

        self.coordinator.notify(new_request_notifications(&booking, &requests));
        Ok(WidenOutcome {
            booking,
            newly_notified: requests.len(),
        })
    }

    async fn owned_by(&self, booking_id: &str, customer_id: Uuid) -> DispatchResult<BookingRecord> {
        self.store
            .load(booking_id)
            .await?
            .filter(|r| r.booking.customer_id == customer_id)
            .ok_or_else(|| DispatchError::BookingNotFound(booking_id.to_string()))
    }
}

fn new_request_notifications(
    booking: &Booking,
    requests: &[InstantBookingRequest],
) -> Vec<(Uuid, ProviderNotification)> {
    requests
        .iter()
        .map(|request| {
            let summary = InstantBookingSummary {
                booking_id: booking.booking_id.clone(),
                order_number: booking.order_number.clone(),
                category_slug: booking.category_slug.clone(),
                address: booking.address.clone(),
                distance_km: request.distance_km,
                quantity: booking.quantity,
                total_amount: booking.total_amount,
                expires_at: booking.expires_at.timestamp(),
            };
            (
                request.provider_id,
                ProviderNotification::NewInstantRequest {
                    summary,
                    timestamp: request.notified_at.timestamp(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{collect, FailingNotifier, RecordingNotifier};
    use chrono::Duration;
    use farmo_core::{Category, LogNotifier, PriceUnit, ProviderCandidate, RequestStatus};
    use farmo_store::{InMemoryBookingStore, InMemoryCategoryCatalog, InMemoryProviderDirectory};

    struct Fixture {
        service: InstantBookingService,
        catalog: Arc<InMemoryCategoryCatalog>,
        directory: Arc<InMemoryProviderDirectory>,
        store: Arc<InMemoryBookingStore>,
        category: Category,
        providers: Vec<Uuid>,
    }

    fn category() -> Category {
        let mut category = Category::new("Tractor with driver", "tractor");
        category.instant_price = Some(75_000);
        category.instant_price_unit = PriceUnit::Hour;
        category
    }

    fn candidate(lng: f64) -> ProviderCandidate {
        ProviderCandidate {
            provider_id: Uuid::new_v4(),
            business_name: "Jadhav Farm Equipment".to_string(),
            is_verified: true,
            is_available: true,
            latitude: Some(0.0),
            longitude: Some(lng),
        }
    }

    fn fixture_with(notifier: Arc<dyn Notifier>, provider_lngs: &[f64]) -> Fixture {
        let category = category();
        let catalog = Arc::new(InMemoryCategoryCatalog::new());
        catalog.upsert(category.clone()).unwrap();

        let directory = Arc::new(InMemoryProviderDirectory::new());
        let mut providers = Vec::new();
        for lng in provider_lngs {
            let c = candidate(*lng);
            providers.push(c.provider_id);
            directory.register(c, vec![category.id]).unwrap();
        }

        let store = Arc::new(InMemoryBookingStore::new());
        let service = InstantBookingService::new(catalog.clone(), directory.clone(), store.clone(), notifier);
        Fixture { service, catalog, directory, store, category, providers }
    }

    fn fixture(provider_lngs: &[f64]) -> Fixture {
        fixture_with(Arc::new(LogNotifier), provider_lngs)
    }

    fn request(quantity: u32) -> CreateInstantBooking {
        CreateInstantBooking {
            category_slug: "tractor".to_string(),
            lat: 0.0,
            lng: 0.0,
            quantity,
            address: "Plot 14, Shirur road".to_string(),
            note: Some("Bring the rotavator".to_string()),
        }
    }

    async fn backdate(store: &InMemoryBookingStore, booking_id: &str) {
        let mut locked = store.lock(booking_id).await.unwrap().unwrap();
        locked.record_mut().booking.expires_at = Utc::now() - Duration::seconds(1);
        locked.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_snapshots_price_and_broadcasts() {
        let f = fixture(&[0.01, 0.05, 0.5]);
        let customer = Uuid::new_v4();

        let booking = f.service.create_instant_booking(customer, request(3)).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Searching);
        assert_eq!(booking.total_amount, 225_000);
        assert_eq!(booking.unit_price, 75_000);
        assert_eq!(booking.expires_at - booking.created_at, Duration::minutes(10));
        assert!(booking.order_number.ends_with("-001"));

        let record = f.store.load(&booking.booking_id).await.unwrap().unwrap();
        assert_eq!(record.pending_count(), 2);
        assert!(!record.has_request_for(f.providers[2]));

        let mut repriced = f.category.clone();
        repriced.instant_price = Some(99_000);
        f.catalog.upsert(repriced).unwrap();
        let polled = f.service.instant_booking_status(&booking.booking_id, customer).await.unwrap();
        assert_eq!(polled.total_amount, 225_000);

        let second = f.service.create_instant_booking(customer, request(1)).await.unwrap();
        assert!(second.order_number.ends_with("-002"));
    }

    #[tokio::test]
    async fn test_no_providers_nearby_persists_expired_booking() {
        let f = fixture(&[1.0]);
        let result = f.service.create_instant_booking(Uuid::new_v4(), request(1)).await;

        let Err(DispatchError::NoProvidersNearby { booking_id }) = result else {
            panic!("expected NoProvidersNearby");
        };
        let record = f.store.load(&booking_id).await.unwrap().unwrap();
        assert_eq!(record.booking.status, BookingStatus::Expired);
        assert!(record.requests.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input_and_category_state() {
        let f = fixture(&[0.01]);
        let customer = Uuid::new_v4();

        let mut bad = request(1);
        bad.lat = 91.0;
        assert!(matches!(
            f.service.create_instant_booking(customer, bad).await,
            Err(DispatchError::InvalidRequest(_))
        ));
        assert!(matches!(
            f.service.create_instant_booking(customer, request(0)).await,
            Err(DispatchError::InvalidRequest(_))
        ));
        assert!(matches!(
            f.service.create_instant_booking(customer, request(3_000_000_000)).await,
            Err(DispatchError::InvalidRequest(_))
        ));
        assert!(request(i32::MAX as u32).validate().is_ok());

        let mut missing = request(1);
        missing.category_slug = "harvester".to_string();
        assert!(matches!(
            f.service.create_instant_booking(customer, missing).await,
            Err(DispatchError::CategoryNotFound(_))
        ));

        let mut disabled = f.category.clone();
        disabled.instant_enabled = false;
        f.catalog.upsert(disabled).unwrap();
        assert!(matches!(
            f.service.create_instant_booking(customer, request(1)).await,
            Err(DispatchError::InstantDisabled(_))
        ));

        let mut unpriced = f.category.clone();
        unpriced.instant_price = Some(0);
        f.catalog.upsert(unpriced).unwrap();
        assert!(matches!(
            f.service.create_instant_booking(customer, request(1)).await,
            Err(DispatchError::PriceUnset(_))
        ));

        // Rejected requests never reserve an order number
        assert_eq!(f.store.next_order_sequence(Utc::now().date_naive()).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_order_numbers() {
        let f = fixture(&[0.01]);
        let service = Arc::new(f.service);

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.create_instant_booking(Uuid::new_v4(), request(1)).await })
            })
            .collect();

        let mut order_numbers = Vec::new();
        for handle in handles {
            order_numbers.push(handle.await.unwrap().unwrap().order_number);
        }
        order_numbers.sort();
        order_numbers.dedup();
        assert_eq!(order_numbers.len(), 12);
        assert!(order_numbers[0].ends_with("-001"));
        assert!(order_numbers[11].ends_with("-012"));
    }

    #[tokio::test]
    async fn test_providers_receive_new_request_notifications() {
        let (notifier, mut rx) = RecordingNotifier::new();
        let f = fixture_with(Arc::new(notifier), &[0.01, 0.02]);
        let booking = f.service.create_instant_booking(Uuid::new_v4(), request(1)).await.unwrap();

        let sent = collect(&mut rx, 2).await;
        assert_eq!(sent.len(), 2);
        for (provider_id, notification) in sent {
            assert!(f.providers.contains(&provider_id));
            let ProviderNotification::NewInstantRequest { summary, .. } = notification else {
                panic!("expected a new request notification");
            };
            assert_eq!(summary.booking_id, booking.booking_id);
            assert_eq!(summary.total_amount, 75_000);
        }
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_abort_creation() {
        let f = fixture_with(Arc::new(FailingNotifier), &[0.01]);
        let booking = f.service.create_instant_booking(Uuid::new_v4(), request(1)).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Searching);

        let accepted = f.service.accept(&booking.booking_id, f.providers[0]).await.unwrap();
        assert_eq!(accepted.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_status_poll_is_owner_only_and_expires_lazily() {
        let f = fixture(&[0.01]);
        let customer = Uuid::new_v4();
        let booking = f.service.create_instant_booking(customer, request(1)).await.unwrap();

        assert!(matches!(
            f.service.instant_booking_status(&booking.booking_id, Uuid::new_v4()).await,
            Err(DispatchError::BookingNotFound(_))
        ));

        backdate(&f.store, &booking.booking_id).await;
        let polled = f.service.instant_booking_status(&booking.booking_id, customer).await.unwrap();
        assert_eq!(polled.status, BookingStatus::Expired);

        let record = f.store.load(&booking.booking_id).await.unwrap().unwrap();
        assert_eq!(record.requests[0].status, RequestStatus::Expired);
    }

    #[tokio::test]
    async fn test_pending_list_hides_dead_bookings() {
        let f = fixture(&[0.01]);
        let provider = f.providers[0];
        let live = f.service.create_instant_booking(Uuid::new_v4(), request(1)).await.unwrap();
        let stale = f.service.create_instant_booking(Uuid::new_v4(), request(1)).await.unwrap();
        backdate(&f.store, &stale.booking_id).await;

        let pending = f.service.list_pending_requests(provider).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].booking.booking_id, live.booking_id);

        let record = f.store.load(&stale.booking_id).await.unwrap().unwrap();
        assert_eq!(record.booking.status, BookingStatus::Expired);
    }

    #[tokio::test]
    async fn test_cancel_retires_requests() {
        let f = fixture(&[0.01, 0.02]);
        let customer = Uuid::new_v4();
        let booking = f.service.create_instant_booking(customer, request(1)).await.unwrap();

        assert!(matches!(
            f.service.cancel(&booking.booking_id, customer, "oops").await,
            Err(DispatchError::InvalidRequest(_))
        ));
        assert!(matches!(
            f.service.cancel(&booking.booking_id, Uuid::new_v4(), "Not my booking at all").await,
            Err(DispatchError::BookingNotFound(_))
        ));

        let cancelled = f
            .service
            .cancel(&booking.booking_id, customer, "Rain expected this afternoon")
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(f.service.list_pending_requests(f.providers[0]).await.unwrap().is_empty());
        assert!(matches!(
            f.service.accept(&booking.booking_id, f.providers[0]).await,
            Err(DispatchError::AlreadyDecided(_))
        ));
    }

    #[tokio::test]
    async fn test_job_progress_requires_otps() {
        let f = fixture(&[0.01]);
        let provider = f.providers[0];
        let booking = f.service.create_instant_booking(Uuid::new_v4(), request(1)).await.unwrap();

        assert!(matches!(
            f.service.start_job(&booking.booking_id, provider, "1234").await,
            Err(DispatchError::NotAssignedProvider(_))
        ));

        let confirmed = f.service.accept(&booking.booking_id, provider).await.unwrap();
        let start = confirmed.start_job_otp.unwrap().into_inner();
        let end = confirmed.end_job_otp.unwrap().into_inner();

        assert!(matches!(
            f.service.complete_job(&booking.booking_id, provider, &end).await,
            Err(DispatchError::IllegalTransition { .. })
        ));

        let started = f.service.start_job(&booking.booking_id, provider, &start).await.unwrap();
        assert_eq!(started.status, BookingStatus::InProgress);

        let wrong = if end == "9999" { "1000" } else { "9999" };
        assert!(matches!(
            f.service.complete_job(&booking.booking_id, provider, wrong).await,
            Err(DispatchError::InvalidOtp)
        ));
        let done = f.service.complete_job(&booking.booking_id, provider, &end).await.unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
        assert!(done.work_completed_at.is_some());
    }

    #[tokio::test]
    async fn test_rebroadcast_reaches_only_new_providers() {
        let f = fixture(&[0.01, 0.2]);
        let customer = Uuid::new_v4();
        let booking = f.service.create_instant_booking(customer, request(1)).await.unwrap();

        assert!(matches!(
            f.service.rebroadcast(&booking.booking_id, customer, 15.0).await,
            Err(DispatchError::InvalidRequest(_))
        ));

        let widened = f.service.rebroadcast(&booking.booking_id, customer, 30.0).await.unwrap();
        assert_eq!(widened.newly_notified, 1);
        assert_eq!(widened.booking.broadcast_count, 2);

        let far = f.service.list_pending_requests(f.providers[1]).await.unwrap();
        assert_eq!(far.len(), 1);
        assert_eq!(far[0].request.broadcast_round, 2);

        let again = f.service.rebroadcast(&booking.booking_id, customer, 40.0).await.unwrap();
        assert_eq!(again.newly_notified, 0);

        f.directory.set_available(f.providers[0], false).unwrap();
        assert_eq!(f.service.list_pending_requests(f.providers[0]).await.unwrap().len(), 1);
    }
}
