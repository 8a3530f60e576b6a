use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use farmo_core::repository::{BookingStore, CategoryCatalog, LockedBooking, ProviderDirectory, RepoResult};
use farmo_core::{BookingRecord, BookingStatus, Category, CoreError, PendingInstantRequest, ProviderCandidate};

type BookingSlot = Arc<Mutex<BookingRecord>>;

fn poisoned() -> CoreError {
    CoreError::StorageError("in-memory store lock poisoned".to_string())
}

/// Process-local booking store. Each booking sits behind its own async
/// mutex, so contention on one booking never blocks another.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<String, BookingSlot>>,
    order_sequences: StdMutex<HashMap<NaiveDate, u32>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, booking_id: &str) -> RepoResult<Option<BookingSlot>> {
        let bookings = self.bookings.read().map_err(|_| poisoned())?;
        Ok(bookings.get(booking_id).cloned())
    }

    fn all_slots(&self) -> RepoResult<Vec<BookingSlot>> {
        let bookings = self.bookings.read().map_err(|_| poisoned())?;
        Ok(bookings.values().cloned().collect())
    }
}

/// Working copy of a record plus the guard that keeps other writers out.
struct MemoryLockedBooking {
    guard: OwnedMutexGuard<BookingRecord>,
    working: BookingRecord,
}

#[async_trait]
impl LockedBooking for MemoryLockedBooking {
    fn record(&self) -> &BookingRecord {
        &self.working
    }

    fn record_mut(&mut self) -> &mut BookingRecord {
        &mut self.working
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryLockedBooking { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, record: &BookingRecord) -> RepoResult<()> {
        let mut bookings = self.bookings.write().map_err(|_| poisoned())?;
        let booking_id = record.booking.booking_id.clone();
        if bookings.contains_key(&booking_id) {
            return Err(Box::new(CoreError::StorageError(format!(
                "duplicate booking id {}",
                booking_id
            ))));
        }
        bookings.insert(booking_id, Arc::new(Mutex::new(record.clone())));
        Ok(())
    }

    async fn load(&self, booking_id: &str) -> RepoResult<Option<BookingRecord>> {
        match self.slot(booking_id)? {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn lock(&self, booking_id: &str) -> RepoResult<Option<Box<dyn LockedBooking>>> {
        let Some(slot) = self.slot(booking_id)? else {
            return Ok(None);
        };
        let guard = slot.lock_owned().await;
        let working = guard.clone();
        Ok(Some(Box::new(MemoryLockedBooking { guard, working })))
    }

    async fn pending_requests_for(&self, provider_id: Uuid) -> RepoResult<Vec<PendingInstantRequest>> {
        let mut pending = Vec::new();
        for slot in self.all_slots()? {
            let record = slot.lock().await;
            if record.booking.status != BookingStatus::Searching {
                continue;
            }
            for request in record
                .requests
                .iter()
                .filter(|r| r.provider_id == provider_id && r.is_pending())
            {
                pending.push(PendingInstantRequest {
                    request: request.clone(),
                    booking: record.booking.clone(),
                });
            }
        }

        pending.sort_by(|a, b| {
            a.request
                .distance_km
                .total_cmp(&b.request.distance_km)
                .then(a.request.notified_at.cmp(&b.request.notified_at))
        });
        Ok(pending)
    }

    async fn overdue_searching(&self, now: DateTime<Utc>) -> RepoResult<Vec<String>> {
        let mut overdue = Vec::new();
        for slot in self.all_slots()? {
            let record = slot.lock().await;
            if record.booking.status == BookingStatus::Searching && record.booking.expires_at < now {
                overdue.push(record.booking.booking_id.clone());
            }
        }
        Ok(overdue)
    }

    async fn next_order_sequence(&self, day: NaiveDate) -> RepoResult<u32> {
        let mut sequences = self.order_sequences.lock().map_err(|_| poisoned())?;
        let last = sequences.entry(day).or_insert(0);
        *last += 1;
        Ok(*last)
    }
}

/// Categories keyed by slug
#[derive(Default)]
pub struct InMemoryCategoryCatalog {
    categories: RwLock<HashMap<String, Category>>,
}

impl InMemoryCategoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, category: Category) -> RepoResult<()> {
        let mut categories = self.categories.write().map_err(|_| poisoned())?;
        categories.insert(category.slug.clone(), category);
        Ok(())
    }
}

#[async_trait]
impl CategoryCatalog for InMemoryCategoryCatalog {
    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Category>> {
        let categories = self.categories.read().map_err(|_| poisoned())?;
        Ok(categories.get(slug).filter(|c| c.is_active).cloned())
    }
}

struct DirectoryEntry {
    candidate: ProviderCandidate,
    category_ids: Vec<Uuid>,
}

/// Partners with the categories they offer services in
#[derive(Default)]
pub struct InMemoryProviderDirectory {
    entries: RwLock<Vec<DirectoryEntry>>,
}

impl InMemoryProviderDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, candidate: ProviderCandidate, category_ids: Vec<Uuid>) -> RepoResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.retain(|e| e.candidate.provider_id != candidate.provider_id);
        entries.push(DirectoryEntry { candidate, category_ids });
        Ok(())
    }

    /// The partner's online/offline switch.
    pub fn set_available(&self, provider_id: Uuid, available: bool) -> RepoResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        for entry in entries.iter_mut().filter(|e| e.candidate.provider_id == provider_id) {
            entry.candidate.is_available = available;
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderDirectory for InMemoryProviderDirectory {
    async fn instant_candidates(&self, category_id: Uuid) -> RepoResult<Vec<ProviderCandidate>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .iter()
            .filter(|e| e.category_ids.contains(&category_id))
            .filter(|e| e.candidate.is_dispatchable())
            .filter(|e| e.candidate.latitude.is_some() && e.candidate.longitude.is_some())
            .map(|e| e.candidate.clone())
            .collect())
    }
}
