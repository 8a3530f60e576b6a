use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::booking::{BookingRecord, PendingInstantRequest};
use crate::catalog::Category;
use crate::provider::ProviderCandidate;

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Read access to admin-managed categories
#[async_trait]
pub trait CategoryCatalog: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Category>>;
}

/// Read access to partner profiles
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    /// Partners offering a service in the category who are verified,
    /// available and have a known base location.
    async fn instant_candidates(&self, category_id: Uuid) -> RepoResult<Vec<ProviderCandidate>>;
}

/// Storage for instant bookings and their broadcast requests.
///
/// Every mutation of an existing booking goes through [`BookingStore::lock`],
/// which serializes callers per booking id. Different bookings never wait on
/// each other.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a new booking and its initial requests in one write.
    async fn insert(&self, record: &BookingRecord) -> RepoResult<()>;

    /// Unlocked snapshot read.
    async fn load(&self, booking_id: &str) -> RepoResult<Option<BookingRecord>>;

    /// Take the exclusive per-booking lock. `None` if the booking does not exist.
    async fn lock(&self, booking_id: &str) -> RepoResult<Option<Box<dyn LockedBooking>>>;

    /// Pending requests addressed to a provider on bookings still
    /// `Searching`, nearest first.
    async fn pending_requests_for(&self, provider_id: Uuid) -> RepoResult<Vec<PendingInstantRequest>>;

    /// Ids of bookings still `Searching` whose deadline is before `now`.
    async fn overdue_searching(&self, now: DateTime<Utc>) -> RepoResult<Vec<String>>;

    /// Reserves the next 1-based quick order sequence for a UTC day. Each
    /// call returns a value no other caller gets; a reservation whose
    /// booking is never inserted leaves a gap.
    async fn next_order_sequence(&self, day: NaiveDate) -> RepoResult<u32>;
}

/// A booking held under its exclusive lock.
///
/// Changes made through `record_mut` become visible only on `commit`.
/// Dropping the guard without committing discards them and releases the lock.
#[async_trait]
pub trait LockedBooking: Send {
    fn record(&self) -> &BookingRecord;

    fn record_mut(&mut self) -> &mut BookingRecord;

    async fn commit(self: Box<Self>) -> RepoResult<()>;
}
