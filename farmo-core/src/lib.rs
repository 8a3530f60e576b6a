pub mod booking;
pub mod catalog;
pub mod provider;
pub mod geo;
pub mod repository;
pub mod notify;

pub use booking::{Booking, BookingRecord, BookingStatus, InstantBookingRequest, PendingInstantRequest, RequestStatus};
pub use catalog::{Category, PriceUnit};
pub use provider::ProviderCandidate;
pub use repository::{BookingStore, CategoryCatalog, LockedBooking, ProviderDirectory, RepoError, RepoResult};
pub use notify::{LogNotifier, Notifier};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
