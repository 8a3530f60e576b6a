use farmo_core::{BookingStatus, CoreError, RepoError};

/// Business outcomes of the dispatch flow. Race-lost variants are expected
/// under load; callers refresh and move on.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Instant booking is disabled for category {0}")]
    InstantDisabled(String),

    #[error("Instant price is not set for category {0}")]
    PriceUnset(String),

    #[error("No providers nearby for booking {booking_id}")]
    NoProvidersNearby { booking_id: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Booking {0} has already been decided")]
    AlreadyDecided(String),

    #[error("Booking {0} has expired")]
    Expired(String),

    #[error("No pending request for booking {0}")]
    NoPendingRequest(String),

    #[error("Invalid state transition from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Provider is not assigned to booking {0}")]
    NotAssignedProvider(String),

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DispatchError {
    /// Stable code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            DispatchError::InstantDisabled(_) => "INSTANT_DISABLED",
            DispatchError::PriceUnset(_) => "PRICE_UNSET",
            DispatchError::NoProvidersNearby { .. } => "NO_PROVIDERS_NEARBY",
            DispatchError::InvalidRequest(_) => "INVALID_REQUEST",
            DispatchError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            DispatchError::AlreadyDecided(_) => "ALREADY_DECIDED",
            DispatchError::Expired(_) => "EXPIRED",
            DispatchError::NoPendingRequest(_) => "NO_PENDING_REQUEST",
            DispatchError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            DispatchError::NotAssignedProvider(_) => "NOT_ASSIGNED_PROVIDER",
            DispatchError::InvalidOtp => "INVALID_OTP",
            DispatchError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<RepoError> for DispatchError {
    fn from(err: RepoError) -> Self {
        DispatchError::Storage(err.to_string())
    }
}

impl From<CoreError> for DispatchError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => DispatchError::InvalidRequest(msg),
            CoreError::StorageError(msg) => DispatchError::Storage(msg),
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
