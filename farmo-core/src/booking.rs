use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use farmo_shared::Masked;

use crate::catalog::PriceUnit;
use crate::CoreError;

/// Booking status across scheduled and instant bookings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Searching,
    Confirmed,
    Rejected,
    Expired,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Searching => "SEARCHING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Expired => "EXPIRED",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// No transition leaves these.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Expired
                | BookingStatus::Cancelled
                | BookingStatus::Completed
                | BookingStatus::Rejected
        )
    }

    /// Statuses in which a provider must be assigned.
    pub fn requires_provider(&self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed | BookingStatus::InProgress | BookingStatus::Completed
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "SEARCHING" => Ok(BookingStatus::Searching),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "REJECTED" => Ok(BookingStatus::Rejected),
            "EXPIRED" => Ok(BookingStatus::Expired),
            "IN_PROGRESS" => Ok(BookingStatus::InProgress),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::ValidationError(format!("unknown booking status: {}", other))),
        }
    }
}

/// Status of one provider's offer for an instant booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Declined => "DECLINED",
            RequestStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RequestStatus::Pending),
            "ACCEPTED" => Ok(RequestStatus::Accepted),
            "DECLINED" => Ok(RequestStatus::Declined),
            "EXPIRED" => Ok(RequestStatus::Expired),
            other => Err(CoreError::ValidationError(format!("unknown request status: {}", other))),
        }
    }
}

/// An instant (quick-book) booking. The provider stays empty until one
/// accepts the broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub order_number: String,
    pub customer_id: Uuid,
    pub category_id: Uuid,
    pub category_slug: String,
    pub provider_id: Option<Uuid>,
    pub status: BookingStatus,

    pub address: String,
    pub lat: f64,
    pub lng: f64,

    // Snapshot of the category price at creation time
    pub quantity: u32,
    pub unit_price: i64,
    pub price_unit: PriceUnit,
    pub total_amount: i64,

    pub note: Option<String>,

    pub broadcast_count: u32,
    pub current_broadcast_radius_km: Option<f64>,

    pub start_job_otp: Option<Masked<String>>,
    pub end_job_otp: Option<Masked<String>>,

    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub work_started_at: Option<DateTime<Utc>>,
    pub work_completed_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Opaque public identifier, e.g. `FB-3F2A9C1B`.
    pub fn generate_id() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("FB-{}", hex[..8].to_uppercase())
    }

    /// Daily quick order number, e.g. `QO-20261019-007`.
    pub fn order_number_for(created_at: DateTime<Utc>, sequence: u32) -> String {
        format!("QO-{}-{:03}", created_at.format("%Y%m%d"), sequence)
    }

    pub fn update_status(&mut self, new_status: BookingStatus, now: DateTime<Utc>) {
        self.status = new_status;
        self.updated_at = now;
    }

    /// Derived flag, never stored: the stored status lags until something
    /// touches the booking under its lock.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Searching && now > self.expires_at
    }
}

/// One provider's copy of a broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstantBookingRequest {
    pub id: Uuid,
    pub booking_id: String,
    pub provider_id: Uuid,
    pub status: RequestStatus,
    pub broadcast_round: u32,
    pub distance_km: f64,
    pub notified_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub response_deadline: Option<DateTime<Utc>>,
}

impl InstantBookingRequest {
    pub fn new(
        booking_id: String,
        provider_id: Uuid,
        distance_km: f64,
        broadcast_round: u32,
        response_deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            provider_id,
            status: RequestStatus::Pending,
            broadcast_round,
            distance_km,
            notified_at: now,
            responded_at: None,
            response_deadline: Some(response_deadline),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn respond(&mut self, status: RequestStatus, now: DateTime<Utc>) {
        self.status = status;
        self.responded_at = Some(now);
    }
}

/// A booking together with every request broadcast for it. This is the
/// unit that gets locked and written atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking: Booking,
    pub requests: Vec<InstantBookingRequest>,
}

impl BookingRecord {
    pub fn new(booking: Booking, requests: Vec<InstantBookingRequest>) -> Self {
        Self { booking, requests }
    }

    pub fn pending_count(&self) -> usize {
        self.requests.iter().filter(|r| r.is_pending()).count()
    }

    pub fn pending_request_mut(&mut self, provider_id: Uuid) -> Option<&mut InstantBookingRequest> {
        self.requests
            .iter_mut()
            .find(|r| r.provider_id == provider_id && r.is_pending())
    }

    pub fn has_request_for(&self, provider_id: Uuid) -> bool {
        self.requests.iter().any(|r| r.provider_id == provider_id)
    }

    /// Moves every still-pending request to `Expired` and returns the
    /// providers whose offers were withdrawn.
    pub fn retire_pending(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut retired = Vec::new();
        for request in self.requests.iter_mut().filter(|r| r.is_pending()) {
            request.respond(RequestStatus::Expired, now);
            retired.push(request.provider_id);
        }
        retired
    }

    pub fn accepted_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| r.status == RequestStatus::Accepted)
            .count()
    }
}

/// A pending offer as listed to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingInstantRequest {
    pub request: InstantBookingRequest,
    pub booking: Booking,
}
