use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use farmo_core::{Booking, BookingRecord, BookingStatus, Category, RequestStatus};
use farmo_shared::Masked;

use crate::error::{DispatchError, DispatchResult};

/// Status rules for instant bookings.
///
/// ```text
/// Searching --accept--> Confirmed --start--> InProgress --complete--> Completed
/// Searching --all declined / deadline passed--> Expired
/// Searching --customer cancels--> Cancelled
/// ```
pub struct BookingLifecycle;

impl BookingLifecycle {
    /// Deadline set once, at creation.
    pub fn compute_expiry(now: DateTime<Utc>, category: &Category) -> DateTime<Utc> {
        now + Duration::minutes(i64::from(category.instant_timeout_minutes))
    }

    pub fn is_expired(booking: &Booking, now: DateTime<Utc>) -> bool {
        booking.is_expired_at(now)
    }

    pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (from, to),
            (Searching, Confirmed)
                | (Searching, Expired)
                | (Searching, Cancelled)
                | (Confirmed, InProgress)
                | (InProgress, Completed)
        )
    }

    /// Applies a status change to the locked record. Leaving `Searching`
    /// retires every request still pending; the returned providers are the
    /// ones whose offers were withdrawn.
    pub fn transition(
        record: &mut BookingRecord,
        to: BookingStatus,
        now: DateTime<Utc>,
    ) -> DispatchResult<Vec<Uuid>> {
        let from = record.booking.status;
        if !Self::can_transition(from, to) {
            return Err(DispatchError::IllegalTransition { from, to });
        }
        if to.requires_provider() != record.booking.provider_id.is_some() {
            return Err(DispatchError::IllegalTransition { from, to });
        }

        record.booking.update_status(to, now);
        match to {
            BookingStatus::InProgress => record.booking.work_started_at = Some(now),
            BookingStatus::Completed => record.booking.work_completed_at = Some(now),
            _ => {}
        }

        let retired = if from == BookingStatus::Searching {
            record.retire_pending(now)
        } else {
            Vec::new()
        };
        Ok(retired)
    }

    /// Awards the booking to `provider_id`, whose request must be pending.
    /// Everyone else still pending is retired.
    pub fn assign(
        record: &mut BookingRecord,
        provider_id: Uuid,
        now: DateTime<Utc>,
    ) -> DispatchResult<Vec<Uuid>> {
        let from = record.booking.status;
        if !Self::can_transition(from, BookingStatus::Confirmed) {
            return Err(DispatchError::IllegalTransition { from, to: BookingStatus::Confirmed });
        }

        let booking_id = record.booking.booking_id.clone();
        let request = record
            .pending_request_mut(provider_id)
            .ok_or(DispatchError::NoPendingRequest(booking_id))?;
        request.respond(RequestStatus::Accepted, now);

        record.booking.provider_id = Some(provider_id);
        record.booking.assigned_at = Some(now);
        record.booking.start_job_otp = Some(Masked::new(Self::generate_otp()));
        record.booking.end_job_otp = Some(Masked::new(Self::generate_otp()));

        Self::transition(record, BookingStatus::Confirmed, now)
    }

    /// Deadline-driven expiry. Returns `None` when the booking is not overdue,
    /// so repeated sweeps are no-ops.
    pub fn expire_if_overdue(record: &mut BookingRecord, now: DateTime<Utc>) -> Option<Vec<Uuid>> {
        if !Self::is_expired(&record.booking, now) {
            return None;
        }
        Self::transition(record, BookingStatus::Expired, now).ok()
    }

    pub fn cancel(
        record: &mut BookingRecord,
        customer_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DispatchResult<Vec<Uuid>> {
        let reason = reason.trim();
        if reason.chars().count() < 10 {
            return Err(DispatchError::InvalidRequest(
                "cancellation reason must be at least 10 characters".to_string(),
            ));
        }

        let retired = Self::transition(record, BookingStatus::Cancelled, now)?;
        record.booking.cancellation_reason = Some(reason.to_string());
        record.booking.cancelled_by = Some(customer_id);
        Ok(retired)
    }

    /// Confirmed → InProgress, gated by the start OTP the customer hands over.
    pub fn start_job(
        record: &mut BookingRecord,
        provider_id: Uuid,
        otp: &str,
        now: DateTime<Utc>,
    ) -> DispatchResult<()> {
        Self::check_assigned(&record.booking, provider_id)?;
        Self::check_can_move(&record.booking, BookingStatus::InProgress)?;
        Self::check_otp(record.booking.start_job_otp.as_ref(), otp)?;
        Self::transition(record, BookingStatus::InProgress, now)?;
        Ok(())
    }

    /// InProgress → Completed, gated by the end OTP.
    pub fn complete_job(
        record: &mut BookingRecord,
        provider_id: Uuid,
        otp: &str,
        now: DateTime<Utc>,
    ) -> DispatchResult<()> {
        Self::check_assigned(&record.booking, provider_id)?;
        Self::check_can_move(&record.booking, BookingStatus::Completed)?;
        Self::check_otp(record.booking.end_job_otp.as_ref(), otp)?;
        Self::transition(record, BookingStatus::Completed, now)?;
        Ok(())
    }

    fn generate_otp() -> String {
        rand::thread_rng().gen_range(1000..=9999).to_string()
    }

    fn check_assigned(booking: &Booking, provider_id: Uuid) -> DispatchResult<()> {
        if booking.provider_id != Some(provider_id) {
            return Err(DispatchError::NotAssignedProvider(booking.booking_id.clone()));
        }
        Ok(())
    }

    fn check_can_move(booking: &Booking, to: BookingStatus) -> DispatchResult<()> {
        if !Self::can_transition(booking.status, to) {
            return Err(DispatchError::IllegalTransition { from: booking.status, to });
        }
        Ok(())
    }

    fn check_otp(expected: Option<&Masked<String>>, given: &str) -> DispatchResult<()> {
        match expected {
            Some(otp) if otp.expose() == given.trim() => Ok(()),
            _ => Err(DispatchError::InvalidOtp),
        }
    }
}
