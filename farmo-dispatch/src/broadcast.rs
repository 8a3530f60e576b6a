use chrono::{DateTime, Utc};
use std::sync::Arc;

use farmo_core::geo::{find_eligible, round_km};
use farmo_core::{BookingRecord, InstantBookingRequest, ProviderDirectory};

use crate::error::DispatchResult;

/// Fans a booking out to every eligible provider within a radius.
pub struct BroadcastEngine {
    directory: Arc<dyn ProviderDirectory>,
}

impl BroadcastEngine {
    pub fn new(directory: Arc<dyn ProviderDirectory>) -> Self {
        Self { directory }
    }

    /// Runs one broadcast round over `record` and returns the requests it
    /// created. Providers who already hold a request for the booking from an
    /// earlier round are skipped, so a provider is offered a booking once.
    pub async fn broadcast_round(
        &self,
        record: &mut BookingRecord,
        radius_km: f64,
        now: DateTime<Utc>,
    ) -> DispatchResult<Vec<InstantBookingRequest>> {
        let candidates: Vec<_> = self
            .directory
            .instant_candidates(record.booking.category_id)
            .await?
            .into_iter()
            .filter(|c| c.is_dispatchable())
            .collect();
        let scanned = candidates.len();

        let round = record.booking.broadcast_count + 1;
        let deadline = record.booking.expires_at;
        let booking_id = record.booking.booking_id.clone();

        let fresh: Vec<InstantBookingRequest> =
            find_eligible(candidates, record.booking.lat, record.booking.lng, radius_km)
                .into_iter()
                .filter(|(candidate, _)| !record.has_request_for(candidate.provider_id))
                .map(|(candidate, distance)| {
                    InstantBookingRequest::new(
                        booking_id.clone(),
                        candidate.provider_id,
                        round_km(distance),
                        round,
                        deadline,
                        now,
                    )
                })
                .collect();

        record.booking.broadcast_count = round;
        record.booking.current_broadcast_radius_km = Some(radius_km);
        record.booking.updated_at = now;
        record.requests.extend(fresh.iter().cloned());

        tracing::info!(
            "Broadcast round {} for booking {}: {} of {} candidates within {} km",
            round,
            booking_id,
            fresh.len(),
            scanned,
            radius_km
        );

        Ok(fresh)
    }
}
