use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use farmo_core::{Booking, BookingStatus, PendingInstantRequest, PriceUnit};
use farmo_dispatch::{CreateInstantBooking, DeclineAck};

use crate::error::AppError;
use crate::middleware::{customer_auth_middleware, provider_auth_middleware, CustomerClaims, ProviderClaims};
use crate::state::AppState;

const HIDDEN_OTP: &str = "****";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Viewer {
    Customer,
    Provider,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingView {
    pub booking_id: String,
    pub order_number: String,
    pub status: BookingStatus,
    pub is_expired: bool,
    pub category_slug: String,
    pub provider_id: Option<Uuid>,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub quantity: u32,
    pub unit_price: i64,
    pub price_unit: PriceUnit,
    pub total_amount: i64,
    pub note: Option<String>,
    pub broadcast_count: u32,
    pub current_broadcast_radius_km: Option<f64>,
    pub start_job_otp: Option<String>,
    pub end_job_otp: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub work_started_at: Option<DateTime<Utc>>,
    pub work_completed_at: Option<DateTime<Utc>>,
}

impl BookingView {
    /// The customer holds the start code and the provider the end code.
    /// Each side only sees the other's code as a placeholder.
    fn for_viewer(booking: Booking, viewer: Viewer) -> Self {
        let reveal = |otp: Option<farmo_shared::Masked<String>>, visible: bool| {
            otp.map(|code| if visible { code.into_inner() } else { HIDDEN_OTP.to_string() })
        };

        Self {
            is_expired: booking.is_expired_at(Utc::now()),
            start_job_otp: reveal(booking.start_job_otp, viewer == Viewer::Customer),
            end_job_otp: reveal(booking.end_job_otp, viewer == Viewer::Provider),
            booking_id: booking.booking_id,
            order_number: booking.order_number,
            status: booking.status,
            category_slug: booking.category_slug,
            provider_id: booking.provider_id,
            address: booking.address,
            lat: booking.lat,
            lng: booking.lng,
            quantity: booking.quantity,
            unit_price: booking.unit_price,
            price_unit: booking.price_unit,
            total_amount: booking.total_amount,
            note: booking.note,
            broadcast_count: booking.broadcast_count,
            current_broadcast_radius_km: booking.current_broadcast_radius_km,
            cancellation_reason: booking.cancellation_reason,
            created_at: booking.created_at,
            expires_at: booking.expires_at,
            assigned_at: booking.assigned_at,
            work_started_at: booking.work_started_at,
            work_completed_at: booking.work_completed_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingRequestView {
    pub request_id: Uuid,
    pub booking_id: String,
    pub order_number: String,
    pub category_slug: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub distance_km: f64,
    pub quantity: u32,
    pub price_unit: PriceUnit,
    pub total_amount: i64,
    pub note: Option<String>,
    pub broadcast_round: u32,
    pub notified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<PendingInstantRequest> for PendingRequestView {
    fn from(pending: PendingInstantRequest) -> Self {
        let PendingInstantRequest { request, booking } = pending;
        Self {
            request_id: request.id,
            booking_id: booking.booking_id,
            order_number: booking.order_number,
            category_slug: booking.category_slug,
            address: booking.address,
            lat: booking.lat,
            lng: booking.lng,
            distance_km: request.distance_km,
            quantity: booking.quantity,
            price_unit: booking.price_unit,
            total_amount: booking.total_amount,
            note: booking.note,
            broadcast_round: request.broadcast_round,
            notified_at: request.notified_at,
            expires_at: booking.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingRequestsResponse {
    pub count: usize,
    pub requests: Vec<PendingRequestView>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct WidenRequest {
    pub radius_km: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WidenResponse {
    pub booking: BookingView,
    pub newly_notified: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    Start,
    Complete,
}

#[derive(Debug, Deserialize)]
pub struct JobActionRequest {
    pub action: JobAction,
    pub otp: String,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    let customer = Router::new()
        .route("/api/v1/bookings/instant/", post(create_instant_booking))
        .route("/api/v1/bookings/instant/{booking_id}/status/", get(instant_booking_status))
        .route("/api/v1/bookings/instant/{booking_id}/cancel/", post(cancel_instant_booking))
        .route("/api/v1/bookings/instant/{booking_id}/widen/", post(widen_instant_booking))
        .route_layer(middleware::from_fn_with_state(state.clone(), customer_auth_middleware));

    let provider = Router::new()
        .route("/api/v1/bookings/provider/instant/", get(list_pending_requests))
        .route("/api/v1/bookings/provider/instant/{booking_id}/accept/", post(accept_instant_booking))
        .route("/api/v1/bookings/provider/instant/{booking_id}/decline/", post(decline_instant_booking))
        .route("/api/v1/bookings/provider/{booking_id}/action/", post(job_action))
        .route_layer(middleware::from_fn_with_state(state, provider_auth_middleware));

    customer.merge(provider)
}

// ============================================================================
// Customer Handlers
// ============================================================================

/// POST /api/v1/bookings/instant/
pub async fn create_instant_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<CreateInstantBooking>,
) -> Result<(StatusCode, Json<BookingView>), AppError> {
    let booking = state
        .service
        .create_instant_booking(claims.customer_id(), req)
        .await?;

    Ok((StatusCode::CREATED, Json(BookingView::for_viewer(booking, Viewer::Customer))))
}

/// GET /api/v1/bookings/instant/{booking_id}/status/
pub async fn instant_booking_status(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state
        .service
        .instant_booking_status(&booking_id, claims.customer_id())
        .await?;

    Ok(Json(BookingView::for_viewer(booking, Viewer::Customer)))
}

/// POST /api/v1/bookings/instant/{booking_id}/cancel/
pub async fn cancel_instant_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state
        .service
        .cancel(&booking_id, claims.customer_id(), &req.reason)
        .await?;

    Ok(Json(BookingView::for_viewer(booking, Viewer::Customer)))
}

/// POST /api/v1/bookings/instant/{booking_id}/widen/
pub async fn widen_instant_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<String>,
    Json(req): Json<WidenRequest>,
) -> Result<Json<WidenResponse>, AppError> {
    let outcome = state
        .service
        .rebroadcast(&booking_id, claims.customer_id(), req.radius_km)
        .await?;

    Ok(Json(WidenResponse {
        booking: BookingView::for_viewer(outcome.booking, Viewer::Customer),
        newly_notified: outcome.newly_notified,
    }))
}

// ============================================================================
// Provider Handlers
// ============================================================================

/// GET /api/v1/bookings/provider/instant/
pub async fn list_pending_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<ProviderClaims>,
) -> Result<Json<PendingRequestsResponse>, AppError> {
    let requests: Vec<PendingRequestView> = state
        .service
        .list_pending_requests(claims.provider_id())
        .await?
        .into_iter()
        .map(PendingRequestView::from)
        .collect();

    Ok(Json(PendingRequestsResponse {
        count: requests.len(),
        requests,
    }))
}

/// POST /api/v1/bookings/provider/instant/{booking_id}/accept/
pub async fn accept_instant_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<ProviderClaims>,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let booking = state.coordinator.accept(&booking_id, claims.provider_id()).await?;
    Ok(Json(BookingView::for_viewer(booking, Viewer::Provider)))
}

/// POST /api/v1/bookings/provider/instant/{booking_id}/decline/
pub async fn decline_instant_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<ProviderClaims>,
    Path(booking_id): Path<String>,
) -> Result<Json<DeclineAck>, AppError> {
    let ack = state.coordinator.decline(&booking_id, claims.provider_id()).await?;
    Ok(Json(ack))
}

/// POST /api/v1/bookings/provider/{booking_id}/action/
pub async fn job_action(
    State(state): State<AppState>,
    Extension(claims): Extension<ProviderClaims>,
    Path(booking_id): Path<String>,
    Json(req): Json<JobActionRequest>,
) -> Result<Json<BookingView>, AppError> {
    if req.otp.trim().is_empty() {
        return Err(AppError::ValidationError("otp is required".to_string()));
    }

    let provider_id = claims.provider_id();
    let booking = match req.action {
        JobAction::Start => state.service.start_job(&booking_id, provider_id, &req.otp).await?,
        JobAction::Complete => state.service.complete_job(&booking_id, provider_id, &req.otp).await?,
    };

    Ok(Json(BookingView::for_viewer(booking, Viewer::Provider)))
}
