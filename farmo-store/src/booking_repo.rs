use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use farmo_core::repository::{BookingStore, LockedBooking, RepoResult};
use farmo_core::{Booking, BookingRecord, CoreError, InstantBookingRequest, PendingInstantRequest};
use farmo_shared::Masked;

const BOOKING_COLUMNS: &str = "booking_id, order_number, customer_id, category_id, category_slug, provider_id, status, \
    address, lat, lng, quantity, unit_price, price_unit, total_amount, note, broadcast_count, \
    current_broadcast_radius_km, start_job_otp, end_job_otp, cancellation_reason, cancelled_by, \
    created_at, updated_at, expires_at, assigned_at, work_started_at, work_completed_at";

const REQUEST_COLUMNS: &str = "id, booking_id, provider_id, status, broadcast_round, distance_km, \
    notified_at, responded_at, response_deadline";

/// Counters are `INTEGER` columns; out-of-range values are refused instead of
/// wrapping.
fn to_db_int(value: u32, column: &str) -> RepoResult<i32> {
    i32::try_from(value)
        .map_err(|_| CoreError::StorageError(format!("{} {} does not fit an INTEGER column", column, value)).into())
}

fn from_db_int(value: i32, column: &str) -> Result<u32, CoreError> {
    u32::try_from(value).map_err(|_| CoreError::StorageError(format!("negative {} {} in storage", column, value)))
}

/// Postgres-backed booking store. The per-booking lock is the row lock taken
/// by `SELECT ... FOR UPDATE` and held by the open transaction.
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_id: String,
    order_number: String,
    customer_id: Uuid,
    category_id: Uuid,
    category_slug: String,
    provider_id: Option<Uuid>,
    status: String,
    address: String,
    lat: f64,
    lng: f64,
    quantity: i32,
    unit_price: i64,
    price_unit: String,
    total_amount: i64,
    note: Option<String>,
    broadcast_count: i32,
    current_broadcast_radius_km: Option<f64>,
    start_job_otp: Option<String>,
    end_job_otp: Option<String>,
    cancellation_reason: Option<String>,
    cancelled_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    assigned_at: Option<DateTime<Utc>>,
    work_started_at: Option<DateTime<Utc>>,
    work_completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            booking_id: row.booking_id,
            order_number: row.order_number,
            customer_id: row.customer_id,
            category_id: row.category_id,
            category_slug: row.category_slug,
            provider_id: row.provider_id,
            status: row.status.parse()?,
            address: row.address,
            lat: row.lat,
            lng: row.lng,
            quantity: from_db_int(row.quantity, "quantity")?,
            unit_price: row.unit_price,
            price_unit: row.price_unit.parse()?,
            total_amount: row.total_amount,
            note: row.note,
            broadcast_count: from_db_int(row.broadcast_count, "broadcast_count")?,
            current_broadcast_radius_km: row.current_broadcast_radius_km,
            start_job_otp: row.start_job_otp.map(Masked::new),
            end_job_otp: row.end_job_otp.map(Masked::new),
            cancellation_reason: row.cancellation_reason,
            cancelled_by: row.cancelled_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            assigned_at: row.assigned_at,
            work_started_at: row.work_started_at,
            work_completed_at: row.work_completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    booking_id: String,
    provider_id: Uuid,
    status: String,
    broadcast_round: i32,
    distance_km: f64,
    notified_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    response_deadline: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for InstantBookingRequest {
    type Error = CoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(InstantBookingRequest {
            id: row.id,
            booking_id: row.booking_id,
            provider_id: row.provider_id,
            status: row.status.parse()?,
            broadcast_round: from_db_int(row.broadcast_round, "broadcast_round")?.max(1),
            distance_km: row.distance_km,
            notified_at: row.notified_at,
            responded_at: row.responded_at,
            response_deadline: row.response_deadline,
        })
    }
}

/// Pending request joined with its booking in one row.
#[derive(sqlx::FromRow)]
struct PendingRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    request_id: Uuid,
    request_status: String,
    broadcast_round: i32,
    distance_km: f64,
    notified_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    response_deadline: Option<DateTime<Utc>>,
}

impl PendingRow {
    fn into_pending(self, provider_id: Uuid) -> Result<PendingInstantRequest, CoreError> {
        let request = RequestRow {
            id: self.request_id,
            booking_id: self.booking.booking_id.clone(),
            provider_id,
            status: self.request_status,
            broadcast_round: self.broadcast_round,
            distance_km: self.distance_km,
            notified_at: self.notified_at,
            responded_at: self.responded_at,
            response_deadline: self.response_deadline,
        };
        Ok(PendingInstantRequest {
            request: request.try_into()?,
            booking: self.booking.try_into()?,
        })
    }
}

/// `a, b` becomes `t.a, t.b`.
fn qualified(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|column| format!("{}.{}", alias, column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn fetch_requests(
    tx: &mut Transaction<'static, Postgres>,
    booking_id: &str,
) -> RepoResult<Vec<InstantBookingRequest>> {
    let rows: Vec<RequestRow> = sqlx::query_as(&format!(
        "SELECT {} FROM instant_booking_requests WHERE booking_id = $1 ORDER BY distance_km, notified_at",
        REQUEST_COLUMNS
    ))
    .bind(booking_id)
    .fetch_all(&mut **tx)
    .await?;

    let mut requests = Vec::with_capacity(rows.len());
    for row in rows {
        requests.push(row.try_into()?);
    }
    Ok(requests)
}

async fn insert_booking(tx: &mut Transaction<'static, Postgres>, booking: &Booking) -> RepoResult<()> {
    sqlx::query(&format!(
        "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
         $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)",
        BOOKING_COLUMNS
    ))
    .bind(&booking.booking_id)
    .bind(&booking.order_number)
    .bind(booking.customer_id)
    .bind(booking.category_id)
    .bind(&booking.category_slug)
    .bind(booking.provider_id)
    .bind(booking.status.as_str())
    .bind(&booking.address)
    .bind(booking.lat)
    .bind(booking.lng)
    .bind(to_db_int(booking.quantity, "quantity")?)
    .bind(booking.unit_price)
    .bind(booking.price_unit.as_str())
    .bind(booking.total_amount)
    .bind(&booking.note)
    .bind(to_db_int(booking.broadcast_count, "broadcast_count")?)
    .bind(booking.current_broadcast_radius_km)
    .bind(booking.start_job_otp.as_ref().map(|otp| otp.expose().clone()))
    .bind(booking.end_job_otp.as_ref().map(|otp| otp.expose().clone()))
    .bind(&booking.cancellation_reason)
    .bind(booking.cancelled_by)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .bind(booking.expires_at)
    .bind(booking.assigned_at)
    .bind(booking.work_started_at)
    .bind(booking.work_completed_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_booking(tx: &mut Transaction<'static, Postgres>, booking: &Booking) -> RepoResult<()> {
    // expires_at and the price snapshot are never rewritten
    sqlx::query(
        r#"
        UPDATE bookings SET
            provider_id = $2, status = $3, broadcast_count = $4, current_broadcast_radius_km = $5,
            start_job_otp = $6, end_job_otp = $7, cancellation_reason = $8, cancelled_by = $9,
            updated_at = $10, assigned_at = $11, work_started_at = $12, work_completed_at = $13
        WHERE booking_id = $1
        "#,
    )
    .bind(&booking.booking_id)
    .bind(booking.provider_id)
    .bind(booking.status.as_str())
    .bind(to_db_int(booking.broadcast_count, "broadcast_count")?)
    .bind(booking.current_broadcast_radius_km)
    .bind(booking.start_job_otp.as_ref().map(|otp| otp.expose().clone()))
    .bind(booking.end_job_otp.as_ref().map(|otp| otp.expose().clone()))
    .bind(&booking.cancellation_reason)
    .bind(booking.cancelled_by)
    .bind(booking.updated_at)
    .bind(booking.assigned_at)
    .bind(booking.work_started_at)
    .bind(booking.work_completed_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Inserts new requests (rebroadcast rounds) and updates answered ones.
async fn upsert_request(
    tx: &mut Transaction<'static, Postgres>,
    request: &InstantBookingRequest,
) -> RepoResult<()> {
    sqlx::query(
        r#"
        INSERT INTO instant_booking_requests
            (id, booking_id, provider_id, status, broadcast_round, distance_km, notified_at, responded_at, response_deadline)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, responded_at = EXCLUDED.responded_at
        "#,
    )
    .bind(request.id)
    .bind(&request.booking_id)
    .bind(request.provider_id)
    .bind(request.status.as_str())
    .bind(to_db_int(request.broadcast_round, "broadcast_round")?)
    .bind(request.distance_km)
    .bind(request.notified_at)
    .bind(request.responded_at)
    .bind(request.response_deadline)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Open transaction holding the booking row lock
struct PgLockedBooking {
    tx: Transaction<'static, Postgres>,
    record: BookingRecord,
}

#[async_trait]
impl LockedBooking for PgLockedBooking {
    fn record(&self) -> &BookingRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut BookingRecord {
        &mut self.record
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let PgLockedBooking { mut tx, record } = *self;

        update_booking(&mut tx, &record.booking).await?;
        for request in &record.requests {
            upsert_request(&mut tx, request).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert(&self, record: &BookingRecord) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        insert_booking(&mut tx, &record.booking).await?;
        for request in &record.requests {
            upsert_request(&mut tx, request).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load(&self, booking_id: &str) -> RepoResult<Option<BookingRecord>> {
        let mut tx = self.pool.begin().await?;
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE booking_id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let requests = fetch_requests(&mut tx, booking_id).await?;
        tx.commit().await?;

        Ok(Some(BookingRecord::new(row.try_into()?, requests)))
    }

    async fn lock(&self, booking_id: &str) -> RepoResult<Option<Box<dyn LockedBooking>>> {
        let mut tx = self.pool.begin().await?;
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE booking_id = $1 FOR UPDATE",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        // No row, no lock; the transaction rolls back on drop
        let Some(row) = row else {
            return Ok(None);
        };
        let requests = fetch_requests(&mut tx, booking_id).await?;
        let record = BookingRecord::new(row.try_into()?, requests);

        Ok(Some(Box::new(PgLockedBooking { tx, record })))
    }

    async fn pending_requests_for(&self, provider_id: Uuid) -> RepoResult<Vec<PendingInstantRequest>> {
        let rows: Vec<PendingRow> = sqlx::query_as(&format!(
            "SELECT {}, r.id AS request_id, r.status AS request_status, r.broadcast_round, r.distance_km, \
             r.notified_at, r.responded_at, r.response_deadline \
             FROM instant_booking_requests r JOIN bookings b ON b.booking_id = r.booking_id \
             WHERE r.provider_id = $1 AND r.status = 'PENDING' AND b.status = 'SEARCHING' \
             ORDER BY r.distance_km, r.notified_at",
            qualified(BOOKING_COLUMNS, "b")
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        let mut pending = Vec::with_capacity(rows.len());
        for row in rows {
            pending.push(row.into_pending(provider_id)?);
        }
        Ok(pending)
    }

    async fn overdue_searching(&self, now: DateTime<Utc>) -> RepoResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT booking_id FROM bookings WHERE status = 'SEARCHING' AND expires_at < $1 ORDER BY expires_at",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn next_order_sequence(&self, day: NaiveDate) -> RepoResult<u32> {
        // The upsert takes the day's row lock, so concurrent creates queue here
        let sequence: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO quick_order_sequences (day, last_value) VALUES ($1, 1)
            ON CONFLICT (day) DO UPDATE SET last_value = quick_order_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;
        Ok(from_db_int(sequence, "order sequence")?)
    }
}
