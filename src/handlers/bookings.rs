use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{Booking, BookingStatus, PaymentStatus};
use crate::services::reschedule::reschedule_booking;
use crate::services::scheduling::{
    create_booking, resolve_conflict_group, transition_booking, BookingRequest, ResolvedGroup,
};
use crate::services::timeslot::TimeOfDay;
use crate::state::AppState;

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub notes: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = {
        let mut db = state.db.lock().unwrap();
        create_booking(
            &mut db,
            BookingRequest {
                room_id: body.room_id,
                user_id: body.user_id,
                date: body.date,
                start: body.start_time,
                end: body.end_time,
                notes: body.notes,
            },
        )?
    };
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub room_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = state.db.lock().unwrap();

    // A room+date view is the scheduling page's query; everything else is
    // the flat dashboard list.
    let bookings = match (&query.room_id, query.date) {
        (Some(room_id), Some(date)) => {
            let mut day = queries::bookings_for_room_date(&db, room_id, date)?;
            if let Some(status) = &query.status {
                let status = BookingStatus::parse(status);
                day.retain(|b| b.status == status);
            }
            day
        }
        _ => queries::list_bookings(&db, query.status.as_deref(), query.limit.unwrap_or(50))?,
    };

    Ok(Json(bookings))
}

// GET /api/bookings/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)?
    };
    booking
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

// POST /api/bookings/:id/confirm
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let mut db = state.db.lock().unwrap();
    Ok(Json(transition_booking(
        &mut db,
        &id,
        BookingStatus::Confirmed,
        None,
    )?))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let reason = body.and_then(|Json(b)| b.reason);
    let mut db = state.db.lock().unwrap();
    Ok(Json(transition_booking(
        &mut db,
        &id,
        BookingStatus::Cancelled,
        reason,
    )?))
}

// POST /api/bookings/:id/complete
pub async fn complete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let mut db = state.db.lock().unwrap();
    Ok(Json(transition_booking(
        &mut db,
        &id,
        BookingStatus::Completed,
        None,
    )?))
}

// POST /api/bookings/:id/no-show
pub async fn no_show(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let mut db = state.db.lock().unwrap();
    Ok(Json(transition_booking(
        &mut db,
        &id,
        BookingStatus::NoShow,
        None,
    )?))
}

// POST /api/bookings/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: Option<TimeOfDay>,
}

pub async fn reschedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let mut db = state.db.lock().unwrap();
    Ok(Json(reschedule_booking(
        &mut db,
        &id,
        body.date,
        body.start_time,
        body.end_time,
    )?))
}

// POST /api/bookings/:id/payment
#[derive(Deserialize)]
pub struct PaymentRequest {
    pub payment_status: PaymentStatus,
}

pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_payment_status(&db, &id, body.payment_status)?
    };

    if updated {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}

// POST /api/conflicts/resolve
#[derive(Deserialize)]
pub struct ResolveRequest {
    pub confirm_id: String,
    pub reason: Option<String>,
}

pub async fn resolve_conflicts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<ResolvedGroup>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let mut db = state.db.lock().unwrap();
    Ok(Json(resolve_conflict_group(
        &mut db,
        &body.confirm_id,
        body.reason,
    )?))
}
