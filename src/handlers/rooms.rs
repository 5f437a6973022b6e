use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{Booking, Room};
use crate::services::availability::{day_label_fr, is_open_on, timetable_range, weekday_key};
use crate::services::conflict::{group_conflicts, ConflictGroup};
use crate::services::timeslot::{week_bounds, TimeOfDay};
use crate::state::AppState;

// POST /api/rooms
#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub organization_id: String,
    pub name: String,
    #[serde(default)]
    pub capacity: i32,
    pub hourly_rate: Decimal,
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.hourly_rate < Decimal::ZERO {
        return Err(AppError::BadRequest("hourly rate must not be negative".into()));
    }

    let room = {
        let db = state.db.lock().unwrap();
        queries::get_organization(&db, &body.organization_id)?
            .ok_or_else(|| AppError::NotFound(format!("organization {}", body.organization_id)))?;

        let room = Room {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: body.organization_id,
            name: body.name,
            capacity: body.capacity,
            hourly_rate: body.hourly_rate,
            active: true,
        };
        queries::create_room(&db, &room)?;
        room
    };

    tracing::info!(room_id = %room.id, "room created");
    Ok((StatusCode::CREATED, Json(room)))
}

// GET /api/rooms
#[derive(Deserialize)]
pub struct RoomsQuery {
    pub organization_id: Option<String>,
}

pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomsQuery>,
) -> Result<Json<Vec<Room>>, AppError> {
    let rooms = {
        let db = state.db.lock().unwrap();
        queries::list_rooms(&db, query.organization_id.as_deref())?
    };
    Ok(Json(rooms))
}

// POST /api/rooms/:id/deactivate
pub async fn deactivate_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::set_room_active(&db, &id, false)?
    };

    if updated {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("room {id}")))
    }
}

// GET /api/rooms/:id/timetable?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct TimetableQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct TimetableDay {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub label: &'static str,
    pub open: bool,
    pub open_time: Option<TimeOfDay>,
    pub close_time: Option<TimeOfDay>,
    pub bookings: Vec<Booking>,
}

#[derive(Serialize)]
pub struct TimetableResponse {
    pub room_id: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
    pub days: Vec<TimetableDay>,
}

/// The owner's weekly grid: hour bounds sized from the hours table, one
/// column per day with that day's open window and its still-active
/// bookings.
pub async fn timetable(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<TimetableQuery>,
) -> Result<Json<TimetableResponse>, AppError> {
    let (monday, sunday) = week_bounds(query.date);

    let (hours, week_bookings) = {
        let db = state.db.lock().unwrap();
        let room = queries::get_room(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("room {id}")))?;
        let hours = queries::get_organization_hours(&db, &room.organization_id)?.flatten();
        let bookings = queries::bookings_for_room_between(&db, &id, monday, sunday)?;
        (hours, bookings)
    };

    let (start_hour, end_hour) = hours
        .as_ref()
        .map(timetable_range)
        .unwrap_or((8, 19));

    let days = (0..7)
        .map(|i| {
            let date = monday + chrono::Duration::days(i);
            let key = weekday_key(date);
            let day = hours.as_ref().map(|h| is_open_on(h, date));
            let bookings = week_bookings
                .iter()
                .filter(|b| b.date == date && b.status.is_blocking())
                .cloned()
                .collect();
            TimetableDay {
                date,
                weekday: key,
                label: day_label_fr(key).unwrap_or(key),
                open: day.as_ref().map_or(true, |d| d.open),
                open_time: day.as_ref().and_then(|d| d.open_time),
                close_time: day.as_ref().and_then(|d| d.close_time),
                bookings,
            }
        })
        .collect();

    Ok(Json(TimetableResponse {
        room_id: id,
        week_start: monday,
        week_end: sunday,
        start_hour,
        end_hour,
        days,
    }))
}

// GET /api/rooms/:id/conflicts?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct ConflictsQuery {
    pub date: NaiveDate,
}

pub async fn conflicts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ConflictsQuery>,
) -> Result<Json<Vec<ConflictGroup>>, AppError> {
    let day = {
        let db = state.db.lock().unwrap();
        queries::get_room(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("room {id}")))?;
        queries::bookings_for_room_date(&db, &id, query.date)?
    };

    Ok(Json(group_conflicts(&day)))
}
