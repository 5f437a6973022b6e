use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::db::queries;
use crate::errors::{AppError, ScheduleError};
use crate::models::{Booking, BookingStatus, PaymentStatus};
use crate::services::availability::validate_window;
use crate::services::conflict::{find_conflict, group_conflicts, CONFIRM_BLOCKING, CREATION_BLOCKING};
use crate::services::lifecycle::{ensure_transition, price};
use crate::services::timeslot::TimeOfDay;

const DEFAULT_CANCEL_REASON: &str = "cancelled by owner";
const CONFLICT_CANCEL_REASON: &str = "cancelled in conflict resolution";

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub room_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub notes: Option<String>,
}

/// Creates a booking in PENDING state. One check-then-write sequence in one
/// immediate transaction: room lookup, hours gate, conflict scan against
/// pending and confirmed holders, pricing, insert. Nothing is written
/// unless every check passes.
pub fn create_booking(conn: &mut Connection, req: BookingRequest) -> Result<Booking, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let room = queries::get_room(&tx, &req.room_id)?
        .ok_or_else(|| AppError::NotFound(format!("room {}", req.room_id)))?;
    if !room.active {
        return Err(AppError::BadRequest(format!(
            "room {} is not open for booking",
            room.id
        )));
    }

    let hours = queries::get_organization_hours(&tx, &room.organization_id)?.flatten();
    validate_window(hours.as_ref(), req.date, req.start, req.end)?;

    let existing = queries::bookings_for_room_date(&tx, &room.id, req.date)?;
    if let Some(held) = find_conflict(
        &existing,
        &room.id,
        req.date,
        req.start,
        req.end,
        None,
        CREATION_BLOCKING,
    ) {
        return Err(ScheduleError::SlotTaken {
            booking_id: held.id.clone(),
        }
        .into());
    }

    let pricing = price(room.hourly_rate, req.start, req.end)?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: room.organization_id,
        room_id: room.id,
        user_id: req.user_id,
        date: req.date,
        start_time: req.start,
        end_time: req.end,
        status: BookingStatus::Pending,
        total_amount: pricing.total_amount,
        commission: pricing.commission,
        payment_status: PaymentStatus::Pending,
        notes: req.notes,
        cancel_reason: None,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        room_id = %booking.room_id,
        date = %booking.date,
        "booking created"
    );
    Ok(booking)
}

/// Applies a status transition. Confirming re-runs the conflict check
/// against other CONFIRMED bookings only; cancelling records a reason
/// (defaulted when the caller gives none).
pub fn transition_booking(
    conn: &mut Connection,
    id: &str,
    to: BookingStatus,
    cancel_reason: Option<String>,
) -> Result<Booking, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut booking = queries::get_booking_by_id(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    ensure_transition(booking.status, to)?;

    if to == BookingStatus::Confirmed {
        let existing = queries::bookings_for_room_date(&tx, &booking.room_id, booking.date)?;
        if let Some(held) = find_conflict(
            &existing,
            &booking.room_id,
            booking.date,
            booking.start_time,
            booking.end_time,
            Some(id),
            CONFIRM_BLOCKING,
        ) {
            return Err(ScheduleError::SlotTaken {
                booking_id: held.id.clone(),
            }
            .into());
        }
    }

    let reason = if to == BookingStatus::Cancelled {
        Some(cancel_reason.unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string()))
    } else {
        None
    };

    queries::update_booking_status(&tx, id, to, reason.as_deref())?;
    tx.commit()?;

    tracing::info!(booking_id = %id, from = %booking.status, to = %to, "booking transitioned");

    booking.status = to;
    if reason.is_some() {
        booking.cancel_reason = reason;
    }
    booking.updated_at = Utc::now().naive_utc();
    Ok(booking)
}

#[derive(Debug, Serialize)]
pub struct ResolvedGroup {
    pub confirmed: Booking,
    pub cancelled: Vec<Booking>,
}

/// Resolves the conflict group containing `confirm_id`: every other
/// pending/confirmed member of that group is cancelled, then the chosen
/// booking is confirmed. Groups elsewhere on the same day are untouched.
pub fn resolve_conflict_group(
    conn: &mut Connection,
    confirm_id: &str,
    cancel_reason: Option<String>,
) -> Result<ResolvedGroup, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let winner = queries::get_booking_by_id(&tx, confirm_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {confirm_id}")))?;
    if winner.status != BookingStatus::Confirmed {
        ensure_transition(winner.status, BookingStatus::Confirmed)?;
    }

    let day = queries::bookings_for_room_date(&tx, &winner.room_id, winner.date)?;
    let reason = cancel_reason.unwrap_or_else(|| CONFLICT_CANCEL_REASON.to_string());

    let mut cancelled = Vec::new();
    let losers: Vec<Booking> = group_conflicts(&day)
        .into_iter()
        .find(|g| g.bookings.iter().any(|b| b.id == winner.id))
        .map(|g| {
            g.bookings
                .into_iter()
                .filter(|b| b.id != winner.id)
                .collect()
        })
        .unwrap_or_default();

    for mut loser in losers {
        ensure_transition(loser.status, BookingStatus::Cancelled)?;
        queries::update_booking_status(&tx, &loser.id, BookingStatus::Cancelled, Some(&reason))?;
        loser.status = BookingStatus::Cancelled;
        loser.cancel_reason = Some(reason.clone());
        cancelled.push(loser);
    }

    // With the contenders out of the way the confirm-time gate must pass;
    // any remaining CONFIRMED overlap is outside the group and blocks.
    let day = queries::bookings_for_room_date(&tx, &winner.room_id, winner.date)?;
    if let Some(held) = find_conflict(
        &day,
        &winner.room_id,
        winner.date,
        winner.start_time,
        winner.end_time,
        Some(&winner.id),
        CONFIRM_BLOCKING,
    ) {
        return Err(ScheduleError::SlotTaken {
            booking_id: held.id.clone(),
        }
        .into());
    }

    let mut confirmed = winner;
    if confirmed.status != BookingStatus::Confirmed {
        queries::update_booking_status(&tx, &confirmed.id, BookingStatus::Confirmed, None)?;
        confirmed.status = BookingStatus::Confirmed;
    }
    tx.commit()?;

    tracing::info!(
        booking_id = %confirmed.id,
        cancelled = cancelled.len(),
        "conflict group resolved"
    );
    Ok(ResolvedGroup {
        confirmed,
        cancelled,
    })
}
