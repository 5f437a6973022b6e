use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::{AppError, ScheduleError};
use crate::models::Booking;
use crate::services::availability::validate_window;
use crate::services::conflict::{find_conflict, CONFIRM_BLOCKING};
use crate::services::timeslot::TimeOfDay;

/// Computes the target slot for a move. A drag carries the whole interval:
/// when no explicit end is given, the original duration is preserved from
/// the new start. An end that would spill past midnight is an invalid
/// range, never an overnight booking.
pub fn plan_slot(
    booking: &Booking,
    new_date: NaiveDate,
    new_start: TimeOfDay,
    new_end: Option<TimeOfDay>,
) -> Result<(NaiveDate, TimeOfDay, TimeOfDay), ScheduleError> {
    let end = match new_end {
        Some(end) => end,
        None => {
            let duration =
                booking.end_time.as_minutes() - booking.start_time.as_minutes();
            TimeOfDay::from_minutes(new_start.as_minutes() + duration)
                .ok_or(ScheduleError::InvalidRange)?
        }
    };
    Ok((new_date, new_start, end))
}

/// Moves a booking to a new date/time slot. All checks run before any
/// write: the hours gate, then the conflict scan against CONFIRMED holders
/// only (landing on pending bookings creates a conflict group for manual
/// resolution instead of blocking the drop). Status is untouched.
pub fn reschedule_booking(
    conn: &mut Connection,
    id: &str,
    new_date: NaiveDate,
    new_start: TimeOfDay,
    new_end: Option<TimeOfDay>,
) -> Result<Booking, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut booking = queries::get_booking_by_id(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    if booking.status.is_terminal() {
        return Err(AppError::BadRequest(format!(
            "cannot reschedule a {} booking",
            booking.status
        )));
    }

    let (date, start, end) = plan_slot(&booking, new_date, new_start, new_end)?;

    let hours = queries::get_organization_hours(&tx, &booking.organization_id)?.flatten();
    validate_window(hours.as_ref(), date, start, end)?;

    let existing = queries::bookings_for_room_date(&tx, &booking.room_id, date)?;
    if let Some(held) = find_conflict(
        &existing,
        &booking.room_id,
        date,
        start,
        end,
        Some(id),
        CONFIRM_BLOCKING,
    ) {
        return Err(ScheduleError::SlotTaken {
            booking_id: held.id.clone(),
        }
        .into());
    }

    queries::update_booking_slot(&tx, id, date, start, end)?;
    tx.commit()?;

    tracing::info!(booking_id = %id, date = %date, start = %start, "booking rescheduled");

    booking.date = date;
    booking.start_time = start;
    booking.end_time = end;
    booking.updated_at = Utc::now().naive_utc();
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::db;
    use crate::models::{BookingStatus, OperatingHours, Organization, Room};
    use crate::services::scheduling::{create_booking, transition_booking, BookingRequest};

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        let org = Organization {
            id: "org-1".to_string(),
            name: "Centre Alpha".to_string(),
        };
        let hours = OperatingHours::from_json(
            r#"{
                "monday": {"open":"08:00","close":"18:00"},
                "tuesday": {"open":"09:00","close":"17:00"},
                "sunday": {"closed":true,"open":null,"close":null}
            }"#,
        )
        .unwrap();
        queries::create_organization(&conn, &org, Some(&hours)).unwrap();
        queries::create_room(
            &conn,
            &Room {
                id: "room-1".to_string(),
                organization_id: "org-1".to_string(),
                name: "Salle A".to_string(),
                capacity: 12,
                hourly_rate: Decimal::from(50),
                active: true,
            },
        )
        .unwrap();
        conn
    }

    fn book(conn: &mut Connection, date: &str, start: &str, end: &str) -> Booking {
        create_booking(
            conn,
            BookingRequest {
                room_id: "room-1".to_string(),
                user_id: "user-1".to_string(),
                date: d(date),
                start: t(start),
                end: t(end),
                notes: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_plan_slot_preserves_duration() {
        let mut conn = setup();
        let booking = book(&mut conn, "2025-06-16", "09:00", "10:30");
        let (date, start, end) =
            plan_slot(&booking, d("2025-06-17"), t("14:00"), None).unwrap();
        assert_eq!(date, d("2025-06-17"));
        assert_eq!(start, t("14:00"));
        assert_eq!(end, t("15:30"));
    }

    #[test]
    fn test_plan_slot_explicit_end_wins() {
        let mut conn = setup();
        let booking = book(&mut conn, "2025-06-16", "09:00", "10:30");
        let (_, _, end) =
            plan_slot(&booking, d("2025-06-17"), t("14:00"), Some(t("16:00"))).unwrap();
        assert_eq!(end, t("16:00"));
    }

    #[test]
    fn test_plan_slot_rejects_midnight_spill() {
        let mut conn = setup();
        let booking = book(&mut conn, "2025-06-16", "09:00", "11:00");
        assert_eq!(
            plan_slot(&booking, d("2025-06-16"), t("23:30"), None),
            Err(ScheduleError::InvalidRange)
        );
    }

    #[test]
    fn test_reschedule_moves_the_slot() {
        let mut conn = setup();
        let booking = book(&mut conn, "2025-06-16", "09:00", "10:00");
        let moved =
            reschedule_booking(&mut conn, &booking.id, d("2025-06-17"), t("10:00"), None)
                .unwrap();
        assert_eq!(moved.date, d("2025-06-17"));
        assert_eq!(moved.start_time, t("10:00"));
        assert_eq!(moved.end_time, t("11:00"));
        assert_eq!(moved.status, BookingStatus::Pending);

        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.date, d("2025-06-17"));
    }

    #[test]
    fn test_reschedule_to_own_slot_is_idempotent() {
        let mut conn = setup();
        let booking = book(&mut conn, "2025-06-16", "09:00", "10:00");
        let confirmed =
            transition_booking(&mut conn, &booking.id, BookingStatus::Confirmed, None).unwrap();
        // Dropping a booking back on its own slot must never self-conflict
        let moved = reschedule_booking(
            &mut conn,
            &confirmed.id,
            confirmed.date,
            confirmed.start_time,
            Some(confirmed.end_time),
        )
        .unwrap();
        assert_eq!(moved.start_time, t("09:00"));
    }

    #[test]
    fn test_reschedule_respects_hours() {
        let mut conn = setup();
        let booking = book(&mut conn, "2025-06-16", "09:00", "10:00");
        // Tuesday opens at 09:00
        let err =
            reschedule_booking(&mut conn, &booking.id, d("2025-06-17"), t("08:00"), None)
                .unwrap_err();
        assert!(matches!(
            err,
            AppError::Schedule(ScheduleError::OutOfHours { .. })
        ));
        // Sunday is closed
        let err =
            reschedule_booking(&mut conn, &booking.id, d("2025-06-22"), t("10:00"), None)
                .unwrap_err();
        assert!(matches!(
            err,
            AppError::Schedule(ScheduleError::ClosedDay { .. })
        ));
        // Failed moves left the original untouched
        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.date, d("2025-06-16"));
        assert_eq!(stored.start_time, t("09:00"));
    }

    #[test]
    fn test_reschedule_blocked_by_confirmed_only() {
        let mut conn = setup();
        let confirmed = book(&mut conn, "2025-06-16", "10:00", "11:00");
        transition_booking(&mut conn, &confirmed.id, BookingStatus::Confirmed, None).unwrap();
        let pending = book(&mut conn, "2025-06-16", "14:00", "15:00");
        let mover = book(&mut conn, "2025-06-16", "16:00", "17:00");

        // Landing on a CONFIRMED holder is a hard block
        let err = reschedule_booking(&mut conn, &mover.id, d("2025-06-16"), t("10:30"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Schedule(ScheduleError::SlotTaken { .. })
        ));

        // Landing on a PENDING holder goes through and leaves a conflict
        // group for manual resolution
        let moved = reschedule_booking(&mut conn, &mover.id, d("2025-06-16"), t("14:30"), None)
            .unwrap();
        assert_eq!(moved.start_time, t("14:30"));
        let day = queries::bookings_for_room_date(&conn, "room-1", d("2025-06-16")).unwrap();
        let groups = crate::services::conflict::group_conflicts(&day);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].bookings.iter().any(|b| b.id == pending.id));
        assert!(groups[0].bookings.iter().any(|b| b.id == moved.id));
    }

    #[test]
    fn test_reschedule_terminal_booking_rejected() {
        let mut conn = setup();
        let booking = book(&mut conn, "2025-06-16", "09:00", "10:00");
        transition_booking(&mut conn, &booking.id, BookingStatus::Cancelled, None).unwrap();
        let err =
            reschedule_booking(&mut conn, &booking.id, d("2025-06-17"), t("10:00"), None)
                .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
