use std::str::FromStr;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::models::{
    Booking, BookingStatus, OperatingHours, Organization, PaymentStatus, Room,
};
use crate::services::timeslot::TimeOfDay;

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

// ── Organizations ──

pub fn create_organization(
    conn: &Connection,
    org: &Organization,
    hours: Option<&OperatingHours>,
) -> anyhow::Result<()> {
    let hours_json = match hours {
        Some(h) => Some(h.to_json()?),
        None => None,
    };
    conn.execute(
        "INSERT INTO organizations (id, name, operating_hours) VALUES (?1, ?2, ?3)",
        params![org.id, org.name, hours_json],
    )?;
    Ok(())
}

pub fn get_organization(conn: &Connection, id: &str) -> anyhow::Result<Option<Organization>> {
    let result = conn.query_row(
        "SELECT id, name FROM organizations WHERE id = ?1",
        params![id],
        |row| {
            Ok(Organization {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    );

    match result {
        Ok(org) => Ok(Some(org)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Outer None: organization unknown. Inner None: no hours configured yet
/// (the permissive fallback case).
pub fn get_organization_hours(
    conn: &Connection,
    id: &str,
) -> anyhow::Result<Option<Option<OperatingHours>>> {
    let result = conn.query_row(
        "SELECT operating_hours FROM organizations WHERE id = ?1",
        params![id],
        |row| row.get::<_, Option<String>>(0),
    );

    match result {
        Ok(Some(json)) => Ok(Some(Some(
            OperatingHours::from_json(&json).context("stored operating hours are invalid")?,
        ))),
        Ok(None) => Ok(Some(None)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_organization_hours(
    conn: &Connection,
    id: &str,
    hours: &OperatingHours,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE organizations SET operating_hours = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![hours.to_json()?, id],
    )?;
    Ok(count > 0)
}

// ── Rooms ──

pub fn create_room(conn: &Connection, room: &Room) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO rooms (id, organization_id, name, capacity, hourly_rate, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            room.id,
            room.organization_id,
            room.name,
            room.capacity,
            room.hourly_rate.to_string(),
            room.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_room(conn: &Connection, id: &str) -> anyhow::Result<Option<Room>> {
    let result = conn.query_row(
        "SELECT id, organization_id, name, capacity, hourly_rate, active FROM rooms WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i32>(5)?,
            ))
        },
    );

    match result {
        Ok((id, organization_id, name, capacity, rate_str, active)) => Ok(Some(Room {
            id,
            organization_id,
            name,
            capacity,
            hourly_rate: Decimal::from_str(&rate_str)
                .with_context(|| format!("invalid hourly rate: {rate_str}"))?,
            active: active != 0,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_rooms(conn: &Connection, organization_id: Option<&str>) -> anyhow::Result<Vec<Room>> {
    let (sql, params_vec): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match organization_id {
        Some(org) => (
            "SELECT id, organization_id, name, capacity, hourly_rate, active
             FROM rooms WHERE organization_id = ?1 ORDER BY name ASC",
            vec![Box::new(org.to_string()) as Box<dyn rusqlite::types::ToSql>],
        ),
        None => (
            "SELECT id, organization_id, name, capacity, hourly_rate, active
             FROM rooms ORDER BY name ASC",
            vec![],
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i32>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i32>(5)?,
        ))
    })?;

    let mut rooms = vec![];
    for row in rows {
        let (id, organization_id, name, capacity, rate_str, active) = row?;
        rooms.push(Room {
            id,
            organization_id,
            name,
            capacity,
            hourly_rate: Decimal::from_str(&rate_str)
                .with_context(|| format!("invalid hourly rate: {rate_str}"))?,
            active: active != 0,
        });
    }
    Ok(rooms)
}

pub fn set_room_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE rooms SET active = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![active as i32, id],
    )?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, organization_id, room_id, user_id, date, start_time, end_time, \
     status, total_amount, commission, payment_status, notes, cancel_reason, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, organization_id, room_id, user_id, date, start_time, end_time,
            status, total_amount, commission, payment_status, notes, cancel_reason, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            booking.id,
            booking.organization_id,
            booking.room_id,
            booking.user_id,
            booking.date.format(DATE_FMT).to_string(),
            booking.start_time.to_string(),
            booking.end_time.to_string(),
            booking.status.as_str(),
            booking.total_amount.to_string(),
            booking.commission.to_string(),
            booking.payment_status.as_str(),
            booking.notes,
            booking.cancel_reason,
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Every booking for one room on one day, whatever the status; the caller
/// applies the blocking-status filter.
pub fn bookings_for_room_date(
    conn: &Connection,
    room_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE room_id = ?1 AND date = ?2 ORDER BY start_time ASC",
    ))?;

    let rows = stmt.query_map(
        params![room_id, date.format(DATE_FMT).to_string()],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn bookings_for_room_between(
    conn: &Connection,
    room_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE room_id = ?1 AND date >= ?2 AND date <= ?3
         ORDER BY date ASC, start_time ASC",
    ))?;

    let rows = stmt.query_map(
        params![
            room_id,
            from.format(DATE_FMT).to_string(),
            to.format(DATE_FMT).to_string()
        ],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1
                 ORDER BY date DESC, start_time DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings
                 ORDER BY date DESC, start_time DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    cancel_reason: Option<&str>,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, cancel_reason = COALESCE(?2, cancel_reason), updated_at = ?3
         WHERE id = ?4",
        params![status.as_str(), cancel_reason, now, id],
    )?;
    Ok(count > 0)
}

pub fn update_booking_slot(
    conn: &Connection,
    id: &str,
    date: NaiveDate,
    start: TimeOfDay,
    end: TimeOfDay,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET date = ?1, start_time = ?2, end_time = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            date.format(DATE_FMT).to_string(),
            start.to_string(),
            end.to_string(),
            now,
            id
        ],
    )?;
    Ok(count > 0)
}

pub fn update_payment_status(
    conn: &Connection,
    id: &str,
    payment_status: PaymentStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET payment_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![payment_status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

// ── Dashboard ──

pub struct DashboardStats {
    pub pending_count: i64,
    pub confirmed_count: i64,
    pub upcoming_count: i64,
    pub revenue_total: Decimal,
    pub commission_total: Decimal,
}

pub fn get_dashboard_stats(
    conn: &Connection,
    organization_id: Option<&str>,
) -> anyhow::Result<DashboardStats> {
    let today = Utc::now().naive_utc().date().format(DATE_FMT).to_string();

    let pending_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE status = 'pending' AND (?1 IS NULL OR organization_id = ?1)",
        params![organization_id],
        |row| row.get(0),
    )?;

    let confirmed_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE status = 'confirmed' AND (?1 IS NULL OR organization_id = ?1)",
        params![organization_id],
        |row| row.get(0),
    )?;

    let upcoming_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE status = 'confirmed' AND date >= ?1 AND (?2 IS NULL OR organization_id = ?2)",
        params![today, organization_id],
        |row| row.get(0),
    )?;

    // Amounts live in TEXT columns; fold them in Rust to keep decimal math
    // exact.
    let mut stmt = conn.prepare(
        "SELECT total_amount, commission FROM bookings
         WHERE status IN ('confirmed', 'completed') AND (?1 IS NULL OR organization_id = ?1)",
    )?;
    let rows = stmt.query_map(params![organization_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut revenue_total = Decimal::ZERO;
    let mut commission_total = Decimal::ZERO;
    for row in rows {
        let (amount, commission) = row?;
        revenue_total += Decimal::from_str(&amount)
            .with_context(|| format!("invalid stored amount: {amount}"))?;
        commission_total += Decimal::from_str(&commission)
            .with_context(|| format!("invalid stored commission: {commission}"))?;
    }

    Ok(DashboardStats {
        pending_count,
        confirmed_count,
        upcoming_count,
        revenue_total,
        commission_total,
    })
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let organization_id: String = row.get(1)?;
    let room_id: String = row.get(2)?;
    let user_id: String = row.get(3)?;
    let date_str: String = row.get(4)?;
    let start_str: String = row.get(5)?;
    let end_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let total_str: String = row.get(8)?;
    let commission_str: String = row.get(9)?;
    let payment_str: String = row.get(10)?;
    let notes: Option<String> = row.get(11)?;
    let cancel_reason: Option<String> = row.get(12)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .with_context(|| format!("invalid stored date: {date_str}"))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id,
        organization_id,
        room_id,
        user_id,
        date,
        start_time: TimeOfDay::parse(&start_str)?,
        end_time: TimeOfDay::parse(&end_str)?,
        status: BookingStatus::parse(&status_str),
        total_amount: Decimal::from_str(&total_str)
            .with_context(|| format!("invalid stored amount: {total_str}"))?,
        commission: Decimal::from_str(&commission_str)
            .with_context(|| format!("invalid stored commission: {commission_str}"))?,
        payment_status: PaymentStatus::parse(&payment_str),
        notes,
        cancel_reason,
        created_at,
        updated_at,
    })
}
