use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Booking, BookingStatus};
use crate::services::timeslot::{overlaps, TimeOfDay};

/// Statuses that block a new booking from being created on a slot.
pub const CREATION_BLOCKING: &[BookingStatus] =
    &[BookingStatus::Pending, BookingStatus::Confirmed];

/// Statuses that block a confirm or a reschedule. Pending bookings do not
/// block here: landing on one produces a conflict group for manual
/// resolution instead of a hard stop.
pub const CONFIRM_BLOCKING: &[BookingStatus] = &[BookingStatus::Confirmed];

/// First booking in `existing` that holds the candidate slot, if any.
/// Filters to the same room and date, a blocking status, and `id !=
/// exclude_id`; the overlap test is the half-open inequality pair, so
/// touching endpoints never conflict.
pub fn find_conflict<'a>(
    existing: &'a [Booking],
    room_id: &str,
    date: NaiveDate,
    start: TimeOfDay,
    end: TimeOfDay,
    exclude_id: Option<&str>,
    blocking: &[BookingStatus],
) -> Option<&'a Booking> {
    existing.iter().find(|b| {
        b.room_id == room_id
            && b.date == date
            && blocking.contains(&b.status)
            && exclude_id != Some(b.id.as_str())
            && overlaps(start, end, b.start_time, b.end_time)
    })
}

/// A set of >= 2 mutually contending bookings on one room/date. Derived on
/// read, never persisted; resolving one means confirming a single member
/// and cancelling the rest.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictGroup {
    pub room_id: String,
    pub date: NaiveDate,
    pub bookings: Vec<Booking>,
}

/// Partitions bookings into connected components under the overlap
/// relation, per room/date bucket, keeping components of size >= 2 among
/// blocking (pending/confirmed) bookings. Transitive: A-B and B-D
/// overlapping puts A, B, D in one group even when A and D do not touch.
pub fn group_conflicts(bookings: &[Booking]) -> Vec<ConflictGroup> {
    let mut buckets: BTreeMap<(String, NaiveDate), Vec<&Booking>> = BTreeMap::new();
    for b in bookings {
        if b.status.is_blocking() {
            buckets
                .entry((b.room_id.clone(), b.date))
                .or_default()
                .push(b);
        }
    }

    let mut groups = Vec::new();
    for ((room_id, date), members) in buckets {
        let n = members.len();
        let mut visited = vec![false; n];

        for root in 0..n {
            if visited[root] {
                continue;
            }
            // DFS over the overlap relation within this bucket
            let mut component = Vec::new();
            let mut stack = vec![root];
            visited[root] = true;
            while let Some(i) = stack.pop() {
                component.push(i);
                for j in 0..n {
                    if !visited[j]
                        && overlaps(
                            members[i].start_time,
                            members[i].end_time,
                            members[j].start_time,
                            members[j].end_time,
                        )
                    {
                        visited[j] = true;
                        stack.push(j);
                    }
                }
            }

            if component.len() >= 2 {
                component.sort_unstable();
                groups.push(ConflictGroup {
                    room_id: room_id.clone(),
                    date,
                    bookings: component.iter().map(|&i| members[i].clone()).collect(),
                });
            }
        }
    }
    groups
}
