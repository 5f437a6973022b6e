use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::ScheduleError;
use crate::models::BookingStatus;
use crate::services::timeslot::{duration_hours, TimeOfDay};

/// Platform cut, 10% of the total. Stored alongside the total, not
/// subtracted from it: the customer pays the total, the commission is the
/// platform's share of that.
pub fn commission_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// Allowed status transitions. Terminal states admit none; confirm and
/// cancel carry extra requirements enforced by the orchestration layer
/// (conflict recheck, cancel reason).
pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Pending, Completed)
            | (Pending, NoShow)
            | (Confirmed, Cancelled)
            | (Confirmed, Completed)
            | (Confirmed, NoShow)
    )
}

pub fn ensure_transition(from: BookingStatus, to: BookingStatus) -> Result<(), ScheduleError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(ScheduleError::TransitionNotAllowed { from, to })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pricing {
    pub total_amount: Decimal,
    pub commission: Decimal,
}

/// Price for renting at `hourly_rate` over `[start, end)`. Fractional hours
/// are allowed; amounts round to cents.
pub fn price(hourly_rate: Decimal, start: TimeOfDay, end: TimeOfDay) -> Result<Pricing, ScheduleError> {
    let hours = duration_hours(start, end);
    if hours <= Decimal::ZERO {
        return Err(ScheduleError::InvalidDuration);
    }
    let total_amount = (hourly_rate * hours).round_dp(2);
    let commission = (total_amount * commission_rate()).round_dp(2);
    Ok(Pricing {
        total_amount,
        commission,
    })
}
