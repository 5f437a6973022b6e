use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

/// Recoverable scheduling outcomes, rendered to the caller as specific
/// messages rather than a generic failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("end time must be after start time")]
    InvalidRange,

    #[error("closed on {day}")]
    ClosedDay { day: String },

    #[error("must be between {open} and {close}")]
    OutOfHours { open: String, close: String },

    #[error("slot already taken by booking {booking_id}")]
    SlotTaken { booking_id: String },

    #[error("booking duration must be positive")]
    InvalidDuration,

    #[error("cannot change a {from} booking to {to}")]
    TransitionNotAllowed {
        from: BookingStatus,
        to: BookingStatus,
    },
}

impl ScheduleError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::InvalidRange => "invalid_range",
            ScheduleError::ClosedDay { .. } => "closed_day",
            ScheduleError::OutOfHours { .. } => "out_of_hours",
            ScheduleError::SlotTaken { .. } => "slot_taken",
            ScheduleError::InvalidDuration => "invalid_duration",
            ScheduleError::TransitionNotAllowed { .. } => "transition_not_allowed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Schedule(e) => match e {
                ScheduleError::SlotTaken { .. } | ScheduleError::TransitionNotAllowed { .. } => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            AppError::Schedule(e) => {
                serde_json::json!({ "error": e.to_string(), "kind": e.kind() })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_kinds() {
        assert_eq!(ScheduleError::InvalidRange.kind(), "invalid_range");
        assert_eq!(
            ScheduleError::SlotTaken {
                booking_id: "b1".into()
            }
            .kind(),
            "slot_taken"
        );
        assert_eq!(
            ScheduleError::TransitionNotAllowed {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed,
            }
            .kind(),
            "transition_not_allowed"
        );
    }

    #[test]
    fn test_out_of_hours_message_names_bounds() {
        let err = ScheduleError::OutOfHours {
            open: "08:00".into(),
            close: "18:00".into(),
        };
        assert_eq!(err.to_string(), "must be between 08:00 and 18:00");
    }
}
