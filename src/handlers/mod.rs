pub mod admin;
pub mod bookings;
pub mod health;
pub mod orgs;
pub mod rooms;

use axum::http::HeaderMap;

use crate::errors::AppError;

/// Bearer-token gate for owner/admin mutations. Role separation beyond the
/// shared token is the caller's concern.
pub fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
