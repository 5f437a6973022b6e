use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::state::AppState;

// GET /api/admin/stats
#[derive(Deserialize)]
pub struct StatsQuery {
    pub organization_id: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pending_count: i64,
    confirmed_count: i64,
    upcoming_count: i64,
    revenue_total: Decimal,
    commission_total: Decimal,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db, query.organization_id.as_deref())?
    };

    Ok(Json(StatsResponse {
        pending_count: stats.pending_count,
        confirmed_count: stats.confirmed_count,
        upcoming_count: stats.upcoming_count,
        revenue_total: stats.revenue_total,
        commission_total: stats.commission_total,
    }))
}
