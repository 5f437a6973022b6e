use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{OperatingHours, Organization};
use crate::state::AppState;

// POST /api/organizations
#[derive(Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub operating_hours: Option<OperatingHours>,
}

pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if let Some(hours) = &body.operating_hours {
        hours
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    let org = Organization {
        id: uuid::Uuid::new_v4().to_string(),
        name: body.name,
    };
    {
        let db = state.db.lock().unwrap();
        queries::create_organization(&db, &org, body.operating_hours.as_ref())?;
    }

    tracing::info!(organization_id = %org.id, "organization created");
    Ok((StatusCode::CREATED, Json(org)))
}

// GET /api/organizations/:id/hours
pub async fn get_hours(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Option<OperatingHours>>, AppError> {
    let hours = {
        let db = state.db.lock().unwrap();
        queries::get_organization_hours(&db, &id)?
    };

    match hours {
        Some(hours) => Ok(Json(hours)),
        None => Err(AppError::NotFound(format!("organization {id}"))),
    }
}

// PUT /api/organizations/:id/hours
pub async fn update_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(hours): Json<OperatingHours>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    hours
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_organization_hours(&db, &id, &hours)?
    };

    if updated {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("organization {id}")))
    }
}
