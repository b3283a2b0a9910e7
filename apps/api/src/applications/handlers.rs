//! Axum handlers for the Applications API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applications;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, Stage};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let apps = applications::list_applications(&state.db, params.user_id).await?;
    Ok(Json(apps))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let app = applications::get_application(&state.db, id).await?;
    Ok(Json(app))
}

#[derive(Debug, Deserialize)]
pub struct StageRequest {
    pub stage: String,
    pub note: Option<String>,
}

/// POST /api/v1/applications/:id/stage
pub async fn handle_record_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StageRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let stage = Stage::parse(&req.stage)
        .ok_or_else(|| AppError::Validation(format!("Unknown stage '{}'", req.stage)))?;
    let app = applications::record_stage(&state.db, id, stage, req.note).await?;
    Ok(Json(app))
}
