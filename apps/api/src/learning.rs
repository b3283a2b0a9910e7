//! Learning-path entries: listing and progress updates.
//! Rows are created by the worker when a `learning_path` task completes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::learning::LearningEntryRow;
use crate::state::AppState;

const STATUSES: &[&str] = &["not_started", "in_progress", "done"];

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/learning
pub async fn handle_list_learning(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<LearningEntryRow>>, AppError> {
    let entries: Vec<LearningEntryRow> = sqlx::query_as(
        "SELECT * FROM user_learning WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// PATCH /api/v1/learning/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<LearningEntryRow>, AppError> {
    if !STATUSES.contains(&req.status.as_str()) {
        return Err(AppError::Validation(format!(
            "Status must be one of {STATUSES:?}, got '{}'",
            req.status
        )));
    }

    let updated: Option<LearningEntryRow> = sqlx::query_as(
        "UPDATE user_learning SET status = $1 WHERE id = $2 RETURNING *",
    )
    .bind(&req.status)
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    updated
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Learning entry {id} not found")))
}
