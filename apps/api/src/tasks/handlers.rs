//! Axum handlers for the Tasks API.
//!
//! Creation order matters: the balance is checked before anything is created,
//! the conditional create runs next (a reused task charges nothing), and only
//! a genuinely new task is billed. If billing fails in the gap between check
//! and charge, the fresh task is deleted again so no unpaid work runs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ledger::{self, pricing::ActivityType, ActivityParams};
use crate::models::task::{TaskRow, TaskType};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub user_id: Uuid,
    pub task_type: String,
    pub analysis_id: Option<Uuid>,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub task: TaskRow,
    pub reused: bool,
}

/// Validates a create request before anything is billed or created. Every
/// task type runs against an analysis, so a request without one is rejected
/// here rather than billed and failed by the worker.
fn parse_request(req: &CreateTaskRequest) -> Result<(TaskType, Uuid), AppError> {
    let task_type = TaskType::parse(&req.task_type)
        .ok_or_else(|| AppError::Validation(format!("Unknown task type '{}'", req.task_type)))?;
    let analysis_id = req
        .analysis_id
        .ok_or_else(|| AppError::Validation("analysis_id is required".to_string()))?;
    Ok((task_type, analysis_id))
}

/// POST /api/v1/tasks
pub async fn handle_create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<CreateTaskResponse>, AppError> {
    let (task_type, analysis_id) = parse_request(&req)?;
    let activity_type = ActivityType::for_task(task_type);

    ledger::ensure_profile(&state.db, req.user_id).await?;
    // Insufficient balance blocks the action before any task exists.
    ledger::require_balance(&state.db, req.user_id, activity_type).await?;

    let created = state
        .tasks
        .create(req.user_id, task_type, analysis_id, req.payload)
        .await?;

    if !created.reused {
        let charge = ledger::log_activity(
            &state.db,
            ActivityParams {
                user_id: req.user_id,
                activity_type,
                resource_id: Some(created.task.id),
                skip_token_deduction: false,
            },
        )
        .await;

        if let Err(e) = charge {
            // Lost the race between the balance check and the charge: undo
            // the create so nothing unpaid sits in the queue.
            if let Err(cancel_err) = state.tasks.cancel(created.task.id).await {
                warn!(
                    "Failed to roll back unbilled task {}: {cancel_err}",
                    created.task.id
                );
            }
            return Err(e);
        }
    }

    Ok(Json(CreateTaskResponse {
        task: created.task,
        reused: created.reused,
    }))
}

/// GET /api/v1/tasks/active
pub async fn handle_active_tasks(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<TaskRow>>, AppError> {
    let tasks = state.tasks.active_tasks(params.user_id).await?;
    Ok(Json(tasks))
}

#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task: TaskRow,
    /// True for cancellation-shaped failures the client should swallow.
    pub silent_failure: bool,
}

/// GET /api/v1/tasks/:id
pub async fn handle_get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskStatusResponse>, AppError> {
    let task = state.tasks.get(id).await?;
    let silent_failure = task
        .failure_reason()
        .map(|r| r.is_silent())
        .unwrap_or(false);
    Ok(Json(TaskStatusResponse {
        task,
        silent_failure,
    }))
}

/// DELETE /api/v1/tasks/:id, the cancellation primitive.
pub async fn handle_cancel_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.tasks.cancel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(task_type: &str, analysis_id: Option<Uuid>) -> CreateTaskRequest {
        CreateTaskRequest {
            user_id: Uuid::new_v4(),
            task_type: task_type.to_string(),
            analysis_id,
            payload: json!({}),
        }
    }

    #[test]
    fn test_request_without_analysis_is_rejected_before_billing() {
        let err = parse_request(&request("optimize_resume", None)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unknown_task_type_is_rejected() {
        let err = parse_request(&request("render_pdf", Some(Uuid::new_v4()))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_valid_request_parses() {
        let id = Uuid::new_v4();
        let (task_type, analysis_id) =
            parse_request(&request("cover_letter", Some(id))).unwrap();
        assert_eq!(task_type, TaskType::CoverLetter);
        assert_eq!(analysis_id, id);
    }
}
