//! Axum handlers for the Analyses API: first scoring, review, promote/discard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::draft::OptimizationState;
use crate::analysis::store;
use crate::applications;
use crate::errors::AppError;
use crate::ledger::{self, pricing::ActivityType, ActivityParams};
use crate::matching::job_parser::parse_job;
use crate::models::analysis::{AnalysisRow, ResumeContent};
use crate::models::application::ApplicationRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateAnalysisRequest {
    pub user_id: Uuid,
    pub job_text: String,
    pub resume: ResumeContent,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: AnalysisRow,
    /// Last saved score, present only while a draft awaits review.
    pub baseline_score: Option<i32>,
}

fn respond(analysis: AnalysisRow) -> AnalysisResponse {
    let baseline_score = OptimizationState::from_row(&analysis).baseline_score();
    AnalysisResponse {
        analysis,
        baseline_score,
    }
}

/// POST /api/v1/analyses
///
/// First scoring: parses the posting, scores the resume against it, charges
/// the ledger, and persists the analysis. The balance is pre-checked before
/// the LLM call so an underfunded request fails before any work happens.
pub async fn handle_create_analysis(
    State(state): State<AppState>,
    Json(req): Json<CreateAnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    if req.job_text.trim().is_empty() {
        return Err(AppError::Validation("job_text cannot be empty".to_string()));
    }
    if req.resume.raw_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume raw_text cannot be empty".to_string(),
        ));
    }

    ledger::ensure_profile(&state.db, req.user_id).await?;
    ledger::require_balance(&state.db, req.user_id, ActivityType::ResumeAnalysis).await?;

    let job = parse_job(&req.job_text, &state.llm).await?;
    let report = state.scorer.score(&req.resume, &job).await?;
    info!(
        "Scored resume for user {}: {}/100 against '{}'",
        req.user_id, report.ats_score, job.title
    );

    let id = Uuid::new_v4();
    ledger::log_activity(
        &state.db,
        ActivityParams {
            user_id: req.user_id,
            activity_type: ActivityType::ResumeAnalysis,
            resource_id: Some(id),
            skip_token_deduction: false,
        },
    )
    .await?;

    let analysis = store::create_analysis(&state.db, req.user_id, id, &job, &req.resume, &report).await?;
    Ok(Json(respond(analysis)))
}

/// GET /api/v1/analyses
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<AnalysisRow>>, AppError> {
    let analyses = store::list_analyses(&state.db, params.user_id).await?;
    Ok(Json(analyses))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis = store::get_analysis(&state.db, id).await?;
    Ok(Json(respond(analysis)))
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub analysis: AnalysisRow,
    /// Present when the denormalized application sync succeeded.
    pub application: Option<ApplicationRow>,
}

/// POST /api/v1/analyses/:id/promote
///
/// The promote itself is atomic and fails loudly. The application upsert that
/// follows is denormalization only: its failure is logged and never unwinds
/// the promote.
pub async fn handle_promote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PromoteResponse>, AppError> {
    let analysis = store::promote_draft(&state.db, id).await?;
    info!("Promoted draft on analysis {id}, score {}", analysis.ats_score);

    let application = match applications::sync_from_analysis(&state.db, &analysis).await {
        Ok(app) => Some(app),
        Err(e) => {
            warn!("Application sync after promote failed (ignored): {e}");
            None
        }
    };

    Ok(Json(PromoteResponse {
        analysis,
        application,
    }))
}

/// POST /api/v1/analyses/:id/discard
pub async fn handle_discard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis = store::discard_draft(&state.db, id).await?;
    Ok(Json(respond(analysis)))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub user_id: Uuid,
}

/// DELETE /api/v1/analyses/:id
pub async fn handle_delete_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteQuery>,
) -> Result<StatusCode, AppError> {
    store::delete_analysis(&state.db, id, params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
