//! Axum handlers for balance, activity history, and admin credits.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ledger;
use crate::ledger::pricing::ActivityType;
use crate::models::activity::ActivityRow;
use crate::models::user::UserProfileRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UserProfileRow>, AppError> {
    ledger::ensure_profile(&state.db, params.user_id).await?;
    let profile = ledger::get_profile(&state.db, params.user_id).await?;
    Ok(Json(profile))
}

/// GET /api/v1/activities
pub async fn handle_list_activities(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ActivityRow>>, AppError> {
    let activities = ledger::list_activities(&state.db, params.user_id).await?;
    Ok(Json(activities))
}

#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    pub user_id: Uuid,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct CreditResponse {
    pub activity: ActivityRow,
}

/// POST /api/v1/tokens/credit (admin grant).
pub async fn handle_credit_tokens(
    State(state): State<AppState>,
    Json(req): Json<CreditRequest>,
) -> Result<Json<CreditResponse>, AppError> {
    ledger::ensure_profile(&state.db, req.user_id).await?;
    let activity = ledger::credit_tokens(
        &state.db,
        req.user_id,
        req.amount,
        ActivityType::TokenCredit,
        None,
    )
    .await?;
    Ok(Json(CreditResponse { activity }))
}
