//! Persistence for analyses and their draft columns.
//!
//! Promote is a single guarded UPDATE: copying draft values into final
//! columns and nulling the drafts happen atomically or not at all. The
//! application sync that follows a promote is best-effort and lives with the
//! caller.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::MatchReport;
use crate::models::analysis::{
    AnalysisRow, JobPosting, OptimizedResume, ResumeChange, ResumeContent,
};

pub async fn create_analysis(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    job: &JobPosting,
    resume: &ResumeContent,
    report: &MatchReport,
) -> Result<AnalysisRow, AppError> {
    let row: AnalysisRow = sqlx::query_as(
        r#"
        INSERT INTO user_analyses (id, user_id, job, resume, ats_score, match_analysis)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(Json(job))
    .bind(Json(resume))
    .bind(report.ats_score)
    .bind(Json(report))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_analysis(pool: &PgPool, id: Uuid) -> Result<AnalysisRow, AppError> {
    sqlx::query_as("SELECT * FROM user_analyses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))
}

pub async fn list_analyses(pool: &PgPool, user_id: Uuid) -> Result<Vec<AnalysisRow>, AppError> {
    Ok(sqlx::query_as(
        "SELECT * FROM user_analyses WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Explicit user deletion, the only way an analysis goes away.
pub async fn delete_analysis(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM user_analyses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Analysis {id} not found")));
    }
    Ok(())
}

/// Copies every draft column into its final counterpart and nulls the drafts,
/// in one statement. The guard on the draft column makes promote-without-draft
/// a no-op at the storage layer too.
pub async fn promote_draft(pool: &PgPool, id: Uuid) -> Result<AnalysisRow, AppError> {
    let updated: Option<AnalysisRow> = sqlx::query_as(
        r#"
        UPDATE user_analyses SET
            optimized_resume = draft_optimized_resume,
            changes = draft_changes,
            ats_score = COALESCE(draft_ats_score, ats_score),
            match_analysis = COALESCE(draft_match_analysis, match_analysis),
            draft_optimized_resume = NULL,
            draft_changes = NULL,
            draft_ats_score = NULL,
            draft_match_analysis = NULL,
            updated_at = now()
        WHERE id = $1 AND draft_optimized_resume IS NOT NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(row) => Ok(row),
        None => {
            // Distinguish a missing analysis from one with nothing to promote.
            get_analysis(pool, id).await?;
            Err(AppError::NothingToPromote)
        }
    }
}

/// Nulls the draft columns only. Final fields and the baseline match analysis
/// are untouched; there is no application side effect.
pub async fn discard_draft(pool: &PgPool, id: Uuid) -> Result<AnalysisRow, AppError> {
    let updated: Option<AnalysisRow> = sqlx::query_as(
        r#"
        UPDATE user_analyses SET
            draft_optimized_resume = NULL,
            draft_changes = NULL,
            draft_ats_score = NULL,
            draft_match_analysis = NULL,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    updated.ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))
}

/// Worker write-back of a finished optimization. Refuses locked analyses;
/// `None` means the target vanished or got locked mid-flight.
pub async fn set_draft(
    pool: &PgPool,
    id: Uuid,
    optimized: &OptimizedResume,
    changes: &[ResumeChange],
    draft_score: i32,
    draft_report: &MatchReport,
) -> Result<Option<AnalysisRow>, AppError> {
    let updated: Option<AnalysisRow> = sqlx::query_as(
        r#"
        UPDATE user_analyses SET
            draft_optimized_resume = $2,
            draft_changes = $3,
            draft_ats_score = $4,
            draft_match_analysis = $5,
            updated_at = now()
        WHERE id = $1 AND is_locked = FALSE
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(Json(optimized))
    .bind(Json(changes))
    .bind(draft_score)
    .bind(Json(draft_report))
    .fetch_optional(pool)
    .await?;

    Ok(updated)
}
