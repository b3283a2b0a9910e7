//! Tracked job applications, denormalized one-to-one from analyses.
//!
//! The stage timeline is append-only; `current_stage` is a projection of its
//! latest entry. Recording a submitted-or-later stage locks the linked
//! analysis in the same transaction, which blocks further draft creation.

pub mod handlers;

use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::AnalysisRow;
use crate::models::application::{project_current_stage, ApplicationRow, Stage, StageEvent};

/// Upserts the denormalized record for a promoted analysis. Creates it on
/// first promote; afterwards refreshes score/title/company only; the stage
/// timeline always belongs to the application, never to this sync.
pub async fn sync_from_analysis(
    pool: &PgPool,
    analysis: &AnalysisRow,
) -> Result<ApplicationRow, AppError> {
    let row: ApplicationRow = sqlx::query_as(
        r#"
        INSERT INTO user_applications
            (id, user_id, analysis_id, job_title, company, ats_score, current_stage, timeline)
        VALUES ($1, $2, $3, $4, $5, $6, 'saved', '[]'::jsonb)
        ON CONFLICT (analysis_id) DO UPDATE SET
            job_title = EXCLUDED.job_title,
            company = EXCLUDED.company,
            ats_score = EXCLUDED.ats_score,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(analysis.user_id)
    .bind(analysis.id)
    .bind(&analysis.job.0.title)
    .bind(&analysis.job.0.company)
    .bind(analysis.ats_score)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Appends a stage event and re-projects `current_stage`. Locking the linked
/// analysis is part of the same transaction: either both commit or neither.
pub async fn record_stage(
    pool: &PgPool,
    application_id: Uuid,
    stage: Stage,
    note: Option<String>,
) -> Result<ApplicationRow, AppError> {
    let mut tx = pool.begin().await?;

    let app: ApplicationRow = sqlx::query_as(
        "SELECT * FROM user_applications WHERE id = $1 FOR UPDATE",
    )
    .bind(application_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    let mut timeline = app.timeline.0.clone();
    timeline.push(StageEvent {
        stage,
        note,
        at: Utc::now(),
    });
    let current = project_current_stage(&timeline);

    let updated: ApplicationRow = sqlx::query_as(
        r#"
        UPDATE user_applications
        SET timeline = $1, current_stage = $2, updated_at = now()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(Json(&timeline))
    .bind(current.as_str())
    .bind(application_id)
    .fetch_one(&mut *tx)
    .await?;

    if stage.locks_analysis() {
        sqlx::query("UPDATE user_analyses SET is_locked = TRUE, updated_at = now() WHERE id = $1")
            .bind(app.analysis_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(updated)
}

pub async fn list_applications(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ApplicationRow>, AppError> {
    Ok(sqlx::query_as(
        "SELECT * FROM user_applications WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_application(pool: &PgPool, id: Uuid) -> Result<ApplicationRow, AppError> {
    sqlx::query_as("SELECT * FROM user_applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}
