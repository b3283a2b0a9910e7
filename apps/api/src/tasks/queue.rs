//! Task queue over the `analysis_tasks` table.
//!
//! De-duplication is a conditional create: a partial unique index over
//! non-terminal `(task_type, analysis_id)` pairs makes the existence check and
//! the insert one statement, so two near-simultaneous creates converge on one
//! task. Lifecycle transitions are guarded UPDATEs; a guard that matches zero
//! rows means the task was deleted out from under the writer (cancellation).
//!
//! Every lifecycle step (created, claimed, terminal) publishes a
//! [`TaskEvent`]; terminal transitions additionally carry the full updated
//! analysis, so subscribers never need a follow-up read.

use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::AnalysisRow;
use crate::models::task::{FailureReason, TaskRow, TaskType};

const EVENT_CAPACITY: usize = 256;

/// Change event published when a task reaches a terminal status.
/// `analysis` is present when the task mutated its target analysis.
#[derive(Debug, Clone)]
pub struct TaskEvent {
    pub task: TaskRow,
    pub analysis: Option<AnalysisRow>,
}

#[derive(Debug, Clone)]
pub struct CreatedTask {
    pub task: TaskRow,
    /// True when an in-flight task of the same type and target was reused.
    pub reused: bool,
}

#[derive(Clone)]
pub struct TaskQueue {
    pool: PgPool,
    events: broadcast::Sender<TaskEvent>,
}

impl TaskQueue {
    pub fn new(pool: PgPool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { pool, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: TaskEvent) {
        // No subscribers is fine; the event is simply dropped.
        let _ = self.events.send(event);
    }

    /// Creates a task, or returns the existing active task of the same
    /// `(type, analysis)` pair. Draft-producing tasks against a locked
    /// analysis are refused.
    pub async fn create(
        &self,
        user_id: Uuid,
        task_type: TaskType,
        analysis_id: Uuid,
        payload: Value,
    ) -> Result<CreatedTask, AppError> {
        let is_locked: Option<bool> =
            sqlx::query_scalar("SELECT is_locked FROM user_analyses WHERE id = $1")
                .bind(analysis_id)
                .fetch_optional(&self.pool)
                .await?;
        match is_locked {
            None => {
                return Err(AppError::NotFound(format!(
                    "Analysis {analysis_id} not found"
                )))
            }
            Some(true) if task_type.produces_draft() => return Err(AppError::AnalysisLocked),
            Some(_) => {}
        }

        // Two attempts: a conflicting task can reach a terminal status between
        // our losing insert and the lookup of the winner.
        for _ in 0..2 {
            let inserted: Option<TaskRow> = sqlx::query_as(
                r#"
                INSERT INTO analysis_tasks (id, user_id, task_type, analysis_id, payload)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (task_type, analysis_id)
                    WHERE status IN ('queued', 'processing')
                    DO NOTHING
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(task_type.as_str())
            .bind(analysis_id)
            .bind(&payload)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(task) = inserted {
                info!("Created task {} ({})", task.id, task.task_type);
                self.publish(TaskEvent {
                    task: task.clone(),
                    analysis: None,
                });
                return Ok(CreatedTask {
                    task,
                    reused: false,
                });
            }

            let existing: Option<TaskRow> = sqlx::query_as(
                r#"
                SELECT * FROM analysis_tasks
                WHERE task_type = $1 AND analysis_id = $2
                  AND status IN ('queued', 'processing')
                "#,
            )
            .bind(task_type.as_str())
            .bind(analysis_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(task) = existing {
                info!("Reusing in-flight task {} ({})", task.id, task.task_type);
                return Ok(CreatedTask { task, reused: true });
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "task creation kept racing against terminal transitions"
        )))
    }

    pub async fn get(&self, id: Uuid) -> Result<TaskRow, AppError> {
        sqlx::query_as("SELECT * FROM analysis_tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {id} not found")))
    }

    /// The caller's non-terminal tasks, oldest first.
    pub async fn active_tasks(&self, user_id: Uuid) -> Result<Vec<TaskRow>, AppError> {
        Ok(sqlx::query_as(
            r#"
            SELECT * FROM analysis_tasks
            WHERE user_id = $1 AND status IN ('queued', 'processing')
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Deleting the row is the only cancellation primitive. It is advisory:
    /// a processor that already started will observe it when its guarded
    /// write-back matches zero rows.
    pub async fn cancel(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM analysis_tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Task {id} not found")));
        }
        info!("Task {id} cancelled");
        Ok(())
    }

    /// Claims the oldest queued task for processing. `SKIP LOCKED` keeps
    /// multiple workers from fighting over the same row.
    pub async fn claim_next(&self) -> Result<Option<TaskRow>, AppError> {
        let claimed: Option<TaskRow> = sqlx::query_as(
            r#"
            UPDATE analysis_tasks
            SET status = 'processing', stage = 'starting', updated_at = now()
            WHERE id = (
                SELECT id FROM analysis_tasks
                WHERE status = 'queued'
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        if let Some(task) = &claimed {
            self.publish(TaskEvent {
                task: task.clone(),
                analysis: None,
            });
        }
        Ok(claimed)
    }

    /// Returns false when the task is no longer processing (cancelled or
    /// already terminal), so the worker can stop early.
    pub async fn report_progress(
        &self,
        id: Uuid,
        progress: i32,
        stage: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE analysis_tasks
            SET progress = $2, stage = $3, updated_at = now()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(progress.clamp(0, 100))
        .bind(stage)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Terminal transition `processing -> completed`. `None` means the task
    /// row vanished (cancelled) and nothing was published.
    pub async fn complete(
        &self,
        id: Uuid,
        result_id: Option<Uuid>,
        analysis: Option<AnalysisRow>,
    ) -> Result<Option<TaskRow>, AppError> {
        let updated: Option<TaskRow> = sqlx::query_as(
            r#"
            UPDATE analysis_tasks
            SET status = 'completed', progress = 100, stage = 'done',
                result_id = $2, updated_at = now()
            WHERE id = $1 AND status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(task) = &updated {
            self.publish(TaskEvent {
                task: task.clone(),
                analysis,
            });
        }
        Ok(updated)
    }

    /// Terminal transition `processing -> failed` with a structured reason.
    pub async fn fail(
        &self,
        id: Uuid,
        reason: FailureReason,
        message: &str,
    ) -> Result<Option<TaskRow>, AppError> {
        let updated: Option<TaskRow> = sqlx::query_as(
            r#"
            UPDATE analysis_tasks
            SET status = 'failed', error_code = $2, error_message = $3, updated_at = now()
            WHERE id = $1 AND status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason.code())
        .bind(message)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(task) = &updated {
            self.publish(TaskEvent {
                task: task.clone(),
                analysis: None,
            });
        }
        Ok(updated)
    }
}
