//! In-process task worker.
//!
//! Claims queued tasks, runs the producer for the task type, writes results
//! back, and drives the terminal transition. Every write-back is guarded, so
//! a task deleted mid-flight (the cancellation primitive) surfaces as a
//! zero-row update here and is logged silently instead of alerted.

use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::store;
use crate::errors::AppError;
use crate::models::analysis::AnalysisRow;
use crate::models::task::{FailureReason, TaskRow, TaskType};
use crate::notify::{notify_best_effort, DeepLink};
use crate::state::AppState;
use crate::tasks::producers;

pub fn spawn(state: AppState) -> JoinHandle<()> {
    tokio::spawn(run_loop(state))
}

async fn run_loop(state: AppState) {
    let poll = Duration::from_millis(state.config.worker_poll_ms);
    info!("Task worker started (poll every {:?})", poll);

    loop {
        match state.tasks.claim_next().await {
            Ok(Some(task)) => process(&state, task).await,
            Ok(None) => tokio::time::sleep(poll).await,
            Err(e) => {
                warn!("Worker failed to claim a task: {e}");
                tokio::time::sleep(poll).await;
            }
        }
    }
}

struct TaskOutcome {
    result_id: Option<Uuid>,
    analysis: Option<AnalysisRow>,
    notification: Option<(String, DeepLink)>,
}

struct TaskFailure {
    reason: FailureReason,
    message: String,
}

impl TaskFailure {
    fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

async fn process(state: &AppState, task: TaskRow) {
    let task_id = task.id;
    let user_id = task.user_id;
    info!("Processing task {task_id} ({})", task.task_type);

    match run_task(state, &task).await {
        Ok(outcome) => match state
            .tasks
            .complete(task_id, outcome.result_id, outcome.analysis)
            .await
        {
            Ok(Some(_)) => {
                info!("Task {task_id} completed");
                if let Some((title, link)) = outcome.notification {
                    notify_best_effort(state.notifier.as_ref(), user_id, &title, link).await;
                }
            }
            Ok(None) => info!("Task {task_id} was cancelled before completion"),
            Err(e) => error!("Failed to record completion of task {task_id}: {e}"),
        },
        Err(failure) => {
            if failure.reason.is_silent() {
                info!(
                    "Task {task_id} ended silently ({}): {}",
                    failure.reason.code(),
                    failure.message
                );
            } else {
                warn!(
                    "Task {task_id} failed ({}): {}",
                    failure.reason.code(),
                    failure.message
                );
            }
            match state
                .tasks
                .fail(task_id, failure.reason, &failure.message)
                .await
            {
                Ok(Some(_)) => {}
                Ok(None) => info!("Task {task_id} was cancelled before its failure was recorded"),
                Err(e) => error!("Failed to record failure of task {task_id}: {e}"),
            }
        }
    }
}

async fn run_task(state: &AppState, task: &TaskRow) -> Result<TaskOutcome, TaskFailure> {
    let task_type = task
        .task_type()
        .ok_or_else(|| TaskFailure::new(FailureReason::Internal, format!("unknown task type '{}'", task.task_type)))?;
    let analysis_id = task
        .analysis_id
        .ok_or_else(|| TaskFailure::new(FailureReason::Internal, "task has no analysis_id"))?;

    progress(state, task.id, 10, "loading").await?;

    let analysis = match store::get_analysis(&state.db, analysis_id).await {
        Ok(a) => a,
        Err(AppError::NotFound(_)) => {
            return Err(TaskFailure::new(
                FailureReason::AnalysisMissing,
                format!("analysis {analysis_id} no longer exists"),
            ))
        }
        Err(e) => return Err(TaskFailure::new(FailureReason::Internal, e.to_string())),
    };

    match task_type {
        TaskType::OptimizeResume => optimize(state, task, &analysis).await,
        TaskType::CoverLetter => {
            progress(state, task.id, 40, "writing").await?;
            let content = producers::cover_letter(&state.llm, &analysis)
                .await
                .map_err(|e| TaskFailure::new(FailureReason::Llm, e.to_string()))?;
            let doc_id = insert_document(state, &analysis, "cover_letter", &content).await?;
            Ok(TaskOutcome {
                result_id: Some(doc_id),
                analysis: None,
                notification: Some((
                    "Your cover letter is ready".to_string(),
                    DeepLink {
                        route: "/documents".to_string(),
                        params: json!({ "documentId": doc_id }),
                    },
                )),
            })
        }
        TaskType::InterviewPrep => {
            progress(state, task.id, 40, "preparing").await?;
            let content = producers::interview_prep(&state.llm, &analysis)
                .await
                .map_err(|e| TaskFailure::new(FailureReason::Llm, e.to_string()))?;
            let doc_id = insert_document(state, &analysis, "interview_prep", &content).await?;
            Ok(TaskOutcome {
                result_id: Some(doc_id),
                analysis: None,
                notification: Some((
                    "Your interview prep guide is ready".to_string(),
                    DeepLink {
                        route: "/documents".to_string(),
                        params: json!({ "documentId": doc_id }),
                    },
                )),
            })
        }
        TaskType::LearningPath => {
            progress(state, task.id, 40, "building path").await?;
            let items = producers::learning_path(&state.llm, &analysis)
                .await
                .map_err(|e| TaskFailure::new(FailureReason::Llm, e.to_string()))?;
            for item in &items {
                sqlx::query(
                    r#"
                    INSERT INTO user_learning (id, user_id, analysis_id, skill, resources)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(analysis.user_id)
                .bind(analysis.id)
                .bind(&item.skill)
                .bind(serde_json::to_value(&item.resources).unwrap_or_default())
                .execute(&state.db)
                .await
                .map_err(|e| TaskFailure::new(FailureReason::Internal, e.to_string()))?;
            }
            Ok(TaskOutcome {
                result_id: None,
                analysis: None,
                notification: Some((
                    "Your learning path is ready".to_string(),
                    DeepLink {
                        route: "/learning".to_string(),
                        params: json!({ "analysisId": analysis.id }),
                    },
                )),
            })
        }
    }
}

async fn optimize(
    state: &AppState,
    task: &TaskRow,
    analysis: &AnalysisRow,
) -> Result<TaskOutcome, TaskFailure> {
    progress(state, task.id, 30, "optimizing").await?;

    let (optimized, changes) = producers::optimize_resume(&state.llm, analysis)
        .await
        .map_err(|e| TaskFailure::new(FailureReason::Llm, e.to_string()))?;

    progress(state, task.id, 70, "rescoring").await?;

    // The draft score comes from the same deterministic scorer as the final
    // one, so promote deltas are meaningful.
    let draft_content = producers::optimized_to_content(&optimized, &analysis.resume.0);
    let draft_report = state
        .scorer
        .score(&draft_content, &analysis.job.0)
        .await
        .map_err(|e| TaskFailure::new(FailureReason::Internal, e.to_string()))?;

    let updated = store::set_draft(
        &state.db,
        analysis.id,
        &optimized,
        &changes,
        draft_report.ats_score,
        &draft_report,
    )
    .await
    .map_err(|e| TaskFailure::new(FailureReason::Internal, e.to_string()))?
    .ok_or_else(|| {
        TaskFailure::new(
            FailureReason::AnalysisMissing,
            format!("analysis {} vanished or was locked mid-flight", analysis.id),
        )
    })?;

    progress(state, task.id, 95, "finishing").await?;

    Ok(TaskOutcome {
        result_id: Some(analysis.id),
        analysis: Some(updated.clone()),
        notification: Some((
            format!(
                "Draft ready: {} now scores {}",
                updated.job.0.title,
                updated.draft_ats_score.unwrap_or(updated.ats_score)
            ),
            DeepLink {
                route: "/analysis".to_string(),
                params: json!({ "analysisId": analysis.id }),
            },
        )),
    })
}

async fn progress(
    state: &AppState,
    task_id: Uuid,
    pct: i32,
    stage: &str,
) -> Result<(), TaskFailure> {
    match state.tasks.report_progress(task_id, pct, stage).await {
        Ok(true) => Ok(()),
        // Zero rows: the task row is gone or already terminal.
        Ok(false) => Err(TaskFailure::new(
            FailureReason::Cancelled,
            "task no longer active",
        )),
        Err(e) => Err(TaskFailure::new(FailureReason::Internal, e.to_string())),
    }
}

async fn insert_document(
    state: &AppState,
    analysis: &AnalysisRow,
    doc_type: &str,
    content: &serde_json::Value,
) -> Result<Uuid, TaskFailure> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO generated_documents (id, user_id, analysis_id, doc_type, content)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(analysis.user_id)
    .bind(analysis.id)
    .bind(doc_type)
    .bind(content)
    .execute(&state.db)
    .await
    .map_err(|e| TaskFailure::new(FailureReason::Internal, e.to_string()))?;
    Ok(id)
}
