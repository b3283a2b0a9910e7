use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Task lifecycle states. Transitions are monotonic:
/// `queued -> processing -> completed | failed`, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s {
            "queued" => Some(TaskStatus::Queued),
            "processing" => Some(TaskStatus::Processing),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether `from -> to` is a legal lifecycle step.
    pub fn can_transition(from: TaskStatus, to: TaskStatus) -> bool {
        matches!(
            (from, to),
            (TaskStatus::Queued, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

/// The AI operations the queue knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    OptimizeResume,
    CoverLetter,
    LearningPath,
    InterviewPrep,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::OptimizeResume => "optimize_resume",
            TaskType::CoverLetter => "cover_letter",
            TaskType::LearningPath => "learning_path",
            TaskType::InterviewPrep => "interview_prep",
        }
    }

    pub fn parse(s: &str) -> Option<TaskType> {
        match s {
            "optimize_resume" => Some(TaskType::OptimizeResume),
            "cover_letter" => Some(TaskType::CoverLetter),
            "learning_path" => Some(TaskType::LearningPath),
            "interview_prep" => Some(TaskType::InterviewPrep),
            _ => None,
        }
    }

    /// Only draft-producing tasks are blocked by a locked analysis.
    pub fn produces_draft(self) -> bool {
        matches!(self, TaskType::OptimizeResume)
    }
}

/// Why a task failed. Structured so callers never have to sniff error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The task document was deleted mid-flight (user cancellation).
    Cancelled,
    /// The target analysis no longer exists or became unwritable.
    AnalysisMissing,
    /// The LLM call failed after retries.
    Llm,
    Internal,
}

impl FailureReason {
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::Cancelled => "cancelled",
            FailureReason::AnalysisMissing => "analysis_missing",
            FailureReason::Llm => "llm",
            FailureReason::Internal => "internal",
        }
    }

    pub fn parse(s: &str) -> Option<FailureReason> {
        match s {
            "cancelled" => Some(FailureReason::Cancelled),
            "analysis_missing" => Some(FailureReason::AnalysisMissing),
            "llm" => Some(FailureReason::Llm),
            "internal" => Some(FailureReason::Internal),
            _ => None,
        }
    }

    /// Cancellation-shaped failures are swallowed by clients instead of alerted.
    pub fn is_silent(self) -> bool {
        matches!(
            self,
            FailureReason::Cancelled | FailureReason::AnalysisMissing
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_type: String,
    pub analysis_id: Option<Uuid>,
    pub status: String,
    pub progress: i32,
    pub stage: String,
    pub payload: Value,
    pub result_id: Option<Uuid>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRow {
    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::parse(&self.status)
    }

    pub fn task_type(&self) -> Option<TaskType> {
        TaskType::parse(&self.task_type)
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.error_code.as_deref().and_then(FailureReason::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_is_monotonic() {
        use TaskStatus::*;
        assert!(TaskStatus::can_transition(Queued, Processing));
        assert!(TaskStatus::can_transition(Processing, Completed));
        assert!(TaskStatus::can_transition(Processing, Failed));

        // No step ever moves backward or skips processing.
        assert!(!TaskStatus::can_transition(Processing, Queued));
        assert!(!TaskStatus::can_transition(Completed, Processing));
        assert!(!TaskStatus::can_transition(Completed, Failed));
        assert!(!TaskStatus::can_transition(Failed, Queued));
        assert!(!TaskStatus::can_transition(Queued, Completed));
        assert!(!TaskStatus::can_transition(Queued, Failed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            TaskStatus::Queued,
            TaskStatus::Processing,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("unknown"), None);
    }

    #[test]
    fn test_cancellation_shaped_failures_are_silent() {
        assert!(FailureReason::Cancelled.is_silent());
        assert!(FailureReason::AnalysisMissing.is_silent());
        assert!(!FailureReason::Llm.is_silent());
        assert!(!FailureReason::Internal.is_silent());
    }

    #[test]
    fn test_only_optimize_produces_a_draft() {
        assert!(TaskType::OptimizeResume.produces_draft());
        assert!(!TaskType::CoverLetter.produces_draft());
        assert!(!TaskType::LearningPath.produces_draft());
        assert!(!TaskType::InterviewPrep.produces_draft());
    }
}
