use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Stage of a tracked job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Saved,
    Submitted,
    Interviewing,
    Offer,
    Accepted,
    Rejected,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Saved => "saved",
            Stage::Submitted => "submitted",
            Stage::Interviewing => "interviewing",
            Stage::Offer => "offer",
            Stage::Accepted => "accepted",
            Stage::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Stage> {
        match s {
            "saved" => Some(Stage::Saved),
            "submitted" => Some(Stage::Submitted),
            "interviewing" => Some(Stage::Interviewing),
            "offer" => Some(Stage::Offer),
            "accepted" => Some(Stage::Accepted),
            "rejected" => Some(Stage::Rejected),
            _ => None,
        }
    }

    /// Once an application is submitted (or any later stage), the linked
    /// analysis is locked and no further optimization drafts may be created.
    pub fn locks_analysis(self) -> bool {
        !matches!(self, Stage::Saved)
    }
}

/// One append-only timeline entry. Timelines are never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// `current_stage` is always the projection of the latest timeline entry.
pub fn project_current_stage(timeline: &[StageEvent]) -> Stage {
    timeline.last().map(|e| e.stage).unwrap_or(Stage::Saved)
}

/// Denormalized application record, one-to-one with its analysis.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub analysis_id: Uuid,
    pub job_title: String,
    pub company: String,
    pub ats_score: i32,
    pub current_stage: String,
    pub timeline: Json<Vec<StageEvent>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(stage: Stage) -> StageEvent {
        StageEvent {
            stage,
            note: None,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_timeline_projects_saved() {
        assert_eq!(project_current_stage(&[]), Stage::Saved);
    }

    #[test]
    fn test_current_stage_is_latest_entry() {
        let timeline = vec![event(Stage::Saved), event(Stage::Submitted), event(Stage::Interviewing)];
        assert_eq!(project_current_stage(&timeline), Stage::Interviewing);
    }

    #[test]
    fn test_submitted_and_later_lock_the_analysis() {
        assert!(!Stage::Saved.locks_analysis());
        assert!(Stage::Submitted.locks_analysis());
        assert!(Stage::Interviewing.locks_analysis());
        assert!(Stage::Offer.locks_analysis());
        assert!(Stage::Accepted.locks_analysis());
        assert!(Stage::Rejected.locks_analysis());
    }

    #[test]
    fn test_stage_round_trips_through_str() {
        for stage in [
            Stage::Saved,
            Stage::Submitted,
            Stage::Interviewing,
            Stage::Offer,
            Stage::Accepted,
            Stage::Rejected,
        ] {
            assert_eq!(Stage::parse(stage.as_str()), Some(stage));
        }
    }
}
