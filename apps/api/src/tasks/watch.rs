//! Local subscribed view of one analysis, kept in sync from task events.
//!
//! Events carry no cross-document ordering guarantee, so adoption of a new
//! analysis snapshot is gated on `updated_at`: an event older than what we
//! already hold never regresses the view.

use crate::models::analysis::AnalysisRow;
use crate::models::task::{TaskStatus, TaskType};
use crate::tasks::queue::TaskEvent;

#[derive(Debug, Clone)]
pub struct AnalysisWatch {
    pub analysis: Option<AnalysisRow>,
    /// True while a promoted-or-discarded decision is pending on a draft.
    pub is_unsaved: bool,
    /// True while an optimize task for this analysis is in flight.
    pub optimizing: bool,
}

impl AnalysisWatch {
    pub fn new(initial: Option<AnalysisRow>) -> Self {
        let is_unsaved = initial.as_ref().map(|a| a.has_draft()).unwrap_or(false);
        Self {
            analysis: initial,
            is_unsaved,
            optimizing: false,
        }
    }

    fn watched_id(&self) -> Option<uuid::Uuid> {
        self.analysis.as_ref().map(|a| a.id)
    }

    /// Applies one task event. Events for other analyses are ignored.
    pub fn apply(&mut self, event: &TaskEvent) {
        let watched = self.watched_id();
        let event_target = event.task.analysis_id;
        if watched.is_some() && event_target.is_some() && watched != event_target {
            return;
        }

        if let Some(updated) = &event.analysis {
            if watched.is_some() && Some(updated.id) != watched {
                return;
            }
            let stale = self
                .analysis
                .as_ref()
                .map(|current| updated.updated_at < current.updated_at)
                .unwrap_or(false);
            if !stale {
                self.is_unsaved = updated.has_draft();
                self.analysis = Some(updated.clone());
            }
        }

        if event.task.task_type() == Some(TaskType::OptimizeResume) {
            match event.task.status() {
                Some(TaskStatus::Queued) | Some(TaskStatus::Processing) => {
                    self.optimizing = true;
                }
                Some(TaskStatus::Completed) | Some(TaskStatus::Failed) => {
                    self.optimizing = false;
                }
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use sqlx::types::Json;
    use tokio::sync::broadcast;
    use uuid::Uuid;

    use crate::matching::MatchReport;
    use crate::models::analysis::{
        JobPosting, OptimizedResume, ResumeContent, ResumeSection,
    };
    use crate::models::task::TaskRow;

    fn report(score: i32) -> MatchReport {
        MatchReport {
            ats_score: score,
            matched_skills: vec![],
            partial_skills: vec![],
            missing_skills: vec![],
            keyword_density: 0.0,
            experience_match: 1.0,
            recommendation: String::new(),
        }
    }

    fn analysis(id: Uuid, with_draft: bool) -> AnalysisRow {
        let now = Utc::now();
        AnalysisRow {
            id,
            user_id: Uuid::new_v4(),
            job: Json(JobPosting {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                skills: vec![],
                keywords: vec![],
                required_years: None,
                raw_text: String::new(),
            }),
            resume: Json(ResumeContent {
                skills: vec![],
                years_of_experience: None,
                raw_text: "resume".to_string(),
                source_key: None,
            }),
            ats_score: 65,
            match_analysis: Json(report(65)),
            optimized_resume: None,
            changes: None,
            draft_optimized_resume: with_draft.then(|| {
                Json(OptimizedResume {
                    summary: "draft".to_string(),
                    sections: vec![ResumeSection {
                        heading: "Experience".to_string(),
                        bullets: vec![],
                    }],
                })
            }),
            draft_changes: with_draft.then(|| Json(vec![])),
            draft_ats_score: with_draft.then_some(80),
            draft_match_analysis: with_draft.then(|| Json(report(80))),
            is_locked: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn task(analysis_id: Uuid, status: &str) -> TaskRow {
        let now = Utc::now();
        TaskRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            task_type: "optimize_resume".to_string(),
            analysis_id: Some(analysis_id),
            status: status.to_string(),
            progress: 0,
            stage: "queued".to_string(),
            payload: json!({}),
            result_id: None,
            error_code: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_completed_optimize_round_trip_marks_unsaved() {
        // Simulates the external-writer flow: a completed task event carries
        // the analysis with freshly written draft fields.
        let id = Uuid::new_v4();
        let mut watch = AnalysisWatch::new(Some(analysis(id, false)));
        assert!(!watch.is_unsaved);

        let (tx, mut rx) = broadcast::channel::<TaskEvent>(8);
        let mut updated = analysis(id, true);
        updated.updated_at = Utc::now() + Duration::seconds(1);
        tx.send(TaskEvent {
            task: task(id, "completed"),
            analysis: Some(updated),
        })
        .unwrap();

        let event = rx.recv().await.unwrap();
        watch.apply(&event);

        assert!(watch.is_unsaved);
        assert!(!watch.optimizing);
    }

    #[test]
    fn test_lifecycle_events_drive_the_optimizing_flag() {
        // The queue publishes an event at creation, at claim, and at the
        // terminal transition; the flag must track the whole sequence.
        let id = Uuid::new_v4();
        let mut watch = AnalysisWatch::new(Some(analysis(id, false)));

        watch.apply(&TaskEvent {
            task: task(id, "queued"),
            analysis: None,
        });
        assert!(watch.optimizing);

        watch.apply(&TaskEvent {
            task: task(id, "processing"),
            analysis: None,
        });
        assert!(watch.optimizing);

        let mut updated = analysis(id, true);
        updated.updated_at = Utc::now() + Duration::seconds(1);
        watch.apply(&TaskEvent {
            task: task(id, "completed"),
            analysis: Some(updated),
        });
        assert!(!watch.optimizing);
        assert!(watch.is_unsaved);
    }

    #[test]
    fn test_processing_sets_and_terminal_clears_optimizing() {
        let id = Uuid::new_v4();
        let mut watch = AnalysisWatch::new(Some(analysis(id, false)));

        watch.apply(&TaskEvent {
            task: task(id, "processing"),
            analysis: None,
        });
        assert!(watch.optimizing);

        watch.apply(&TaskEvent {
            task: task(id, "failed"),
            analysis: None,
        });
        assert!(!watch.optimizing);
    }

    #[test]
    fn test_stale_event_does_not_regress_state() {
        let id = Uuid::new_v4();
        let mut current = analysis(id, true);
        current.updated_at = Utc::now();
        let mut watch = AnalysisWatch::new(Some(current));
        assert!(watch.is_unsaved);

        // An out-of-order delivery carrying the pre-draft snapshot.
        let mut stale = analysis(id, false);
        stale.updated_at = Utc::now() - Duration::seconds(30);
        watch.apply(&TaskEvent {
            task: task(id, "completed"),
            analysis: Some(stale),
        });

        assert!(watch.is_unsaved, "stale snapshot must not clear the draft view");
    }

    #[test]
    fn test_events_for_other_analyses_are_ignored() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut watch = AnalysisWatch::new(Some(analysis(id, false)));

        watch.apply(&TaskEvent {
            task: task(other, "completed"),
            analysis: Some(analysis(other, true)),
        });

        assert!(!watch.is_unsaved);
        assert_eq!(watch.analysis.as_ref().map(|a| a.id), Some(id));
    }
}
