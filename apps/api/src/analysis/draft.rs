//! Draft-vs-final optimization state, modeled as an explicit tagged union.
//!
//! A draft is an unvalidated proposal that fully shadows the published
//! fields; it is never merged into them. Promote and discard are pure
//! transitions over this union; persistence maps them onto the analysis row.

use thiserror::Error;

use crate::matching::MatchReport;
use crate::models::analysis::{AnalysisRow, OptimizedResume, ResumeChange};

/// The canonical fields shown in list views and exports.
#[derive(Debug, Clone)]
pub struct PublishedFields {
    pub ats_score: i32,
    pub match_analysis: MatchReport,
    pub optimized_resume: Option<OptimizedResume>,
    pub changes: Option<Vec<ResumeChange>>,
}

/// An AI-produced proposal awaiting user review.
#[derive(Debug, Clone)]
pub struct ProposedFields {
    pub ats_score: i32,
    pub match_analysis: MatchReport,
    pub optimized_resume: OptimizedResume,
    pub changes: Vec<ResumeChange>,
}

#[derive(Debug, Clone)]
pub enum OptimizationState {
    Published(PublishedFields),
    PendingReview {
        published: PublishedFields,
        proposed: ProposedFields,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("nothing to promote: analysis has no draft")]
    NothingToPromote,
}

impl OptimizationState {
    /// Reconstructs the union from a stored row. A draft exists iff the
    /// shadow resume column is set; the other draft columns ride along.
    pub fn from_row(row: &AnalysisRow) -> Self {
        let published = PublishedFields {
            ats_score: row.ats_score,
            match_analysis: row.match_analysis.0.clone(),
            optimized_resume: row.optimized_resume.as_ref().map(|j| j.0.clone()),
            changes: row.changes.as_ref().map(|j| j.0.clone()),
        };

        match &row.draft_optimized_resume {
            None => OptimizationState::Published(published),
            Some(draft_resume) => {
                let proposed = ProposedFields {
                    ats_score: row.draft_ats_score.unwrap_or(row.ats_score),
                    match_analysis: row
                        .draft_match_analysis
                        .as_ref()
                        .map(|j| j.0.clone())
                        .unwrap_or_else(|| row.match_analysis.0.clone()),
                    optimized_resume: draft_resume.0.clone(),
                    changes: row
                        .draft_changes
                        .as_ref()
                        .map(|j| j.0.clone())
                        .unwrap_or_default(),
                };
                OptimizationState::PendingReview {
                    published,
                    proposed,
                }
            }
        }
    }

    pub fn has_draft(&self) -> bool {
        matches!(self, OptimizationState::PendingReview { .. })
    }

    /// The "original" score shown for delta purposes while a draft is under
    /// review: the last SAVED score, not the lifetime-original one. With no
    /// draft there is no baseline (clean view).
    pub fn baseline_score(&self) -> Option<i32> {
        match self {
            OptimizationState::Published(_) => None,
            OptimizationState::PendingReview { published, .. } => Some(published.ats_score),
        }
    }

    /// Makes the proposal authoritative. Every proposed field replaces its
    /// published counterpart exactly once, including the top-level ATS score.
    pub fn promote(self) -> Result<PublishedFields, DraftError> {
        match self {
            OptimizationState::Published(_) => Err(DraftError::NothingToPromote),
            OptimizationState::PendingReview { proposed, .. } => Ok(PublishedFields {
                ats_score: proposed.ats_score,
                match_analysis: proposed.match_analysis,
                optimized_resume: Some(proposed.optimized_resume),
                changes: Some(proposed.changes),
            }),
        }
    }

    /// Drops the proposal. Published fields are untouched.
    pub fn discard(self) -> PublishedFields {
        match self {
            OptimizationState::Published(published) => published,
            OptimizationState::PendingReview { published, .. } => published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::ResumeSection;

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

    fn optimized(summary: &str) -> OptimizedResume {
        OptimizedResume {
            summary: summary.to_string(),
            sections: vec![ResumeSection {
                heading: "Experience".to_string(),
                bullets: vec!["Shipped things".to_string()],
            }],
        }
    }

    fn published(score: i32) -> PublishedFields {
        PublishedFields {
            ats_score: score,
            match_analysis: report(score),
            optimized_resume: None,
            changes: None,
        }
    }

    fn pending(final_score: i32, draft_score: i32) -> OptimizationState {
        OptimizationState::PendingReview {
            published: published(final_score),
            proposed: ProposedFields {
                ats_score: draft_score,
                match_analysis: report(draft_score),
                optimized_resume: optimized("draft"),
                changes: vec![ResumeChange {
                    section: "Experience".to_string(),
                    before: "old".to_string(),
                    after: "new".to_string(),
                    reason: "stronger verb".to_string(),
                }],
            },
        }
    }

    #[test]
    fn test_promote_without_draft_fails_and_changes_nothing() {
        let state = OptimizationState::Published(published(65));
        let before = state.clone();
        assert_eq!(state.promote().unwrap_err(), DraftError::NothingToPromote);
        // The untouched clone still carries the original score.
        assert_eq!(before.discard().ats_score, 65);
    }

    #[test]
    fn test_promote_copies_every_proposed_field_once() {
        let promoted = pending(65, 80).promote().unwrap();
        assert_eq!(promoted.ats_score, 80);
        assert_eq!(promoted.match_analysis.ats_score, 80);
        let resume = promoted.optimized_resume.unwrap();
        assert_eq!(resume.summary, "draft");
        assert_eq!(promoted.changes.unwrap().len(), 1);
    }

    #[test]
    fn test_promoted_state_has_no_draft() {
        let state = OptimizationState::Published(pending(65, 80).promote().unwrap());
        assert!(!state.has_draft());
        assert_eq!(state.baseline_score(), None);
    }

    #[test]
    fn test_discard_never_mutates_published_fields() {
        let final_before = pending(72, 90);
        let published = final_before.discard();
        assert_eq!(published.ats_score, 72);
        assert!(published.optimized_resume.is_none());
        assert!(published.changes.is_none());
    }

    #[test]
    fn test_baseline_is_last_saved_score_while_draft_exists() {
        // The delta view compares against the current edit session's start,
        // not lifetime history.
        assert_eq!(pending(65, 80).baseline_score(), Some(65));
        assert_eq!(
            OptimizationState::Published(published(65)).baseline_score(),
            None
        );
    }
}
