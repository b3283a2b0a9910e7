use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::matching::MatchReport;

/// Importance tier of a skill in a job posting. Drives scoring weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceTier {
    Required,
    Preferred,
    NiceToHave,
}

impl ImportanceTier {
    /// Scoring weight: required skills count three times as much as nice-to-haves.
    pub fn weight(self) -> f32 {
        match self {
            ImportanceTier::Required => 3.0,
            ImportanceTier::Preferred => 2.0,
            ImportanceTier::NiceToHave => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub name: String,
    pub tier: ImportanceTier,
}

/// A job posting parsed into the fields the scorer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub skills: Vec<SkillRequirement>,
    pub keywords: Vec<String>,
    pub required_years: Option<f32>,
    pub raw_text: String,
}

/// Structured resume content as submitted by the client after upload/extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeContent {
    pub skills: Vec<String>,
    pub years_of_experience: Option<f32>,
    pub raw_text: String,
    /// S3 key of the uploaded original, when the resume came in as a file.
    pub source_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSection {
    pub heading: String,
    pub bullets: Vec<String>,
}

/// An AI-rewritten resume. Stored whole: a draft fully shadows the final
/// version, it is never a patch against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedResume {
    pub summary: String,
    pub sections: Vec<ResumeSection>,
}

/// One edit the optimizer made, shown to the user during draft review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeChange {
    pub section: String,
    pub before: String,
    pub after: String,
    pub reason: String,
}

/// A saved analysis: one resume scored against one job posting, plus the
/// optimization draft/final columns managed by `analysis::draft`.
///
/// Invariant: the four `draft_*` columns are either all set or all null.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job: Json<JobPosting>,
    pub resume: Json<ResumeContent>,
    pub ats_score: i32,
    pub match_analysis: Json<MatchReport>,
    pub optimized_resume: Option<Json<OptimizedResume>>,
    pub changes: Option<Json<Vec<ResumeChange>>>,
    pub draft_optimized_resume: Option<Json<OptimizedResume>>,
    pub draft_changes: Option<Json<Vec<ResumeChange>>>,
    pub draft_ats_score: Option<i32>,
    pub draft_match_analysis: Option<Json<MatchReport>>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRow {
    pub fn has_draft(&self) -> bool {
        self.draft_optimized_resume.is_some()
    }
}
