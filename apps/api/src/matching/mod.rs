//! ATS match scoring: a pluggable, trait-based scorer measuring a resume
//! against a parsed job posting.
//!
//! Default: `WeightedSumScorer` (pure-Rust, deterministic, no I/O). The same
//! scorer re-scores optimization drafts, so draft and final ATS numbers are
//! always comparable.

pub mod job_parser;
mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::analysis::{ImportanceTier, JobPosting, ResumeContent};

/// Component weights of the composite ATS score. Weights of components that
/// are absent from a posting (e.g. no keyword list) are renormalized away.
const SKILL_WEIGHT: f32 = 0.55;
const KEYWORD_WEIGHT: f32 = 0.25;
const EXPERIENCE_WEIGHT: f32 = 0.20;

const PARTIAL_CREDIT: f32 = 0.5;

/// A job-posting skill the resume covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatch {
    pub name: String,
    pub tier: ImportanceTier,
    /// Where the match was found: the structured skill list or the raw text.
    pub evidence: String,
}

/// A job-posting skill the resume does not cover. Feeds learning-path tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGap {
    pub name: String,
    pub tier: ImportanceTier,
}

/// Full match report persisted on the analysis (and on drafts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub ats_score: i32,
    pub matched_skills: Vec<SkillMatch>,
    pub partial_skills: Vec<SkillMatch>,
    pub missing_skills: Vec<SkillGap>,
    pub keyword_density: f32,
    pub experience_match: f32,
    pub recommendation: String,
}

/// The scorer trait. Carried in `AppState` as `Arc<dyn MatchScorer>` so a
/// semantic backend can be swapped in without touching handlers or the worker.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(
        &self,
        resume: &ResumeContent,
        job: &JobPosting,
    ) -> Result<MatchReport, AppError>;
}

/// Deterministic weighted-sum scorer over skill tiers, keyword density, and
/// experience match, clipped to [0, 100].
pub struct WeightedSumScorer;

#[async_trait]
impl MatchScorer for WeightedSumScorer {
    async fn score(
        &self,
        resume: &ResumeContent,
        job: &JobPosting,
    ) -> Result<MatchReport, AppError> {
        Ok(compute_match(resume, job))
    }
}

pub fn compute_match(resume: &ResumeContent, job: &JobPosting) -> MatchReport {
    if job.skills.is_empty() && job.keywords.is_empty() {
        return MatchReport {
            ats_score: 0,
            matched_skills: vec![],
            partial_skills: vec![],
            missing_skills: vec![],
            keyword_density: 0.0,
            experience_match: 0.0,
            recommendation: "No skills or keywords found in the job posting, so it cannot be scored."
                .to_string(),
        };
    }

    let resume_skills: Vec<String> = resume.skills.iter().map(|s| s.to_lowercase()).collect();
    let resume_text = resume.raw_text.to_lowercase();

    let mut matched_skills = Vec::new();
    let mut partial_skills = Vec::new();
    let mut missing_skills = Vec::new();

    let mut total_weight = 0.0_f32;
    let mut earned = 0.0_f32;

    for req in &job.skills {
        let needle = req.name.to_lowercase();
        total_weight += req.tier.weight();

        let exact = resume_skills.iter().any(|s| *s == needle);
        let partial = !exact
            && (resume_skills
                .iter()
                .any(|s| s.contains(&needle) || needle.contains(s.as_str()))
                || resume_text.contains(&needle));

        if exact {
            earned += req.tier.weight();
            matched_skills.push(SkillMatch {
                name: req.name.clone(),
                tier: req.tier,
                evidence: "skills list".to_string(),
            });
        } else if partial {
            earned += PARTIAL_CREDIT * req.tier.weight();
            partial_skills.push(SkillMatch {
                name: req.name.clone(),
                tier: req.tier,
                evidence: "resume text".to_string(),
            });
        } else {
            missing_skills.push(SkillGap {
                name: req.name.clone(),
                tier: req.tier,
            });
        }
    }

    let skill_component = if total_weight > 0.0 {
        earned / total_weight
    } else {
        0.0
    };

    let keyword_density = if job.keywords.is_empty() {
        0.0
    } else {
        let hits = job
            .keywords
            .iter()
            .filter(|k| resume_text.contains(&k.to_lowercase()))
            .count();
        hits as f32 / job.keywords.len() as f32
    };

    let experience_match = match (job.required_years, resume.years_of_experience) {
        (None, _) => 1.0,
        // Unknown resume tenure against a stated requirement: half credit.
        (Some(_), None) => 0.5,
        (Some(req), Some(_)) if req <= 0.0 => 1.0,
        (Some(req), Some(have)) => (have / req).min(1.0),
    };

    // Renormalize over the components this posting actually has.
    let mut weight_sum = EXPERIENCE_WEIGHT;
    let mut score_sum = EXPERIENCE_WEIGHT * experience_match;
    if !job.skills.is_empty() {
        weight_sum += SKILL_WEIGHT;
        score_sum += SKILL_WEIGHT * skill_component;
    }
    if !job.keywords.is_empty() {
        weight_sum += KEYWORD_WEIGHT;
        score_sum += KEYWORD_WEIGHT * keyword_density;
    }

    let ats_score = ((score_sum / weight_sum) * 100.0).round().clamp(0.0, 100.0) as i32;

    let recommendation = build_recommendation(ats_score, &missing_skills);

    MatchReport {
        ats_score,
        matched_skills,
        partial_skills,
        missing_skills,
        keyword_density,
        experience_match,
        recommendation,
    }
}

fn build_recommendation(score: i32, missing: &[SkillGap]) -> String {
    let top_gaps: Vec<&str> = missing.iter().take(3).map(|g| g.name.as_str()).collect();

    if score >= 80 {
        "Strong match. Your resume covers the key requirements of this posting.".to_string()
    } else if score >= 60 {
        format!(
            "Moderate match ({score}/100). Consider addressing: {}.",
            top_gaps.join(", ")
        )
    } else {
        format!(
            "Low match ({score}/100). Significant gaps: {}. An optimization pass or a learning path may help.",
            top_gaps.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::SkillRequirement;

    fn job(skills: Vec<(&str, ImportanceTier)>, keywords: Vec<&str>, years: Option<f32>) -> JobPosting {
        JobPosting {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            skills: skills
                .into_iter()
                .map(|(name, tier)| SkillRequirement {
                    name: name.to_string(),
                    tier,
                })
                .collect(),
            keywords: keywords.into_iter().map(String::from).collect(),
            required_years: years,
            raw_text: String::new(),
        }
    }

    fn resume(skills: Vec<&str>, text: &str, years: Option<f32>) -> ResumeContent {
        ResumeContent {
            skills: skills.into_iter().map(String::from).collect(),
            years_of_experience: years,
            raw_text: text.to_string(),
            source_key: None,
        }
    }

    #[test]
    fn test_full_coverage_scores_100() {
        let job = job(
            vec![("Rust", ImportanceTier::Required), ("SQL", ImportanceTier::Preferred)],
            vec!["backend"],
            Some(3.0),
        );
        let resume = resume(vec!["rust", "sql"], "Senior backend engineer", Some(5.0));

        let report = compute_match(&resume, &job);
        assert_eq!(report.ats_score, 100);
        assert_eq!(report.matched_skills.len(), 2);
        assert!(report.missing_skills.is_empty());
    }

    #[test]
    fn test_score_stays_within_bounds() {
        let job = job(vec![("Rust", ImportanceTier::Required)], vec![], None);
        let report = compute_match(&resume(vec![], "", None), &job);
        assert!((0..=100).contains(&report.ats_score));

        let report = compute_match(&resume(vec!["rust"], "rust", Some(50.0)), &job);
        assert!((0..=100).contains(&report.ats_score));
    }

    #[test]
    fn test_required_tier_outweighs_nice_to_have() {
        // Covering only the required skill must beat covering only the nice-to-have.
        let posting = job(
            vec![
                ("Rust", ImportanceTier::Required),
                ("Figma", ImportanceTier::NiceToHave),
            ],
            vec![],
            None,
        );
        let required_only = compute_match(&resume(vec!["rust"], "", None), &posting);
        let nice_only = compute_match(&resume(vec!["figma"], "", None), &posting);
        assert!(required_only.ats_score > nice_only.ats_score);
    }

    #[test]
    fn test_text_mention_earns_partial_credit() {
        let posting = job(vec![("Kubernetes", ImportanceTier::Required)], vec![], None);
        let report = compute_match(
            &resume(vec![], "Deployed services on Kubernetes clusters", None),
            &posting,
        );
        assert_eq!(report.partial_skills.len(), 1);
        assert!(report.matched_skills.is_empty());
        assert!(report.missing_skills.is_empty());
    }

    #[test]
    fn test_uncovered_skill_becomes_gap() {
        let posting = job(vec![("Terraform", ImportanceTier::Preferred)], vec![], None);
        let report = compute_match(&resume(vec!["rust"], "rust services", None), &posting);
        assert_eq!(report.missing_skills.len(), 1);
        assert_eq!(report.missing_skills[0].name, "Terraform");
    }

    #[test]
    fn test_empty_posting_cannot_be_scored() {
        let posting = job(vec![], vec![], None);
        let report = compute_match(&resume(vec!["rust"], "rust", Some(4.0)), &posting);
        assert_eq!(report.ats_score, 0);
        assert!(report.recommendation.contains("cannot be scored"));
    }

    #[test]
    fn test_keyword_density_counts_text_hits() {
        let posting = job(vec![], vec!["grpc", "kafka", "terraform", "sql"], None);
        let report = compute_match(
            &resume(vec![], "Built gRPC services backed by SQL", None),
            &posting,
        );
        assert!((report.keyword_density - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_experience_shortfall_scales_linearly() {
        let posting = job(vec![], vec!["rust"], Some(8.0));
        let report = compute_match(&resume(vec![], "rust", Some(4.0)), &posting);
        assert!((report.experience_match - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_excess_experience_is_capped() {
        let posting = job(vec![], vec!["rust"], Some(2.0));
        let report = compute_match(&resume(vec![], "rust", Some(20.0)), &posting);
        assert!((report.experience_match - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_recommendation_names_top_gaps() {
        let posting = job(
            vec![
                ("Kafka", ImportanceTier::Required),
                ("Go", ImportanceTier::Required),
            ],
            vec![],
            None,
        );
        let report = compute_match(&resume(vec![], "", None), &posting);
        assert!(report.recommendation.contains("Kafka"));
        assert!(report.recommendation.contains("Go"));
    }
}
