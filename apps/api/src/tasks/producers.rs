//! LLM producers: one function per task type, invoked by the worker.
//!
//! Each producer turns an analysis into its artifact: an optimization draft,
//! a cover letter, an interview prep guide, or learning-path entries. All LLM
//! access goes through `LlmClient::call_json`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm_client::{LlmClient, LlmError};
use crate::models::analysis::{AnalysisRow, OptimizedResume, ResumeChange, ResumeContent};
use crate::tasks::prompts::{
    COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM, LEARNING_PATH_PROMPT_TEMPLATE,
    LEARNING_PATH_SYSTEM, OPTIMIZE_PROMPT_TEMPLATE, OPTIMIZE_SYSTEM, PREP_GUIDE_PROMPT_TEMPLATE,
    PREP_GUIDE_SYSTEM,
};

#[derive(Debug, Deserialize)]
struct OptimizeOutput {
    optimized_resume: OptimizedResume,
    changes: Vec<ResumeChange>,
}

/// Produces the draft rewrite for an optimize task.
pub async fn optimize_resume(
    llm: &LlmClient,
    analysis: &AnalysisRow,
) -> Result<(OptimizedResume, Vec<ResumeChange>), LlmError> {
    let job = &analysis.job.0;
    let skills = job
        .skills
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let prompt = OPTIMIZE_PROMPT_TEMPLATE
        .replace("{resume_text}", &analysis.resume.0.raw_text)
        .replace("{job_title}", &job.title)
        .replace("{job_skills}", &skills);

    let output = llm
        .call_json::<OptimizeOutput>(&prompt, OPTIMIZE_SYSTEM)
        .await?;
    Ok((output.optimized_resume, output.changes))
}

/// Flattens an optimized resume back into scoreable content. Skills and
/// tenure carry over from the original; only the text changes, so draft and
/// final scores stay comparable.
pub fn optimized_to_content(optimized: &OptimizedResume, original: &ResumeContent) -> ResumeContent {
    let mut text = optimized.summary.clone();
    for section in &optimized.sections {
        text.push('\n');
        text.push_str(&section.heading);
        for bullet in &section.bullets {
            text.push('\n');
            text.push_str(bullet);
        }
    }

    ResumeContent {
        skills: original.skills.clone(),
        years_of_experience: original.years_of_experience,
        raw_text: text,
        source_key: original.source_key.clone(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoverLetter {
    pub greeting: String,
    pub body: Vec<String>,
    pub closing: String,
}

pub async fn cover_letter(llm: &LlmClient, analysis: &AnalysisRow) -> Result<Value, LlmError> {
    let job = &analysis.job.0;
    let prompt = COVER_LETTER_PROMPT_TEMPLATE
        .replace("{resume_text}", &analysis.resume.0.raw_text)
        .replace("{job_title}", &job.title)
        .replace("{company}", &job.company);

    let letter = llm
        .call_json::<CoverLetter>(&prompt, COVER_LETTER_SYSTEM)
        .await?;
    Ok(serde_json::to_value(letter).map_err(LlmError::Parse)?)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrepQuestion {
    pub question: String,
    pub guidance: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrepGuide {
    pub questions: Vec<PrepQuestion>,
    pub talking_points: Vec<String>,
}

pub async fn interview_prep(llm: &LlmClient, analysis: &AnalysisRow) -> Result<Value, LlmError> {
    let job = &analysis.job.0;
    let missing = missing_skill_names(analysis).join(", ");
    let prompt = PREP_GUIDE_PROMPT_TEMPLATE
        .replace("{resume_text}", &analysis.resume.0.raw_text)
        .replace("{job_title}", &job.title)
        .replace("{company}", &job.company)
        .replace("{missing_skills}", &missing);

    let guide = llm
        .call_json::<PrepGuide>(&prompt, PREP_GUIDE_SYSTEM)
        .await?;
    Ok(serde_json::to_value(guide).map_err(LlmError::Parse)?)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearningResource {
    pub title: String,
    pub kind: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LearningItem {
    pub skill: String,
    pub resources: Vec<LearningResource>,
}

#[derive(Debug, Deserialize)]
struct LearningPathOutput {
    entries: Vec<LearningItem>,
}

/// Builds learning-path entries from the analysis's skill gaps. No gaps, no
/// LLM call.
pub async fn learning_path(
    llm: &LlmClient,
    analysis: &AnalysisRow,
) -> Result<Vec<LearningItem>, LlmError> {
    let missing = missing_skill_names(analysis);
    if missing.is_empty() {
        return Ok(vec![]);
    }

    let prompt = LEARNING_PATH_PROMPT_TEMPLATE
        .replace("{job_title}", &analysis.job.0.title)
        .replace("{missing_skills}", &missing.join(", "));

    let output = llm
        .call_json::<LearningPathOutput>(&prompt, LEARNING_PATH_SYSTEM)
        .await?;
    Ok(output.entries)
}

fn missing_skill_names(analysis: &AnalysisRow) -> Vec<String> {
    analysis
        .match_analysis
        .0
        .missing_skills
        .iter()
        .map(|gap| gap.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::ResumeSection;

    #[test]
    fn test_optimized_content_keeps_skills_and_tenure() {
        let original = ResumeContent {
            skills: vec!["rust".to_string()],
            years_of_experience: Some(6.0),
            raw_text: "old text".to_string(),
            source_key: Some("resumes/u/r.pdf".to_string()),
        };
        let optimized = OptimizedResume {
            summary: "Seasoned backend engineer.".to_string(),
            sections: vec![ResumeSection {
                heading: "Experience".to_string(),
                bullets: vec!["Led Rust migration".to_string()],
            }],
        };

        let content = optimized_to_content(&optimized, &original);
        assert_eq!(content.skills, vec!["rust"]);
        assert_eq!(content.years_of_experience, Some(6.0));
        assert_eq!(content.source_key.as_deref(), Some("resumes/u/r.pdf"));
        assert!(content.raw_text.contains("Seasoned backend engineer."));
        assert!(content.raw_text.contains("Led Rust migration"));
    }

    #[test]
    fn test_optimize_output_deserializes_from_prompt_schema() {
        let json = r#"{
            "optimized_resume": {
                "summary": "s",
                "sections": [{"heading": "Experience", "bullets": ["b"]}]
            },
            "changes": [
                {"section": "Experience", "before": "a", "after": "b", "reason": "stronger"}
            ]
        }"#;
        let output: OptimizeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(output.changes.len(), 1);
        assert_eq!(output.optimized_resume.sections[0].bullets, vec!["b"]);
    }

    #[test]
    fn test_learning_output_accepts_null_urls() {
        let json = r#"{
            "entries": [
                {"skill": "Kubernetes", "resources": [
                    {"title": "Official docs", "kind": "docs", "url": null}
                ]}
            ]
        }"#;
        let output: LearningPathOutput = serde_json::from_str(json).unwrap();
        assert_eq!(output.entries[0].skill, "Kubernetes");
        assert!(output.entries[0].resources[0].url.is_none());
    }
}
