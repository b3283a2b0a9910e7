//! Job parser: extracts the structured posting the scorer consumes from raw
//! text pasted (or scraped client-side) by the user.

use serde::Deserialize;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::matching::prompts::{JOB_PARSE_PROMPT_TEMPLATE, JOB_PARSE_SYSTEM};
use crate::models::analysis::{JobPosting, SkillRequirement};

/// LLM output shape. `raw_text` is attached afterward so the prompt schema
/// stays minimal.
#[derive(Debug, Deserialize)]
struct ParsedJobFields {
    title: String,
    company: String,
    skills: Vec<SkillRequirement>,
    keywords: Vec<String>,
    required_years: Option<f32>,
}

/// Parses a raw job posting into a `JobPosting` using the LLM.
pub async fn parse_job(job_text: &str, llm: &LlmClient) -> Result<JobPosting, AppError> {
    let prompt = JOB_PARSE_PROMPT_TEMPLATE.replace("{job_text}", job_text);
    let fields = llm
        .call_json::<ParsedJobFields>(&prompt, JOB_PARSE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Job parsing failed: {e}")))?;

    Ok(JobPosting {
        title: fields.title,
        company: fields.company,
        skills: fields.skills,
        keywords: fields.keywords,
        required_years: fields.required_years,
        raw_text: job_text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::ImportanceTier;

    #[test]
    fn test_parsed_fields_deserialize_from_prompt_schema() {
        let json = r#"{
            "title": "Senior Backend Engineer",
            "company": "Acme Corp",
            "skills": [
                {"name": "Rust", "tier": "required"},
                {"name": "GraphQL", "tier": "nice_to_have"}
            ],
            "keywords": ["gRPC"],
            "required_years": 5.0
        }"#;
        let fields: ParsedJobFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.title, "Senior Backend Engineer");
        assert_eq!(fields.skills.len(), 2);
        assert_eq!(fields.skills[0].tier, ImportanceTier::Required);
        assert_eq!(fields.skills[1].tier, ImportanceTier::NiceToHave);
        assert_eq!(fields.required_years, Some(5.0));
    }

    #[test]
    fn test_required_years_may_be_null() {
        let json = r#"{
            "title": "Engineer",
            "company": "Unknown",
            "skills": [],
            "keywords": [],
            "required_years": null
        }"#;
        let fields: ParsedJobFields = serde_json::from_str(json).unwrap();
        assert!(fields.required_years.is_none());
    }
}
