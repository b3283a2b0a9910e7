// LLM prompt constants for the task producers.

pub const OPTIMIZE_SYSTEM: &str =
    "You are an expert resume writer optimizing a resume for a specific job posting. \
    Rewrite content truthfully: never invent experience the candidate does not have. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Replace `{resume_text}`, `{job_title}`, `{job_skills}` before sending.
pub const OPTIMIZE_PROMPT_TEMPLATE: &str = r#"Rewrite the resume below so it scores better against the job posting, without fabricating anything.

Return a JSON object with this EXACT schema:
{
  "optimized_resume": {
    "summary": "Two-sentence professional summary tailored to the role",
    "sections": [
      {"heading": "Experience", "bullets": ["...", "..."]}
    ]
  },
  "changes": [
    {
      "section": "Experience",
      "before": "original phrasing",
      "after": "rewritten phrasing",
      "reason": "why this is stronger for the posting"
    }
  ]
}

Rules:
- Keep every fact from the original resume; only rephrase, reorder, and surface relevant skills.
- Mirror terminology from the posting's skill list where the resume genuinely supports it.
- Record one "changes" entry per meaningful edit.

Target role: {job_title}
Skills the posting asks for: {job_skills}

Resume:
{resume_text}
"#;

pub const COVER_LETTER_SYSTEM: &str =
    "You are an expert cover letter writer. Write in a confident, specific voice \
    grounded in the candidate's actual resume. \
    You MUST respond with valid JSON only, no markdown fences.";

/// Replace `{resume_text}`, `{job_title}`, `{company}` before sending.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter for the role below, grounded only in the resume.

Return a JSON object with this EXACT schema:
{
  "greeting": "Dear Hiring Manager,",
  "body": ["paragraph 1", "paragraph 2", "paragraph 3"],
  "closing": "Sincerely,"
}

Role: {job_title} at {company}

Resume:
{resume_text}
"#;

pub const PREP_GUIDE_SYSTEM: &str =
    "You are an experienced interview coach preparing a candidate for a specific role. \
    You MUST respond with valid JSON only, no markdown fences.";

/// Replace `{resume_text}`, `{job_title}`, `{company}`, `{missing_skills}` before sending.
pub const PREP_GUIDE_PROMPT_TEMPLATE: &str = r#"Prepare an interview guide for the role below.

Return a JSON object with this EXACT schema:
{
  "questions": [
    {"question": "likely interview question", "guidance": "how this candidate should answer, referencing their background"}
  ],
  "talking_points": ["strength worth volunteering", "..."]
}

Cover 6-10 questions. Include at least one question probing each gap listed
below, with guidance on answering honestly despite the gap.

Role: {job_title} at {company}
Known skill gaps: {missing_skills}

Resume:
{resume_text}
"#;

pub const LEARNING_PATH_SYSTEM: &str =
    "You are a technical mentor building a focused learning path. \
    You MUST respond with valid JSON only, no markdown fences.";

/// Replace `{job_title}` and `{missing_skills}` before sending.
pub const LEARNING_PATH_PROMPT_TEMPLATE: &str = r#"For each skill gap below, propose learning resources that would make a candidate credible for the role "{job_title}".

Return a JSON object with this EXACT schema:
{
  "entries": [
    {
      "skill": "Kubernetes",
      "resources": [
        {"title": "resource name", "kind": "course|docs|book|project", "url": null}
      ]
    }
  ]
}

Provide 2-4 resources per skill. Prefer free, reputable sources; use null for
urls you are not certain of rather than guessing.

Skill gaps: {missing_skills}
"#;
