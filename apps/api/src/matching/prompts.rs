// LLM prompt constants for job-posting parsing.

/// System prompt enforcing JSON-only output.
pub const JOB_PARSE_SYSTEM: &str =
    "You are an expert job posting analyst. \
    Parse a job posting and extract structured information. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Job parsing prompt template. Replace `{job_text}` before sending.
pub const JOB_PARSE_PROMPT_TEMPLATE: &str = r#"Parse the following job posting and extract structured information.

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "Senior Backend Engineer",
  "company": "Acme Corp",
  "skills": [
    {"name": "Rust", "tier": "required"},
    {"name": "Kubernetes", "tier": "preferred"},
    {"name": "GraphQL", "tier": "nice_to_have"}
  ],
  "keywords": ["distributed systems", "gRPC", "PostgreSQL"],
  "required_years": 5.0
}

Rules for parsing:

SKILL TIERS (pick exactly one per skill):
- "required": explicit must-haves: "required", "must have", "you will need", minimum years with a technology
- "preferred": stated preferences: "preferred", "strong plus", "ideally"
- "nice_to_have": optional extras: "bonus", "nice to have", "a plus"

KEYWORDS: domain terms an ATS would scan for that are not skills themselves
(product areas, protocols, methodologies). Deduplicate. Lowercase unless the
term is a proper noun.

REQUIRED_YEARS: the overall minimum years of experience if stated, else null.
COMPANY: use "Unknown" if the posting does not name the company.

Job posting:
{job_text}
"#;
