// Prompts for resume analysis.

pub const ANALYSIS_SYSTEM: &str = "You are an expert HR analyst specializing in resume \
    screening and candidate evaluation. You MUST respond with a single valid JSON object \
    and nothing else.";

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"
Analyze the following resume against the job description and assess the candidate's fit.

JOB DESCRIPTION:
{job_text}

CANDIDATE CONTACT:
Name: {contact_name}
Email: {contact_email}
Phone: {contact_phone}

RESUME EXCERPT:
{resume_excerpt}

Return your analysis as JSON with exactly this shape:
{
  "score": <number between 0 and 100>,
  "summary": "<two sentences on strengths and fit>",
  "skills_match": ["<skills from the resume that the job asks for>"],
  "experience_years": <integer estimate of professional experience>
}
"#;
