pub const INVITATION_SYSTEM: &str = "You are a professional HR assistant writing interview \
confirmation emails. Reply with the email body only: no subject line, no markdown.";

/// Placeholders: {candidate_name}, {job_title}, {summary}, {date}, {time},
/// {duration}, {location}.
pub const INVITATION_PROMPT_TEMPLATE: &str = r#"Write a short, warm and professional interview confirmation email.

Candidate: {candidate_name}
Position: {job_title}
Why we are interested: {summary}

Interview details:
Date: {date}
Time: {time}
Duration: {duration}
Location: {location}
Interviewer: HR Team

Include every detail above exactly as written and sign off as "HR Team"."#;
