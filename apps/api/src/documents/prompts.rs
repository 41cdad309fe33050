pub const OFFER_LETTER_PROMPT: &str = r#"Candidate Name: {name}
Job Title: {title}
Compensation: {compensation}
Start Date: {start_date}

Job Description:
{job_description}

Team Summary:
{team_summary}

Hiring Manager Notes:
{notes}

Write a professional, clear, and positive offer letter for this candidate. Include a summary of the role, compensation details, start date, and a warm welcome. Avoid excessive legal language but maintain formality."#;

pub const CONTRACT_PROMPT: &str = r#"Candidate Name: {name}
Job Title: {title}
Compensation: {compensation}
Start Date: {start_date}

Clauses:
{clauses}

Company Policies:
{policies}

Legal Notes:
{legal_notes}

Draft a complete employment contract using the information above. Structure it with proper headings, include all clauses, and align with common HR compliance standards. Use formal legal language where appropriate."#;
