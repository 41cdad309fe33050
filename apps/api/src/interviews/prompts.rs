pub const INVITE_PROMPT: &str = r#"You are a recruiter inviting a candidate to schedule an interview.

Candidate Name: {name}
Candidate Email: {email}

Job Title: {title}
Specialization: {specialization}
Job Description:
{job_description}

Scheduling Link: {link}

Write a professional, warm, and concise email inviting the candidate to schedule an interview. Include the scheduling link. Return only the email body text. No formatting or extra explanation.
Sign under the company name, DO NOT USE MY NAME"#;

pub const REVISE_PROMPT: &str = r#"The following is an email invitation for a first round interview at a company:

{email}

User instruction: {instruction}

Please revise the email accordingly. Return only the revised email."#;
