// Prompt templates for the candidate evaluation pipeline.
// Placeholders are filled with `llm_client::prompts::fill`.

pub const EXTRACTION_SYSTEM: &str = "You are a precise resume screening assistant. \
    You MUST respond with a single valid JSON object only. \
    Do NOT use markdown code fences. \
    Do NOT include explanations.";

pub const EXTRACTION_PROMPT: &str = r#"You are evaluating a candidate for the following job posting:

{job_description}

Here is the candidate's resume:

{resume_text}

Here are the profiles of the current team members:

{team_profiles}

Here is the team summary:

{team_summary}

Extract the following fields into a valid JSON object:
- Name
- Email
- Years of Experience
- Key Skills (as a list)
- Llama Score (judge the candidate's overall fit for the job on a scale of 1-10)

Return ONLY a single valid JSON object with exactly these keys:
{"Name": "...", "Email": "...", "Years of Experience": 0, "Key Skills": ["..."], "Llama Score": 0}
"#;

pub const REVIEW_SCORE_PROMPT: &str = r#"You are evaluating a candidate for the following posting:

{job_description}

Resume:
{resume_text}

Team Profiles:
{team_profiles}

Team Summary:
{team_summary}

Llama gave this candidate a score of {score}/10.
What is your score (1-10)? Only return the number."#;

pub const SUMMARY_PROMPT: &str = r#"Job Description:
{job_description}

Resume:
{resume_text}

Team Profiles:
{team_profiles}

Team Summary:
{team_summary}

The candidate received a score of {score}/10.
Write a detailed, honest summary of this candidate's qualifications and fit."#;

pub const COUNTER_REVIEW_PROMPT: &str = r#"You are reviewing this Llama summary for a candidate:

Job Description:
{job_description}

Resume:
{resume_text}

Llama Summary:
{llama_summary}

Team Profiles:
{team_profiles}

Team Summary:
{team_summary}

Llama scored this candidate {score}/10.
Write your own short evaluation and state if you agree or disagree with Llama's score."#;
