pub const EXPLAIN_PROMPT: &str = r#"The Pearson correlation between '{col1}' and '{col2}' is {value}.

Explain this for a recruiter: include statistical meaning, hiring implications, and limitations."#;

pub const FOLLOW_UP_PROMPT: &str = r#"You are helping a recruiter analyze candidate data.

The last Pearson correlation was between '{col1}' and '{col2}' = {value}.
The user asked: "{question}"

Here is a preview of the first 10 rows of the dataset:
{sample}

Use both the correlation and sample data to respond helpfully."#;
