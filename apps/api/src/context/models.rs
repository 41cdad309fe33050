//! Typed views over the JSON entities stored in the context document.
//!
//! Field names match the on-disk keys used since the first version of the
//! document (including the capitalized candidate keys). Anything not modelled
//! here is kept in `extra` so a decode/encode cycle never drops data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::evaluation::scoring::{coerce_score, AverageScore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub years_required: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clauses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_profiles: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobRecord {
    pub fn title_or_default(&self) -> &str {
        non_blank(&self.title).unwrap_or("Untitled")
    }

    /// Dropdown-style label: title plus the first eight characters of the id.
    pub fn label(&self) -> String {
        let short: String = self.job_id.chars().take(8).collect();
        format!("{} ({short})", self.title_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardingDocs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_letter: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(rename = "Resume File", default, skip_serializing_if = "Option::is_none")]
    pub resume_file: Option<String>,
    #[serde(rename = "Application ID", default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        rename = "Years of Experience",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub years_of_experience: Option<Value>,
    #[serde(
        rename = "Key Skills",
        default,
        deserialize_with = "lenient_skills",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub key_skills: Vec<String>,
    /// Raw score as returned by the extraction step (usually an integer).
    #[serde(rename = "Llama Score", default, skip_serializing_if = "Option::is_none")]
    pub llama_score: Option<Value>,
    #[serde(
        rename = "Gemini Score",
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub gemini_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_score: Option<AverageScore>,
    #[serde(rename = "Llama Summary", default, skip_serializing_if = "Option::is_none")]
    pub llama_summary: Option<String>,
    #[serde(rename = "Gemini Summary", default, skip_serializing_if = "Option::is_none")]
    pub gemini_summary: Option<String>,
    #[serde(rename = "Note", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        rename = "Tags",
        default,
        deserialize_with = "lenient_skills",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_docs: Option<OnboardingDocs>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CandidateRecord {
    /// True when this record is linked to `job_id`.
    pub fn is_linked_to(&self, job_id: &str) -> bool {
        self.job_id.as_deref() == Some(job_id)
    }

    /// Cached evaluation artifacts are valid only for the job they were produced for.
    pub fn has_evaluation_for(&self, job_id: &str) -> bool {
        self.is_linked_to(job_id) && self.llama_summary.is_some()
    }

    pub fn display_name(&self) -> &str {
        non_blank(&self.name).unwrap_or(&self.candidate_id)
    }

    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.display_name(),
            self.resume_file.as_deref().unwrap_or("N/A")
        )
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Splits comma-separated tag input, trimming and dropping empty pieces.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Accepts a JSON list, a comma-separated string, or null.
pub fn lenient_skills<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => split_tags(s.trim_matches(|c| c == '[' || c == ']'))
            .into_iter()
            .map(|t| t.trim_matches(|c| c == '\'' || c == '"').to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_score))
}

pub(crate) fn lenient_years<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(coerce_score)
        .and_then(|n| u32::try_from(n).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidate_uses_document_keys() {
        let record = CandidateRecord {
            candidate_id: "c1".to_string(),
            job_id: Some("j1".to_string()),
            resume_file: Some("c1.pdf".to_string()),
            name: Some("Ada".to_string()),
            key_skills: vec!["Python".to_string()],
            gemini_score: Some(6),
            avg_score: Some(AverageScore::Score(7.0)),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "candidate_id": "c1",
                "job_id": "j1",
                "Resume File": "c1.pdf",
                "Name": "Ada",
                "Key Skills": ["Python"],
                "Gemini Score": 6,
                "avg_score": 7.0
            })
        );
    }

    #[test]
    fn test_candidate_keeps_unknown_fields() {
        let raw = json!({
            "candidate_id": "c1",
            "source": "referral",
            "application_date": "2025-04-01",
            "onboarding_docs": {"offer_letter": "Hi", "nda": "signed"}
        });
        let record: CandidateRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(record.extra["source"], json!("referral"));
        assert_eq!(
            record.onboarding_docs.as_ref().unwrap().offer_letter.as_deref(),
            Some("Hi")
        );
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_skills_accept_stringified_list() {
        let record: CandidateRecord =
            serde_json::from_value(json!({"Key Skills": "['Python', 'SQL']"})).unwrap();
        assert_eq!(record.key_skills, vec!["Python", "SQL"]);
    }

    #[test]
    fn test_gemini_score_null_or_text_is_unavailable() {
        let record: CandidateRecord =
            serde_json::from_value(json!({"Gemini Score": null})).unwrap();
        assert_eq!(record.gemini_score, None);
        let record: CandidateRecord =
            serde_json::from_value(json!({"Gemini Score": "seven"})).unwrap();
        assert_eq!(record.gemini_score, None);
    }

    #[test]
    fn test_cache_key_is_candidate_and_job() {
        let record = CandidateRecord {
            candidate_id: "c1".to_string(),
            job_id: Some("j1".to_string()),
            llama_summary: Some("Solid".to_string()),
            ..Default::default()
        };
        assert!(record.has_evaluation_for("j1"));
        assert!(!record.has_evaluation_for("j2"));

        let unevaluated = CandidateRecord {
            llama_summary: None,
            ..record
        };
        assert!(!unevaluated.has_evaluation_for("j1"));
    }

    #[test]
    fn test_job_years_required_tolerates_text() {
        let job: JobRecord =
            serde_json::from_value(json!({"job_id": "j1", "years_required": "5+"})).unwrap();
        assert_eq!(job.years_required, None);
        let job: JobRecord =
            serde_json::from_value(json!({"job_id": "j1", "years_required": 3})).unwrap();
        assert_eq!(job.years_required, Some(3));
    }

    #[test]
    fn test_job_label_uses_short_id() {
        let job = JobRecord {
            job_id: "0123456789abcdef".to_string(),
            title: Some("ML Engineer".to_string()),
            ..Default::default()
        };
        assert_eq!(job.label(), "ML Engineer (01234567)");
        let untitled = JobRecord {
            job_id: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(untitled.label(), "Untitled (abc)");
    }

    #[test]
    fn test_split_tags_trims_and_drops_empty() {
        assert_eq!(split_tags(" remote, ,senior ,"), vec!["remote", "senior"]);
    }
}
