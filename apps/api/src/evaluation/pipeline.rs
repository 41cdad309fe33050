//! Candidate evaluation: extraction → cross-review score → average → summary → counter-review.
//!
//! The five steps run strictly in order, each conditioned on the previous
//! outputs, and the results land on the candidate in a single store write.
//! A stored evaluation is reused only when it was produced for the same job.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::artifacts::check_segment;
use crate::context::models::{CandidateRecord, JobRecord};
use crate::context::ContextStore;
use crate::errors::AppError;
use crate::evaluation::extraction::{parse_extraction, ExtractedFields};
use crate::evaluation::prompts::{
    COUNTER_REVIEW_PROMPT, EXTRACTION_PROMPT, EXTRACTION_SYSTEM, REVIEW_SCORE_PROMPT,
    SUMMARY_PROMPT,
};
use crate::evaluation::resume::{extract_text, locate_resume};
use crate::evaluation::scoring::{
    average_scores, coerce_score, parse_review_score, AverageScore, UNAVAILABLE_SENTINEL,
};
use crate::llm_client::prompts::{fill, DEFAULT_ROLE};
use crate::llm_client::{Backend, CompletionRequest, TextGenerator};

pub const REVIEW_MODEL: &str = "gemini-2.0-flash-lite";
pub const NO_TEAM_PROFILE: &str = "No team profile available.";
const NO_JOB_DESCRIPTION: &str = "No job description available.";

/// Evaluated candidate plus whether the stored result was reused.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub candidate: CandidateRecord,
    pub from_cache: bool,
}

impl Evaluation {
    /// Summary written by the chosen reviewer.
    pub fn summary(&self, reviewer: Backend) -> Option<&str> {
        match reviewer {
            Backend::Llama => self.candidate.llama_summary.as_deref(),
            Backend::Gemini => self.candidate.gemini_summary.as_deref(),
        }
    }
}

/// Prompt inputs shared by every step.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub job_description: String,
    pub resume_text: String,
    pub team_profiles: String,
    pub team_summary: String,
}

impl PipelineInputs {
    fn placeholders(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("job_description", self.job_description.as_str()),
            ("resume_text", self.resume_text.as_str()),
            ("team_profiles", self.team_profiles.as_str()),
            ("team_summary", self.team_summary.as_str()),
        ]
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub extracted: ExtractedFields,
    pub gemini_score: Option<i64>,
    pub avg_score: AverageScore,
    pub llama_summary: String,
    pub gemini_summary: String,
}

impl PipelineOutcome {
    /// Writes the outcome onto `record`. Note and tags survive only when the
    /// candidate stays linked to the same job.
    pub fn apply_to(self, record: &mut CandidateRecord, job_id: &str, resume_file: Option<String>) {
        if !record.is_linked_to(job_id) {
            record.note = None;
            record.tags.clear();
        }
        record.job_id = Some(job_id.to_string());
        if resume_file.is_some() {
            record.resume_file = resume_file;
        }
        record.name = self.extracted.name;
        record.email = self.extracted.email;
        record.years_of_experience = self.extracted.years_of_experience;
        record.key_skills = self.extracted.key_skills;
        record.llama_score = self.extracted.llama_score;
        record.gemini_score = self.gemini_score;
        record.avg_score = Some(self.avg_score);
        record.llama_summary = Some(self.llama_summary);
        record.gemini_summary = Some(self.gemini_summary);
    }
}

/// Returns the evaluation of `candidate_id` against `job_id`, running the
/// pipeline only when no evaluation for that job is stored.
pub async fn evaluate_candidate(
    store: &ContextStore,
    llm: &dyn TextGenerator,
    data_dir: &Path,
    candidate_id: &str,
    job_id: &str,
) -> Result<Evaluation, AppError> {
    check_segment("candidate id", candidate_id)?;
    check_segment("job id", job_id)?;

    let candidate = store
        .get_candidate(candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;

    if candidate.has_evaluation_for(job_id) {
        debug!("Cached evaluation found for {candidate_id} / job {job_id}");
        return Ok(Evaluation {
            candidate,
            from_cache: true,
        });
    }

    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let resume_path = locate_resume(data_dir, &candidate, job_id).await?;
    let resume_file = resume_path
        .file_name()
        .and_then(|f| f.to_str())
        .map(String::from);

    let inputs = PipelineInputs {
        job_description: job
            .job_description
            .clone()
            .unwrap_or_else(|| NO_JOB_DESCRIPTION.to_string()),
        resume_text: extract_text(&resume_path).await?,
        team_profiles: team_profiles_for(store, &job).await?,
        team_summary: store.get_team_summary().await?,
    };

    info!("Evaluating candidate {candidate_id} for job {job_id}");
    let outcome = run_pipeline(llm, &inputs).await?;

    let linked_job = job_id.to_string();
    let candidate = store
        .update_candidate(candidate_id, move |record| {
            outcome.apply_to(record, &linked_job, resume_file)
        })
        .await?;

    info!(
        "Evaluation stored for {candidate_id}: avg score {:?}",
        candidate.avg_score
    );
    Ok(Evaluation {
        candidate,
        from_cache: false,
    })
}

/// Runs the four gateway calls in order. Any gateway or extraction failure
/// halts the run and nothing is persisted.
pub async fn run_pipeline(
    llm: &dyn TextGenerator,
    inputs: &PipelineInputs,
) -> Result<PipelineOutcome, AppError> {
    let base = inputs.placeholders();

    let extraction = CompletionRequest::new(
        Backend::Llama,
        EXTRACTION_SYSTEM,
        fill(EXTRACTION_PROMPT, &base),
    )
    .temperature(0.0)
    .max_tokens(700)
    .json();
    let raw = llm.complete(&extraction).await?;
    let extracted = parse_extraction(&raw)?;

    let llama_score = extracted.llama_score.as_ref().and_then(coerce_score);
    if llama_score.is_none() {
        warn!("Extraction returned no usable Llama Score: {:?}", extracted.llama_score);
    }
    let score_text = llama_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| UNAVAILABLE_SENTINEL.to_string());

    let mut scored = base.clone();
    scored.push(("score", score_text.as_str()));

    let review = CompletionRequest::new(
        Backend::Gemini,
        DEFAULT_ROLE,
        fill(REVIEW_SCORE_PROMPT, &scored),
    )
    .model(REVIEW_MODEL)
    .temperature(0.0)
    .max_tokens(10);
    let review_text = llm.complete(&review).await?;
    let gemini_score = parse_review_score(&review_text);
    if gemini_score.is_none() {
        warn!("Review score not numeric: {review_text:?}");
    }

    let avg_score = average_scores(llama_score, gemini_score);

    let summary = CompletionRequest::new(Backend::Llama, DEFAULT_ROLE, fill(SUMMARY_PROMPT, &scored))
        .temperature(0.7)
        .max_tokens(500);
    let llama_summary = llm.complete(&summary).await?;

    let mut reviewed = scored.clone();
    reviewed.push(("llama_summary", llama_summary.as_str()));
    let counter = CompletionRequest::new(
        Backend::Gemini,
        DEFAULT_ROLE,
        fill(COUNTER_REVIEW_PROMPT, &reviewed),
    )
    .temperature(0.7)
    .max_tokens(500);
    let gemini_summary = llm.complete(&counter).await?;

    Ok(PipelineOutcome {
        extracted,
        gemini_score,
        avg_score,
        llama_summary,
        gemini_summary,
    })
}

/// The job's own team profiles, else the employees collection, else a placeholder.
pub async fn team_profiles_for(store: &ContextStore, job: &JobRecord) -> Result<String, AppError> {
    if let Some(profiles) = job.team_profiles.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(profiles.to_string());
    }
    let employees = store
        .get_all_entities(crate::context::document::Collection::Employees)
        .await?;
    if employees.is_empty() {
        return Ok(NO_TEAM_PROFILE.to_string());
    }
    Ok(employees
        .iter()
        .map(|(id, profile)| format!("- {id}: {}", render_profile(profile)))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn render_profile(profile: &Value) -> String {
    match profile {
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}: {s}"),
                other => format!("{key}: {other}"),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{write_artifact, ArtifactKind};
    use crate::context::document::Collection;
    use crate::llm_client::testing::ScriptedGenerator;
    use crate::llm_client::LlmError;
    use serde_json::json;
    use tempfile::TempDir;

    const CANNED: &str = r#"{"Name":"Ada","Email":"a@x.com","Years of Experience":5,"Key Skills":["Python"],"Llama Score":8}"#;

    fn happy_path() -> ScriptedGenerator {
        ScriptedGenerator::new([CANNED, "6", "Strong analyst.", "Agree with 8."])
    }

    async fn setup(dir: &TempDir) -> ContextStore {
        let store = ContextStore::open(dir.path().join("context.json")).await.unwrap();
        for job_id in ["job1", "job2"] {
            store
                .put_job(&JobRecord {
                    job_id: job_id.to_string(),
                    title: Some("Analyst".to_string()),
                    job_description: Some("Analyze data.".to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        store
            .put_candidate(&CandidateRecord {
                candidate_id: "c1".to_string(),
                job_id: Some("job1".to_string()),
                resume_file: Some("c1.txt".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        write_artifact(dir.path(), "job1", ArtifactKind::Resumes, "c1.txt", b"Ada Lovelace resume")
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_end_to_end_with_stubbed_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        let llm = happy_path();

        let evaluation = evaluate_candidate(&store, &llm, dir.path(), "c1", "job1")
            .await
            .unwrap();

        assert!(!evaluation.from_cache);
        assert_eq!(llm.calls(), 4);
        let c = &evaluation.candidate;
        assert_eq!(c.name.as_deref(), Some("Ada"));
        assert_eq!(c.gemini_score, Some(6));
        assert_eq!(c.avg_score, Some(AverageScore::Score(7.0)));
        assert_eq!(evaluation.summary(Backend::Llama), Some("Strong analyst."));
        assert_eq!(evaluation.summary(Backend::Gemini), Some("Agree with 8."));

        let stored = store.get_entity(Collection::Candidates, "c1").await.unwrap();
        assert_eq!(stored["avg_score"], json!(7.0));
        assert_eq!(stored["Llama Score"], json!(8));
        assert_eq!(stored["job_id"], json!("job1"));
        assert_eq!(stored["Resume File"], json!("c1.txt"));
    }

    #[tokio::test]
    async fn test_steps_use_expected_backends_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        let llm = happy_path();
        evaluate_candidate(&store, &llm, dir.path(), "c1", "job1")
            .await
            .unwrap();

        let requests = llm.requests();
        let backends: Vec<_> = requests.iter().map(|r| r.backend).collect();
        assert_eq!(
            backends,
            [Backend::Llama, Backend::Gemini, Backend::Llama, Backend::Gemini]
        );
        assert!(requests[0].json_response);
        assert_eq!(requests[0].max_tokens, 700);
        assert_eq!(requests[1].model.as_deref(), Some(REVIEW_MODEL));
        assert_eq!(requests[1].max_tokens, 10);
        assert!(requests[1].prompt().contains("score of 8/10"));
        assert!(requests[0].prompt().contains("Ada Lovelace resume"));
        assert!(requests[3].prompt().contains("Strong analyst."));
        assert!(requests[0].prompt().contains(NO_TEAM_PROFILE));
    }

    #[tokio::test]
    async fn test_cached_evaluation_makes_no_gateway_calls() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        evaluate_candidate(&store, &happy_path(), dir.path(), "c1", "job1")
            .await
            .unwrap();

        let spy = ScriptedGenerator::default();
        let evaluation = evaluate_candidate(&store, &spy, dir.path(), "c1", "job1")
            .await
            .unwrap();
        assert!(evaluation.from_cache);
        assert_eq!(spy.calls(), 0);
        assert_eq!(evaluation.candidate.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_different_job_reruns_and_clears_note() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        evaluate_candidate(&store, &happy_path(), dir.path(), "c1", "job1")
            .await
            .unwrap();
        store
            .update_candidate("c1", |c| {
                c.note = Some("call back".to_string());
                c.tags = vec!["python".to_string()];
            })
            .await
            .unwrap();

        let llm = happy_path();
        let evaluation = evaluate_candidate(&store, &llm, dir.path(), "c1", "job2")
            .await
            .unwrap();
        assert!(!evaluation.from_cache);
        assert_eq!(llm.calls(), 4);
        assert_eq!(evaluation.candidate.job_id.as_deref(), Some("job2"));
        assert_eq!(evaluation.candidate.note, None);
        assert!(evaluation.candidate.tags.is_empty());
    }

    #[tokio::test]
    async fn test_missing_summary_reruns_and_keeps_note() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        store
            .update_candidate("c1", |c| c.note = Some("keep me".to_string()))
            .await
            .unwrap();

        let llm = happy_path();
        let evaluation = evaluate_candidate(&store, &llm, dir.path(), "c1", "job1")
            .await
            .unwrap();
        assert_eq!(llm.calls(), 4);
        assert_eq!(evaluation.candidate.note.as_deref(), Some("keep me"));
    }

    #[tokio::test]
    async fn test_extraction_failure_halts_and_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        let llm = ScriptedGenerator::new(["Sure! The candidate looks great."]);

        let err = evaluate_candidate(&store, &llm, dir.path(), "c1", "job1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction { .. }));
        assert_eq!(llm.calls(), 1);
        let stored = store.get_candidate("c1").await.unwrap().unwrap();
        assert!(stored.llama_summary.is_none());
    }

    #[tokio::test]
    async fn test_non_numeric_review_gives_sentinel_average() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        let llm = ScriptedGenerator::new([CANNED, "eight", "s", "g"]);

        let evaluation = evaluate_candidate(&store, &llm, dir.path(), "c1", "job1")
            .await
            .unwrap();
        assert_eq!(evaluation.candidate.gemini_score, None);
        assert_eq!(evaluation.candidate.avg_score, Some(AverageScore::Unavailable));
        let stored = store.get_entity(Collection::Candidates, "c1").await.unwrap();
        assert_eq!(stored["avg_score"], json!("N/A"));
    }

    #[tokio::test]
    async fn test_out_of_range_score_gives_sentinel_average() {
        let llm = ScriptedGenerator::new([
            r#"{"Name":"Ada","Llama Score":9223372036854775807}"#,
            "1",
            "s",
            "g",
        ]);
        let inputs = PipelineInputs {
            job_description: "Analyze data.".to_string(),
            resume_text: "Ada Lovelace resume".to_string(),
            team_profiles: NO_TEAM_PROFILE.to_string(),
            team_summary: String::new(),
        };

        let outcome = run_pipeline(&llm, &inputs).await.unwrap();
        assert_eq!(outcome.gemini_score, Some(1));
        assert_eq!(outcome.avg_score, AverageScore::Unavailable);
    }

    #[tokio::test]
    async fn test_backend_error_in_review_halts() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        let llm = ScriptedGenerator::with_results([
            Ok(CANNED.to_string()),
            Err(LlmError::MissingCredential(Backend::Gemini)),
        ]);
        let err = evaluate_candidate(&store, &llm, dir.path(), "c1", "job1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_team_profiles_fall_back_to_employees() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        store
            .put_entity(Collection::Employees, "e1", json!({"name": "Grace", "role": "Lead"}))
            .await
            .unwrap();
        let job = store.get_job("job1").await.unwrap().unwrap();
        let profiles = team_profiles_for(&store, &job).await.unwrap();
        assert_eq!(profiles, "- e1: name: Grace; role: Lead");
    }
}
