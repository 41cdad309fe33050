//! Onboarding documents: offer letters and employment contracts.
//!
//! Both are drafted from the candidate and job records, with per-request
//! overrides for compensation, start date and notes. Offer letters are also
//! kept on the candidate under `onboarding_docs.offer_letter`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifacts::{check_segment, write_artifact, ArtifactKind};
use crate::context::models::{CandidateRecord, JobRecord};
use crate::context::ContextStore;
use crate::errors::AppError;
use crate::llm_client::prompts::{fill, DEFAULT_ROLE};
use crate::llm_client::{Backend, CompletionRequest, TextGenerator};

pub mod handlers;
pub mod prompts;

use prompts::{CONTRACT_PROMPT, OFFER_LETTER_PROMPT};

const TBD: &str = "TBD";
const DEFAULT_CANDIDATE: &str = "Candidate";
const DEFAULT_ROLE_TITLE: &str = "Unknown Role";
const DEFAULT_CLAUSES: &str = "Standard IP, termination, arbitration clauses.";
const DEFAULT_POLICIES: &str = "All standard company HR policies apply.";
const DEFAULT_LEGAL_NOTES: &str = "Subject to U.S. labor law.";

/// Per-request values that take precedence over the job's own fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentOverrides {
    #[serde(default)]
    pub compensation: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDocument {
    pub candidate_id: String,
    pub job_id: String,
    pub file_name: String,
    pub text: String,
}

/// Override, else the job field, else `fallback`. Blank values count as absent.
fn resolve<'a>(override_value: Option<&'a str>, job_value: Option<&'a str>, fallback: &'a str) -> &'a str {
    override_value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| job_value.map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or(fallback)
}

async fn load_pair(
    store: &ContextStore,
    candidate_id: &str,
    job_id: &str,
) -> Result<(CandidateRecord, JobRecord), AppError> {
    check_segment("candidate id", candidate_id)?;
    check_segment("job id", job_id)?;
    let candidate = store.get_candidate(candidate_id).await?;
    let job = store.get_job(job_id).await?;
    match (candidate, job) {
        (Some(candidate), Some(job)) => Ok((candidate, job)),
        _ => Err(AppError::NotFound(
            "Missing candidate or job context.".to_string(),
        )),
    }
}

fn candidate_name(candidate: &CandidateRecord) -> &str {
    candidate
        .name
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_CANDIDATE)
}

pub async fn generate_offer_letter(
    store: &ContextStore,
    llm: &dyn TextGenerator,
    data_dir: &Path,
    candidate_id: &str,
    job_id: &str,
    overrides: &DocumentOverrides,
) -> Result<GeneratedDocument, AppError> {
    let (candidate, job) = load_pair(store, candidate_id, job_id).await?;
    let team_summary = store.get_team_summary().await?;

    let prompt = fill(
        OFFER_LETTER_PROMPT,
        &[
            ("name", candidate_name(&candidate)),
            ("title", job.title.as_deref().unwrap_or(DEFAULT_ROLE_TITLE)),
            (
                "compensation",
                resolve(overrides.compensation.as_deref(), job.compensation.as_deref(), TBD),
            ),
            (
                "start_date",
                resolve(overrides.start_date.as_deref(), job.start_date.as_deref(), TBD),
            ),
            ("job_description", job.job_description.as_deref().unwrap_or("")),
            ("team_summary", team_summary.as_str()),
            ("notes", resolve(overrides.notes.as_deref(), job.notes.as_deref(), "")),
        ],
    );
    let request = CompletionRequest::new(Backend::Llama, DEFAULT_ROLE, prompt)
        .temperature(0.5)
        .max_tokens(600);
    let text = llm.complete(&request).await?.trim().to_string();

    let file_name = format!("Offer_Letter_{candidate_id}.txt");
    write_artifact(data_dir, job_id, ArtifactKind::Offers, &file_name, text.as_bytes()).await?;
    store.save_candidate_offer(candidate_id, text.clone()).await?;

    info!("Offer letter drafted for {candidate_id} / job {job_id}");
    Ok(GeneratedDocument {
        candidate_id: candidate_id.to_string(),
        job_id: job_id.to_string(),
        file_name,
        text,
    })
}

pub async fn generate_contract(
    store: &ContextStore,
    llm: &dyn TextGenerator,
    data_dir: &Path,
    candidate_id: &str,
    job_id: &str,
    overrides: &DocumentOverrides,
) -> Result<GeneratedDocument, AppError> {
    let (candidate, job) = load_pair(store, candidate_id, job_id).await?;

    let prompt = fill(
        CONTRACT_PROMPT,
        &[
            ("name", candidate_name(&candidate)),
            ("title", job.title.as_deref().unwrap_or(DEFAULT_ROLE_TITLE)),
            (
                "compensation",
                resolve(overrides.compensation.as_deref(), job.compensation.as_deref(), TBD),
            ),
            (
                "start_date",
                resolve(overrides.start_date.as_deref(), job.start_date.as_deref(), TBD),
            ),
            ("clauses", resolve(None, job.clauses.as_deref(), DEFAULT_CLAUSES)),
            ("policies", resolve(None, job.policies.as_deref(), DEFAULT_POLICIES)),
            ("legal_notes", resolve(None, job.legal_notes.as_deref(), DEFAULT_LEGAL_NOTES)),
        ],
    );
    let request = CompletionRequest::new(Backend::Llama, DEFAULT_ROLE, prompt)
        .temperature(0.4)
        .max_tokens(1200);
    let text = llm.complete(&request).await?.trim().to_string();

    let file_name = format!("Contract_{candidate_id}.txt");
    write_artifact(data_dir, job_id, ArtifactKind::Contracts, &file_name, text.as_bytes()).await?;

    info!("Contract drafted for {candidate_id} / job {job_id}");
    Ok(GeneratedDocument {
        candidate_id: candidate_id.to_string(),
        job_id: job_id.to_string(),
        file_name,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::document::Collection;
    use crate::llm_client::testing::ScriptedGenerator;
    use serde_json::json;

    async fn setup(dir: &tempfile::TempDir) -> ContextStore {
        let store = ContextStore::open(dir.path().join("context.json")).await.unwrap();
        store
            .put_job(&JobRecord {
                job_id: "job1".to_string(),
                title: Some("Data Analyst".to_string()),
                compensation: Some("$95,000".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .put_candidate(&CandidateRecord {
                candidate_id: "c1".to_string(),
                job_id: Some("job1".to_string()),
                name: Some("Ada".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        store.set_team_summary("Small analytics team.").await.unwrap();
        store
    }

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(resolve(Some("$1"), Some("$2"), TBD), "$1");
        assert_eq!(resolve(Some("  "), Some("$2"), TBD), "$2");
        assert_eq!(resolve(None, None, TBD), "TBD");
    }

    #[tokio::test]
    async fn test_offer_letter_saved_on_candidate_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        let llm = ScriptedGenerator::new(["Dear Ada, welcome aboard."]);
        let overrides = DocumentOverrides {
            start_date: Some("2025-10-01".to_string()),
            ..Default::default()
        };

        let doc = generate_offer_letter(&store, &llm, dir.path(), "c1", "job1", &overrides)
            .await
            .unwrap();
        assert_eq!(doc.file_name, "Offer_Letter_c1.txt");

        let prompt = llm.requests()[0].prompt().to_string();
        assert!(prompt.contains("Compensation: $95,000"));
        assert!(prompt.contains("Start Date: 2025-10-01"));
        assert!(prompt.contains("Small analytics team."));

        assert_eq!(
            store.get_candidate_offer("c1").await.unwrap(),
            "Dear Ada, welcome aboard."
        );
        let stored = store.get_entity(Collection::Candidates, "c1").await.unwrap();
        assert_eq!(
            stored["onboarding_docs"],
            json!({"offer_letter": "Dear Ada, welcome aboard."})
        );
        assert_eq!(stored["Name"], json!("Ada"));

        let on_disk = tokio::fs::read_to_string(dir.path().join("job1/offers/Offer_Letter_c1.txt"))
            .await
            .unwrap();
        assert_eq!(on_disk, doc.text);
    }

    #[tokio::test]
    async fn test_contract_uses_default_clauses() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        let llm = ScriptedGenerator::new(["EMPLOYMENT AGREEMENT"]);

        let doc = generate_contract(&store, &llm, dir.path(), "c1", "job1", &DocumentOverrides::default())
            .await
            .unwrap();
        assert_eq!(doc.file_name, "Contract_c1.txt");

        let request = &llm.requests()[0];
        assert_eq!(request.max_tokens, 1200);
        assert!(request.prompt().contains(DEFAULT_CLAUSES));
        assert!(request.prompt().contains("Start Date: TBD"));
        assert!(dir.path().join("job1/contracts/Contract_c1.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_context_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup(&dir).await;
        let llm = ScriptedGenerator::default();
        let err = generate_offer_letter(&store, &llm, dir.path(), "ghost", "job1", &DocumentOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(llm.calls(), 0);
    }
}
