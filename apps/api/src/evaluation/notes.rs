//! Recruiter notes and tags on an evaluated candidate.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::context::document::Collection;
use crate::context::models::split_tags;
use crate::context::ContextStore;
use crate::errors::AppError;

const NOTE_KEY: &str = "Note";
const TAGS_KEY: &str = "Tags";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateNotes {
    pub note: String,
    pub tags: Vec<String>,
}

/// Note and tags as seen from `job_id`. Empty when the candidate is linked elsewhere.
pub async fn get_notes(
    store: &ContextStore,
    candidate_id: &str,
    job_id: &str,
) -> Result<CandidateNotes, AppError> {
    let candidate = store
        .get_candidate(candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    if !candidate.is_linked_to(job_id) {
        return Ok(CandidateNotes::default());
    }
    Ok(CandidateNotes {
        note: candidate.note.unwrap_or_default(),
        tags: candidate.tags,
    })
}

/// Saves a note and comma-separated tags. Refused unless the candidate is linked to `job_id`.
pub async fn save_notes(
    store: &ContextStore,
    candidate_id: &str,
    job_id: &str,
    note: &str,
    tags_raw: &str,
) -> Result<CandidateNotes, AppError> {
    let candidate = store
        .get_candidate(candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    if !candidate.is_linked_to(job_id) {
        return Err(not_linked());
    }

    let note = note.trim().to_string();
    let tags = split_tags(tags_raw);
    let expected_job = job_id.to_string();
    let (new_note, new_tags) = (note.clone(), tags.clone());

    // Only Note and Tags change; every other stored field is left as written.
    // Link re-checked inside the write.
    let updated = store
        .update_existing_entity(Collection::Candidates, candidate_id, move |value| {
            if let Value::Object(fields) = value {
                if linked_job(fields) == Some(expected_job.as_str()) {
                    fields.insert(NOTE_KEY.to_string(), Value::String(new_note));
                    fields.insert(
                        TAGS_KEY.to_string(),
                        Value::Array(new_tags.into_iter().map(Value::String).collect()),
                    );
                }
            }
        })
        .await?;
    if updated.as_object().and_then(linked_job) != Some(job_id) {
        return Err(not_linked());
    }

    info!("Saved note and {} tags for {candidate_id}", tags.len());
    Ok(CandidateNotes { note, tags })
}

fn linked_job(fields: &Map<String, Value>) -> Option<&str> {
    fields.get("job_id").and_then(Value::as_str)
}

fn not_linked() -> AppError {
    AppError::Validation(
        "Cannot save notes: no profile generated for this candidate/job combination.".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::models::CandidateRecord;
    use serde_json::json;

    async fn store_with_candidate(dir: &tempfile::TempDir) -> ContextStore {
        let store = ContextStore::open(dir.path().join("context.json")).await.unwrap();
        store
            .put_candidate(&CandidateRecord {
                candidate_id: "c1".to_string(),
                job_id: Some("job1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_candidate(&dir).await;

        let saved = save_notes(&store, "c1", "job1", "  strong SQL  ", "sql, , python ,")
            .await
            .unwrap();
        assert_eq!(saved.note, "strong SQL");
        assert_eq!(saved.tags, vec!["sql", "python"]);
        assert_eq!(get_notes(&store, "c1", "job1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_refused_for_other_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_candidate(&dir).await;

        let err = save_notes(&store, "c1", "job2", "n", "t").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let stored = store.get_candidate("c1").await.unwrap().unwrap();
        assert_eq!(stored.note, None);
        assert_eq!(get_notes(&store, "c1", "job2").await.unwrap(), CandidateNotes::default());
    }

    #[tokio::test]
    async fn test_save_leaves_other_fields_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::open(dir.path().join("context.json")).await.unwrap();
        let before = json!({
            "candidate_id": "c1",
            "job_id": "job1",
            "Gemini Score": null,
            "Key Skills": "Python, SQL",
            "Years of Experience": "5+",
            "Tags": [],
            "source": "referral"
        });
        store
            .put_entity(Collection::Candidates, "c1", before.clone())
            .await
            .unwrap();

        save_notes(&store, "c1", "job1", "call back", "sql").await.unwrap();

        let mut after = store.get_entity(Collection::Candidates, "c1").await.unwrap();
        assert_eq!(after["Note"], json!("call back"));
        assert_eq!(after["Tags"], json!(["sql"]));
        let fields = after.as_object_mut().unwrap();
        fields.remove("Note");
        fields.insert("Tags".to_string(), json!([]));
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_unknown_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_candidate(&dir).await;
        assert!(matches!(
            save_notes(&store, "nope", "job1", "n", "").await,
            Err(AppError::NotFound(_))
        ));
    }
}
