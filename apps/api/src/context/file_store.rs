//! Whole-document JSON persistence for the context file.
//!
//! Every mutation here is a full load → mutate → save cycle over the entire
//! file. Two callers mutating concurrently through this type can lose updates;
//! production writes go through [`crate::context::writer::ContextStore`], which
//! funnels them through a single task.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::document::{Collection, ContextDocument};
use crate::context::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the parent directory and an empty document if the file is absent.
    /// Never touches an existing file.
    pub async fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        if exists {
            return Ok(());
        }

        info!("Creating empty context document at {}", self.path.display());
        self.save(&ContextDocument::default()).await
    }

    /// Reads and parses the entire document.
    pub async fn load(&self) -> Result<ContextDocument> {
        let bytes = fs::read(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::CorruptState {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the whole document, pretty-printed.
    ///
    /// The bytes go to a sibling temp file first and are renamed into place, so a
    /// concurrent reader sees either the old or the new document, never a prefix.
    pub async fn save(&self, document: &ContextDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document).map_err(StoreError::Serialize)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("context.json");
        let tmp_path = self
            .path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

        fs::write(&tmp_path, &bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        if let Err(source) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(self.io_error(source));
        }

        debug!("Saved context document ({} bytes)", bytes.len());
        Ok(())
    }

    /// Initialize, load, apply `f`, save. The unit of every write below.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ContextDocument) -> T,
    {
        self.initialize().await?;
        let mut document = self.load().await?;
        let out = f(&mut document);
        self.save(&document).await?;
        Ok(out)
    }

    pub async fn get_entity(&self, collection: Collection, id: &str) -> Result<Value> {
        Ok(self.load().await?.entity(collection, id))
    }

    pub async fn get_all_entities(&self, collection: Collection) -> Result<Map<String, Value>> {
        let mut document = self.load().await?;
        Ok(std::mem::take(document.collection_mut(collection)))
    }

    /// Replaces (never merges) the stored value for `id`.
    pub async fn put_entity(&self, collection: Collection, id: &str, value: Value) -> Result<()> {
        self.mutate(|doc| {
            doc.collection_mut(collection).insert(id.to_string(), value);
        })
        .await
    }

    /// Applies `f` to the stored entity (an empty object when absent) and
    /// returns the value that was written.
    pub async fn update_entity<F>(&self, collection: Collection, id: &str, f: F) -> Result<Value>
    where
        F: FnOnce(&mut Value),
    {
        self.mutate(|doc| {
            let slot = doc
                .collection_mut(collection)
                .entry(id.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            f(slot);
            slot.clone()
        })
        .await
    }

    /// Like [`update_entity`](Self::update_entity) but fails with
    /// [`StoreError::Missing`] instead of creating the entity. Nothing is
    /// written when the entity is absent.
    pub async fn update_existing_entity<F>(
        &self,
        collection: Collection,
        id: &str,
        f: F,
    ) -> Result<Value>
    where
        F: FnOnce(&mut Value),
    {
        self.initialize().await?;
        let mut document = self.load().await?;
        let slot = document
            .collection_mut(collection)
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing {
                collection,
                id: id.to_string(),
            })?;
        f(slot);
        let written = slot.clone();
        self.save(&document).await?;
        Ok(written)
    }

    pub async fn set_team_summary(&self, text: &str) -> Result<()> {
        self.mutate(|doc| doc.team_summary = text.to_string()).await
    }

    pub async fn get_team_summary(&self) -> Result<String> {
        Ok(self.load().await?.team_summary)
    }

    pub async fn save_candidate_offer(&self, candidate_id: &str, offer_text: &str) -> Result<()> {
        self.mutate(|doc| doc.set_candidate_offer(candidate_id, offer_text))
            .await
    }

    pub async fn get_candidate_offer(&self, candidate_id: &str) -> Result<String> {
        Ok(self.load().await?.candidate_offer(candidate_id))
    }

    /// Resets every collection and the team summary. Destructive.
    pub async fn clear_all(&self) -> Result<()> {
        self.initialize().await?;
        self.save(&ContextDocument::default()).await
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("data").join("context.json"))
    }

    #[tokio::test]
    async fn test_initialize_creates_directory_and_empty_document() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            json!({"jobs": {}, "candidates": {}, "employees": {}, "team_summary": ""})
        );
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .put_entity(Collection::Jobs, "j1", json!({"title": "Data Scientist"}))
            .await
            .unwrap();
        store.set_team_summary("Small, senior team").await.unwrap();
        let before = std::fs::read(store.path()).unwrap();

        store.initialize().await.unwrap();
        store.initialize().await.unwrap();

        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_get_after_put_returns_exact_value() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let value = json!({
            "candidate_id": "c1",
            "Key Skills": ["Python", "SQL"],
            "avg_score": 7.0,
            "nested": {"a": [1, 2, {"b": null}]}
        });

        for collection in Collection::ALL {
            store
                .put_entity(collection, "c1", value.clone())
                .await
                .unwrap();
            assert_eq!(store.get_entity(collection, "c1").await.unwrap(), value);
        }
    }

    #[tokio::test]
    async fn test_put_replaces_rather_than_merges() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .put_entity(Collection::Candidates, "c1", json!({"Name": "Ada", "Note": "x"}))
            .await
            .unwrap();
        store
            .put_entity(Collection::Candidates, "c1", json!({"Name": "Ada"}))
            .await
            .unwrap();
        assert_eq!(
            store.get_entity(Collection::Candidates, "c1").await.unwrap(),
            json!({"Name": "Ada"})
        );
    }

    #[tokio::test]
    async fn test_missing_entity_is_empty_mapping() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().await.unwrap();
        assert_eq!(
            store.get_entity(Collection::Employees, "ghost").await.unwrap(),
            json!({})
        );
    }

    #[tokio::test]
    async fn test_get_all_entities_keyed_by_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .put_entity(Collection::Jobs, "a", json!({"title": "A"}))
            .await
            .unwrap();
        store
            .put_entity(Collection::Jobs, "b", json!({"title": "B"}))
            .await
            .unwrap();

        let jobs = store.get_all_entities(Collection::Jobs).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs["b"], json!({"title": "B"}));
        assert!(store
            .get_all_entities(Collection::Candidates)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_not_swallowed() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().await.unwrap();
        std::fs::write(store.path(), b"{\"jobs\": {\"j1\": ").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptState { .. }));
        let err = store
            .put_entity(Collection::Jobs, "j2", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CorruptState { .. }));
    }

    #[tokio::test]
    async fn test_load_save_load_is_fixed_point() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .put_entity(Collection::Jobs, "j1", json!({"title": "Analyst", "years_required": 3}))
            .await
            .unwrap();
        store
            .put_entity(
                Collection::Candidates,
                "c1",
                json!({"job_id": "j1", "avg_score": "N/A", "Tags": ["remote"]}),
            )
            .await
            .unwrap();
        store.set_team_summary("Analytics team").await.unwrap();

        let first = store.load().await.unwrap();
        let first_bytes = std::fs::read(store.path()).unwrap();
        store.save(&first).await.unwrap();
        let second = store.load().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(store.path()).unwrap(), first_bytes);
    }

    #[tokio::test]
    async fn test_update_existing_entity_refuses_absent_entry() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .put_entity(Collection::Candidates, "c1", json!({"job_id": "j1"}))
            .await
            .unwrap();

        let written = store
            .update_existing_entity(Collection::Candidates, "c1", |v| {
                v["Note"] = json!("ok");
            })
            .await
            .unwrap();
        assert_eq!(written, json!({"job_id": "j1", "Note": "ok"}));

        let err = store
            .update_existing_entity(Collection::Candidates, "ghost", |v| {
                v["Note"] = json!("late");
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
        let all = store.get_all_entities(Collection::Candidates).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_team_summary_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.initialize().await.unwrap();
        assert_eq!(store.get_team_summary().await.unwrap(), "");
        store.set_team_summary("Four engineers").await.unwrap();
        assert_eq!(store.get_team_summary().await.unwrap(), "Four engineers");
    }

    #[tokio::test]
    async fn test_clear_all_resets_everything() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .put_entity(Collection::Employees, "e1", json!({"role": "PM"}))
            .await
            .unwrap();
        store.set_team_summary("x").await.unwrap();

        store.clear_all().await.unwrap();

        assert_eq!(store.load().await.unwrap(), ContextDocument::default());
    }

    #[tokio::test]
    async fn test_update_entity_starts_from_empty_object() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let written = store
            .update_entity(Collection::Candidates, "c9", |v| {
                v["Note"] = json!("first call");
            })
            .await
            .unwrap();
        assert_eq!(written, json!({"Note": "first call"}));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .put_entity(Collection::Jobs, "j1", json!({}))
            .await
            .unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path().join("data"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["context.json".to_string()]);
    }
}
