//! Single-writer front end for the context file.
//!
//! All mutations are sent as [`WriteCommand`]s to one task that owns the
//! [`JsonFileStore`] for writing, so load → mutate → save cycles never interleave
//! and every write is linearizable. Reads skip the queue: the file store renames
//! complete documents into place, so a direct read always sees a whole document.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::context::document::Collection;
use crate::context::error::{Result, StoreError};
use crate::context::file_store::JsonFileStore;
use crate::context::models::{CandidateRecord, JobRecord};

const WRITE_QUEUE_DEPTH: usize = 64;

type Reply<T> = oneshot::Sender<Result<T>>;
type EntityUpdate = Box<dyn FnOnce(&mut Value) + Send>;

/// Requests handled by the writer task.
pub enum WriteCommand {
    PutEntity {
        collection: Collection,
        id: String,
        value: Value,
        reply: Reply<()>,
    },
    UpdateEntity {
        collection: Collection,
        id: String,
        apply: EntityUpdate,
        reply: Reply<Value>,
    },
    UpdateExistingEntity {
        collection: Collection,
        id: String,
        apply: EntityUpdate,
        reply: Reply<Value>,
    },
    SetTeamSummary {
        text: String,
        reply: Reply<()>,
    },
    SaveCandidateOffer {
        candidate_id: String,
        offer_text: String,
        reply: Reply<()>,
    },
    ClearAll {
        reply: Reply<()>,
    },
}

/// Cloneable handle to the context document. One per process.
#[derive(Clone)]
pub struct ContextStore {
    files: Arc<JsonFileStore>,
    tx: mpsc::Sender<WriteCommand>,
}

impl ContextStore {
    /// Initializes the backing file and starts the writer task.
    /// Must be called from inside a tokio runtime.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let files = Arc::new(JsonFileStore::new(path));
        files.initialize().await?;

        let (tx, rx) = mpsc::channel(WRITE_QUEUE_DEPTH);
        let writer = StoreWriter {
            files: files.clone(),
            rx,
        };
        tokio::spawn(writer.run());

        info!("Context store ready at {}", files.path().display());
        Ok(Self { files, tx })
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub async fn get_entity(&self, collection: Collection, id: &str) -> Result<Value> {
        self.files.get_entity(collection, id).await
    }

    pub async fn get_all_entities(&self, collection: Collection) -> Result<Map<String, Value>> {
        self.files.get_all_entities(collection).await
    }

    pub async fn get_team_summary(&self) -> Result<String> {
        self.files.get_team_summary().await
    }

    pub async fn get_candidate_offer(&self, candidate_id: &str) -> Result<String> {
        self.files.get_candidate_offer(candidate_id).await
    }

    /// Typed read. `None` when the entity is absent (stored as an empty mapping).
    pub async fn get_record<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>> {
        let value = self.get_entity(collection, id).await?;
        decode_record(collection, id, value)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>> {
        self.get_record(Collection::Jobs, job_id).await
    }

    pub async fn get_candidate(&self, candidate_id: &str) -> Result<Option<CandidateRecord>> {
        self.get_record(Collection::Candidates, candidate_id).await
    }

    /// Every job, decoded. Entries that do not decode are skipped with a warning.
    pub async fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        self.list_records(Collection::Jobs).await
    }

    pub async fn list_candidates(&self) -> Result<Vec<CandidateRecord>> {
        self.list_records(Collection::Candidates).await
    }

    async fn list_records<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let all = self.get_all_entities(collection).await?;
        let mut records = Vec::with_capacity(all.len());
        for (id, value) in all {
            match decode_record::<T>(collection, &id, value) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("Skipping {collection} entry {id}: {e}"),
            }
        }
        Ok(records)
    }

    // ── Writes (serialized through the writer task) ─────────────────────

    pub async fn put_entity(
        &self,
        collection: Collection,
        id: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let id = id.into();
        self.request(|reply| WriteCommand::PutEntity {
            collection,
            id,
            value,
            reply,
        })
        .await
    }

    /// Read-modify-write of one entity inside the writer's critical section.
    /// Returns the stored value after `apply` ran.
    pub async fn update_entity<F>(
        &self,
        collection: Collection,
        id: impl Into<String>,
        apply: F,
    ) -> Result<Value>
    where
        F: FnOnce(&mut Value) + Send + 'static,
    {
        let id = id.into();
        self.request(|reply| WriteCommand::UpdateEntity {
            collection,
            id,
            apply: Box::new(apply),
            reply,
        })
        .await
    }

    /// Read-modify-write of an entity that must already exist. Fails with
    /// [`StoreError::Missing`] and writes nothing when it is absent.
    pub async fn update_existing_entity<F>(
        &self,
        collection: Collection,
        id: impl Into<String>,
        apply: F,
    ) -> Result<Value>
    where
        F: FnOnce(&mut Value) + Send + 'static,
    {
        let id = id.into();
        self.request(|reply| WriteCommand::UpdateExistingEntity {
            collection,
            id,
            apply: Box::new(apply),
            reply,
        })
        .await
    }

    pub async fn put_job(&self, job: &JobRecord) -> Result<()> {
        let value = serde_json::to_value(job).map_err(StoreError::Serialize)?;
        self.put_entity(Collection::Jobs, job.job_id.clone(), value)
            .await
    }

    pub async fn put_candidate(&self, candidate: &CandidateRecord) -> Result<()> {
        let value = serde_json::to_value(candidate).map_err(StoreError::Serialize)?;
        self.put_entity(Collection::Candidates, candidate.candidate_id.clone(), value)
            .await
    }

    /// Typed read-modify-write of an existing candidate. Fails with
    /// [`StoreError::Missing`] when the candidate is gone. If the stored value
    /// cannot be decoded it is left untouched and the decode error is returned.
    pub async fn update_candidate<F>(&self, candidate_id: &str, apply: F) -> Result<CandidateRecord>
    where
        F: FnOnce(&mut CandidateRecord) + Send + 'static,
    {
        let id = candidate_id.to_string();
        let error_slot = Arc::new(std::sync::Mutex::new(None));
        let slot = error_slot.clone();
        let key = id.clone();

        let written = self
            .update_existing_entity(Collection::Candidates, id.clone(), move |value| {
                match serde_json::from_value::<CandidateRecord>(value.clone()) {
                    Ok(mut record) => {
                        if record.candidate_id.is_empty() {
                            record.candidate_id = key;
                        }
                        apply(&mut record);
                        match serde_json::to_value(&record) {
                            Ok(updated) => *value = updated,
                            Err(e) => store_error(&slot, StoreError::Serialize(e)),
                        }
                    }
                    Err(source) => store_error(
                        &slot,
                        StoreError::Decode {
                            collection: Collection::Candidates,
                            id: key,
                            source,
                        },
                    ),
                }
            })
            .await?;

        let failure = error_slot.lock().ok().and_then(|mut guard| guard.take());
        if let Some(err) = failure {
            return Err(err);
        }
        serde_json::from_value(written).map_err(|source| StoreError::Decode {
            collection: Collection::Candidates,
            id,
            source,
        })
    }

    pub async fn set_team_summary(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.request(|reply| WriteCommand::SetTeamSummary { text, reply })
            .await
    }

    pub async fn save_candidate_offer(
        &self,
        candidate_id: impl Into<String>,
        offer_text: impl Into<String>,
    ) -> Result<()> {
        let candidate_id = candidate_id.into();
        let offer_text = offer_text.into();
        self.request(|reply| WriteCommand::SaveCandidateOffer {
            candidate_id,
            offer_text,
            reply,
        })
        .await
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.request(|reply| WriteCommand::ClearAll { reply }).await
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> WriteCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| StoreError::WriterClosed)?;
        rx.await.map_err(|_| StoreError::WriterClosed)?
    }
}

fn store_error(slot: &std::sync::Mutex<Option<StoreError>>, err: StoreError) {
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(err);
    }
}

fn decode_record<T: DeserializeOwned>(
    collection: Collection,
    id: &str,
    value: Value,
) -> Result<Option<T>> {
    if value.as_object().is_some_and(|fields| fields.is_empty()) {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            collection,
            id: id.to_string(),
            source,
        })
}

/// Owner of every write to the context file.
struct StoreWriter {
    files: Arc<JsonFileStore>,
    rx: mpsc::Receiver<WriteCommand>,
}

impl StoreWriter {
    /// Runs until every [`ContextStore`] handle is dropped.
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                WriteCommand::PutEntity {
                    collection,
                    id,
                    value,
                    reply,
                } => {
                    debug!("put {collection}/{id}");
                    let result = self.files.put_entity(collection, &id, value).await;
                    let _ = reply.send(result);
                }
                WriteCommand::UpdateEntity {
                    collection,
                    id,
                    apply,
                    reply,
                } => {
                    debug!("update {collection}/{id}");
                    let result = self.files.update_entity(collection, &id, apply).await;
                    let _ = reply.send(result);
                }
                WriteCommand::UpdateExistingEntity {
                    collection,
                    id,
                    apply,
                    reply,
                } => {
                    debug!("update existing {collection}/{id}");
                    let result = self
                        .files
                        .update_existing_entity(collection, &id, apply)
                        .await;
                    let _ = reply.send(result);
                }
                WriteCommand::SetTeamSummary { text, reply } => {
                    let result = self.files.set_team_summary(&text).await;
                    let _ = reply.send(result);
                }
                WriteCommand::SaveCandidateOffer {
                    candidate_id,
                    offer_text,
                    reply,
                } => {
                    let result = self
                        .files
                        .save_candidate_offer(&candidate_id, &offer_text)
                        .await;
                    let _ = reply.send(result);
                }
                WriteCommand::ClearAll { reply } => {
                    warn!("Clearing all context data");
                    let result = self.files.clear_all().await;
                    let _ = reply.send(result);
                }
            }
        }
        debug!("Context writer stopped");
    }
}
