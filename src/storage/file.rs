//! JSON-file storage backend for single-device use.
//!
//! The whole file is one JSON object; records live as an array under a fixed
//! storage key:
//!
//! ```json
//! { "nexus_transactions": [ { "id": "...", "car_name": "Prius", ... } ] }
//! ```
//!
//! The file is read once on [`FileTransactionStore::open`] and rewritten in
//! full after every mutation. Other top-level keys are preserved. Writes go
//! to a sibling temp file first and are renamed into place.

use crate::core::error::{NexusError, NexusResult, StorageError, TransactionError};
use crate::core::store::{TransactionStore, newest_first, rating_refusal};
use crate::core::transaction::{
    ListQuery, Rating, StatusChange, Transaction, TransactionDraft, TransactionStatus,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Default top-level key holding the record list
pub const STORAGE_KEY: &str = "nexus_transactions";

const BACKEND: &str = "file";

struct FileState {
    /// Top-level document minus the record list
    document: Map<String, Value>,
    records: Vec<Transaction>,
}

/// Transaction store persisted to a local JSON file
#[derive(Clone)]
pub struct FileTransactionStore {
    path: PathBuf,
    storage_key: String,
    state: Arc<Mutex<FileState>>,
}

impl FileTransactionStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is treated as empty; a file that is not a JSON object,
    /// or whose record list does not parse, is an integrity error.
    pub async fn open(path: impl AsRef<Path>, storage_key: impl Into<String>) -> NexusResult<Self> {
        let path = path.as_ref().to_path_buf();
        let storage_key = storage_key.into();

        let (document, records) = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => (Map::new(), Vec::new()),
            Ok(content) => parse_document(&content, &storage_key)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Map::new(), Vec::new()),
            Err(e) => return Err(io_error(&path, e)),
        };

        tracing::debug!(
            path = %path.display(),
            storage_key = %storage_key,
            records = records.len(),
            "file store opened"
        );

        Ok(Self {
            path,
            storage_key,
            state: Arc::new(Mutex::new(FileState { document, records })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    async fn persist(&self, state: &FileState) -> NexusResult<()> {
        let mut document = state.document.clone();
        document.insert(
            self.storage_key.clone(),
            serde_json::to_value(&state.records).map_err(|e| integrity_error(e.to_string()))?,
        );
        let content = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| integrity_error(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&self.path, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }
}

fn parse_document(
    content: &str,
    storage_key: &str,
) -> NexusResult<(Map<String, Value>, Vec<Transaction>)> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| integrity_error(format!("store file is not valid JSON: {}", e)))?;
    let Value::Object(mut document) = value else {
        return Err(integrity_error("store file must contain a JSON object".to_string()));
    };

    let records = match document.remove(storage_key) {
        None | Some(Value::Null) => Vec::new(),
        Some(list) => serde_json::from_value(list).map_err(|e| {
            integrity_error(format!("records under '{}' are invalid: {}", storage_key, e))
        })?,
    };
    Ok((document, records))
}

fn io_error(path: &Path, e: std::io::Error) -> NexusError {
    StorageError::IoError {
        backend: BACKEND.to_string(),
        message: format!("{}: {}", path.display(), e),
    }
    .into()
}

fn integrity_error(message: String) -> NexusError {
    StorageError::IntegrityError { message }.into()
}

#[async_trait]
impl TransactionStore for FileTransactionStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, draft: TransactionDraft) -> NexusResult<Transaction> {
        let tx = Transaction::from_draft(draft);
        let mut state = self.state.lock().await;
        state.records.push(tx.clone());

        if let Err(e) = self.persist(&state).await {
            state.records.pop();
            return Err(e);
        }
        tracing::debug!(transaction_id = %tx.id, status = %tx.status, "record written to file");
        Ok(tx)
    }

    async fn get(&self, id: &Uuid) -> NexusResult<Option<Transaction>> {
        let state = self.state.lock().await;
        Ok(state.records.iter().find(|tx| &tx.id == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> NexusResult<Vec<Transaction>> {
        let state = self.state.lock().await;
        Ok(newest_first(state.records.clone(), query))
    }

    async fn update_status(
        &self,
        id: &Uuid,
        expected: TransactionStatus,
        change: StatusChange,
    ) -> NexusResult<Transaction> {
        let mut state = self.state.lock().await;

        let index = state
            .records
            .iter()
            .position(|tx| &tx.id == id)
            .ok_or(TransactionError::NotFound { id: *id })?;

        let previous = state.records[index].clone();
        if previous.status != expected {
            return Err(TransactionError::StaleTransition {
                id: *id,
                expected,
                actual: previous.status,
            }
            .into());
        }

        state.records[index].apply(&change);
        if let Err(e) = self.persist(&state).await {
            state.records[index] = previous;
            return Err(e);
        }

        let tx = state.records[index].clone();
        tracing::debug!(transaction_id = %tx.id, status = %tx.status, "record updated in file");
        Ok(tx)
    }

    async fn rate(&self, id: &Uuid, rating: Rating) -> NexusResult<Transaction> {
        let mut state = self.state.lock().await;

        let index = state
            .records
            .iter()
            .position(|tx| &tx.id == id)
            .ok_or(TransactionError::NotFound { id: *id })?;

        let previous = state.records[index].clone();
        if let Some(refusal) = rating_refusal(&previous) {
            return Err(refusal.into());
        }

        state.records[index].rating = Some(rating);
        state.records[index].updated_at = chrono::Utc::now();
        if let Err(e) = self.persist(&state).await {
            state.records[index] = previous;
            return Err(e);
        }

        let tx = state.records[index].clone();
        tracing::debug!(transaction_id = %tx.id, rating = %rating, "rating written to file");
        Ok(tx)
    }
}
