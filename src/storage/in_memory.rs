//! In-memory implementation of TransactionStore for testing and development

use crate::core::error::{NexusError, NexusResult, TransactionError};
use crate::core::store::{TransactionStore, newest_first, rating_refusal};
use crate::core::transaction::{
    ListQuery, Rating, StatusChange, Transaction, TransactionDraft, TransactionStatus,
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory transaction store
///
/// Records are kept in insertion order. Uses RwLock for thread-safe access;
/// nothing survives a restart.
#[derive(Clone)]
pub struct InMemoryTransactionStore {
    records: Arc<RwLock<Vec<Transaction>>>,
}

impl InMemoryTransactionStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(e: impl std::fmt::Display) -> NexusError {
    NexusError::Internal(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    fn backend(&self) -> &'static str {
        "in_memory"
    }

    async fn insert(&self, draft: TransactionDraft) -> NexusResult<Transaction> {
        let tx = Transaction::from_draft(draft);
        let mut records = self.records.write().map_err(lock_error)?;
        records.push(tx.clone());
        Ok(tx)
    }

    async fn get(&self, id: &Uuid) -> NexusResult<Option<Transaction>> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(records.iter().find(|tx| &tx.id == id).cloned())
    }

    async fn list(&self, query: &ListQuery) -> NexusResult<Vec<Transaction>> {
        let records = self.records.read().map_err(lock_error)?;
        Ok(newest_first(records.clone(), query))
    }

    async fn update_status(
        &self,
        id: &Uuid,
        expected: TransactionStatus,
        change: StatusChange,
    ) -> NexusResult<Transaction> {
        let mut records = self.records.write().map_err(lock_error)?;

        let tx = records
            .iter_mut()
            .find(|tx| &tx.id == id)
            .ok_or(TransactionError::NotFound { id: *id })?;

        if tx.status != expected {
            return Err(TransactionError::StaleTransition {
                id: *id,
                expected,
                actual: tx.status,
            }
            .into());
        }

        tx.apply(&change);
        Ok(tx.clone())
    }

    async fn rate(&self, id: &Uuid, rating: Rating) -> NexusResult<Transaction> {
        let mut records = self.records.write().map_err(lock_error)?;

        let tx = records
            .iter_mut()
            .find(|tx| &tx.id == id)
            .ok_or(TransactionError::NotFound { id: *id })?;

        if let Some(refusal) = rating_refusal(tx) {
            return Err(refusal.into());
        }

        tx.rating = Some(rating);
        tx.updated_at = chrono::Utc::now();
        Ok(tx.clone())
    }
}
