//! Storage contract for transaction records

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::{NexusResult, TransactionError};
use crate::core::transaction::{
    ListQuery, Rating, StatusChange, Transaction, TransactionDraft, TransactionStatus,
};

/// Persistence for transaction records.
///
/// Implementations are storage-agnostic from the caller's point of view; the
/// lifecycle rules live in [`TransactionService`](crate::core::TransactionService),
/// not here. Records are never deleted.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Short backend name used in logs and errors
    fn backend(&self) -> &'static str;

    /// Persist a new record, assigning its id and creation timestamp
    async fn insert(&self, draft: TransactionDraft) -> NexusResult<Transaction>;

    /// Get a record by id
    async fn get(&self, id: &Uuid) -> NexusResult<Option<Transaction>>;

    /// Records matching `query`, newest first, at most `query.limit`
    async fn list(&self, query: &ListQuery) -> NexusResult<Vec<Transaction>>;

    /// Write a status change if the stored status is still `expected`.
    ///
    /// Fails with `TransactionError::NotFound` for an unknown id and with
    /// `TransactionError::StaleTransition` when the stored status differs.
    async fn update_status(
        &self,
        id: &Uuid,
        expected: TransactionStatus,
        change: StatusChange,
    ) -> NexusResult<Transaction>;

    /// Attach `rating` to a completed record that has none yet.
    ///
    /// The check and the write are one step: of two racing calls only one
    /// succeeds, the other gets `TransactionError::AlreadyRated`. A record
    /// that is not completed fails with `TransactionError::RatingNotAllowed`.
    async fn rate(&self, id: &Uuid, rating: Rating) -> NexusResult<Transaction>;
}

/// Why `tx` cannot take a late rating, if it cannot
pub(crate) fn rating_refusal(tx: &Transaction) -> Option<TransactionError> {
    if tx.status != TransactionStatus::Completed {
        Some(TransactionError::RatingNotAllowed { target: tx.status })
    } else if tx.rating.is_some() {
        Some(TransactionError::AlreadyRated { id: tx.id })
    } else {
        None
    }
}

/// Sort newest first and truncate to the query limit.
///
/// `records` must be in insertion order; ties on `created_at` keep the most
/// recently inserted record first.
pub(crate) fn newest_first(records: Vec<Transaction>, query: &ListQuery) -> Vec<Transaction> {
    let mut out: Vec<Transaction> = records
        .into_iter()
        .rev()
        .filter(|tx| query.matches(tx))
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out.truncate(query.limit);
    out
}
