//! Transaction service: the lifecycle rules on top of a store

use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{NexusResult, TransactionError, ValidationError};
use crate::core::lifecycle::{self, TransitionPreview, TransitionRequest};
use crate::core::store::TransactionStore;
use crate::core::transaction::{
    ListQuery, Transaction, TransactionDraft, TransactionStatus,
};
use crate::core::validation::PatchTransactionRequest;

/// Upper bound on records returned by one listing
pub const MAX_LIST_RESULTS: usize = 50;

/// Create, list and transition transactions over any [`TransactionStore`].
///
/// Every operation is a single store round trip (transitions add one read).
/// Nothing is retried and `create` carries no idempotency key: calling it
/// twice records two transactions.
#[derive(Clone)]
pub struct TransactionService {
    store: Arc<dyn TransactionStore>,
    max_results: usize,
}

impl TransactionService {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self {
            store,
            max_results: MAX_LIST_RESULTS,
        }
    }

    /// Cap listings at `max_results` (clamped to `1..=MAX_LIST_RESULTS`)
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.clamp(1, MAX_LIST_RESULTS);
        self
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub async fn create(&self, draft: TransactionDraft) -> NexusResult<Transaction> {
        if draft.car_name.trim().is_empty() {
            return Err(ValidationError::FieldError {
                field: "carName".to_string(),
                message: "'carName' must not be empty".to_string(),
            }
            .into());
        }
        if !draft.deposit.is_finite() || draft.deposit < 0.0 {
            return Err(ValidationError::FieldError {
                field: "deposit".to_string(),
                message: format!("'deposit' must be a number >= 0 (value: {})", draft.deposit),
            }
            .into());
        }
        if draft.status.is_terminal() {
            return Err(ValidationError::FieldError {
                field: "status".to_string(),
                message: format!("cannot create a transaction as '{}'", draft.status),
            }
            .into());
        }

        let tx = self.store.insert(draft).await?;
        tracing::info!(
            transaction_id = %tx.id,
            status = %tx.status,
            backend = self.store.backend(),
            "transaction created"
        );
        Ok(tx)
    }

    /// Newest records first, optionally scoped to one host.
    ///
    /// `limit` defaults to, and is capped at, the configured maximum.
    pub async fn list(
        &self,
        host_client_id: Option<&str>,
        limit: Option<usize>,
    ) -> NexusResult<Vec<Transaction>> {
        let limit = limit
            .unwrap_or(self.max_results)
            .clamp(1, self.max_results);
        let mut query = ListQuery::new(limit);
        if let Some(host) = host_client_id {
            query = query.for_host(host);
        }
        self.store.list(&query).await
    }

    pub async fn get_by_id(&self, id: &Uuid) -> NexusResult<Transaction> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| TransactionError::NotFound { id: *id }.into())
    }

    /// Validate a transition without writing anything
    pub async fn request_transition(
        &self,
        id: &Uuid,
        request: TransitionRequest,
    ) -> NexusResult<TransitionPreview> {
        let tx = self.get_by_id(id).await?;
        let preview = lifecycle::plan(&tx, request)?;
        tracing::debug!(
            transaction_id = %id,
            from = %preview.from,
            to = %preview.to,
            "transition requested"
        );
        Ok(preview)
    }

    /// Commit a previewed transition.
    ///
    /// The preview is re-validated against the state machine, and the store
    /// only writes if the record is still in `preview.from`.
    pub async fn confirm_transition(&self, preview: &TransitionPreview) -> NexusResult<Transaction> {
        if preview.rating.is_some() && preview.to != TransactionStatus::Completed {
            return Err(TransactionError::RatingNotAllowed { target: preview.to }.into());
        }
        lifecycle::check_renter(preview.to, preview.renter_id.as_deref())?;
        if !lifecycle::can_transition(preview.from, preview.to) {
            return Err(TransactionError::InvalidTransition {
                id: preview.transaction_id,
                from: preview.from,
                to: preview.to,
            }
            .into());
        }

        let tx = self
            .store
            .update_status(&preview.transaction_id, preview.from, preview.change())
            .await?;

        tracing::info!(
            transaction_id = %tx.id,
            from = %preview.from,
            to = %tx.status,
            rating = ?tx.rating,
            "transaction transitioned"
        );
        Ok(tx)
    }

    /// Request and confirm in one step
    pub async fn transition(
        &self,
        id: &Uuid,
        request: TransitionRequest,
    ) -> NexusResult<Transaction> {
        let preview = self.request_transition(id, request).await?;
        self.confirm_transition(&preview).await
    }

    /// Apply a `PATCH` body.
    ///
    /// With a status this is a plain [`transition`](Self::transition). A
    /// rating alone is only accepted on a completed transaction that has not
    /// been rated yet; the store checks and writes it in one step.
    pub async fn patch(&self, id: &Uuid, patch: PatchTransactionRequest) -> NexusResult<Transaction> {
        if let Some(status) = patch.status {
            let request = TransitionRequest {
                status,
                rating: patch.rating,
                renter_id: patch.renter_id,
            };
            return self.transition(id, request).await;
        }

        let Some(rating) = patch.rating else {
            return Err(ValidationError::EmptyPatch.into());
        };
        lifecycle::check_renter(TransactionStatus::Completed, patch.renter_id.as_deref())?;

        let tx = self.store.rate(id, rating).await?;
        tracing::info!(transaction_id = %tx.id, rating = %rating, "late rating recorded");
        Ok(tx)
    }
}
