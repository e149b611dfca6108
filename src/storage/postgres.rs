//! PostgreSQL storage backend using sqlx.
//!
//! Provides `PostgresTransactionStore` backed by a single
//! `nexus_transactions` table via `sqlx::PgPool`. The connection string is
//! expected to carry service-role credentials; this layer performs no
//! row-level access control.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! nexus-deposit = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! Ids are generated by the database (`gen_random_uuid()`), as are the
//! `created_at`/`updated_at` defaults. Status and rating are stored as their
//! canonical lowercase names.

use crate::core::error::{NexusError, NexusResult, StorageError, TransactionError};
use crate::core::store::{TransactionStore, rating_refusal};
use crate::core::transaction::{
    ListQuery, Rating, StatusChange, Transaction, TransactionDraft, TransactionStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const BACKEND: &str = "PostgreSQL";

const COLUMNS: &str = "id, host_client_id, host_name, car_name, deposit, start_date, end_date, \
                       status, rating, renter_id, created_at, updated_at";

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

/// Create the `nexus_transactions` table and its indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> NexusResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS nexus_transactions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            host_client_id TEXT NULL,
            host_name TEXT NULL,
            car_name TEXT NOT NULL,
            deposit DOUBLE PRECISION NOT NULL,
            start_date DATE NULL,
            end_date DATE NULL,
            status TEXT NOT NULL,
            rating TEXT NULL,
            renter_id TEXT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| query_error(format!("Failed to create nexus_transactions table: {}", e)))?;

    // Tables created before renter tracking lack the column
    sqlx::query("ALTER TABLE nexus_transactions ADD COLUMN IF NOT EXISTS renter_id TEXT NULL")
        .execute(pool)
        .await
        .map_err(|e| query_error(format!("Failed to add renter_id column: {}", e)))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_nexus_transactions_host_created \
         ON nexus_transactions (host_client_id, created_at DESC)",
    )
    .execute(pool)
    .await
    .map_err(|e| query_error(format!("Failed to create host index: {}", e)))?;

    Ok(())
}

fn query_error(message: String) -> NexusError {
    StorageError::QueryError {
        backend: BACKEND.to_string(),
        message,
    }
    .into()
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    host_client_id: Option<String>,
    host_name: Option<String>,
    car_name: String,
    deposit: f64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    status: String,
    rating: Option<String>,
    renter_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = NexusError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<TransactionStatus>().map_err(|message| {
            StorageError::IntegrityError {
                message: format!("row {}: {}", row.id, message),
            }
        })?;
        let rating = row
            .rating
            .as_deref()
            .map(str::parse::<Rating>)
            .transpose()
            .map_err(|message| StorageError::IntegrityError {
                message: format!("row {}: {}", row.id, message),
            })?;

        Ok(Transaction {
            id: row.id,
            host_client_id: row.host_client_id,
            host_name: row.host_name,
            car_name: row.car_name,
            deposit: row.deposit,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            rating,
            renter_id: row.renter_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// PostgresTransactionStore
// ---------------------------------------------------------------------------

/// Transaction store backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// use nexus::storage::PostgresTransactionStore;
///
/// let store = PostgresTransactionStore::connect("postgres://...", 5).await?;
/// let tx = store.insert(TransactionDraft::new("Prius", 200.0)).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresTransactionStore {
    pool: PgPool,
}

impl PostgresTransactionStore {
    /// Create a store over an existing pool. The schema must already exist.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool on `url` and make sure the schema exists
    pub async fn connect(url: &str, max_connections: u32) -> NexusResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                message: e.to_string(),
            })?;

        ensure_schema(&pool).await?;
        tracing::info!(max_connections, "connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TransactionStore for PostgresTransactionStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, draft: TransactionDraft) -> NexusResult<Transaction> {
        let sql = format!(
            "INSERT INTO nexus_transactions \
             (host_client_id, host_name, car_name, deposit, start_date, end_date, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            COLUMNS
        );
        let row: TransactionRow = sqlx::query_as(&sql)
            .bind(&draft.host_client_id)
            .bind(&draft.host_name)
            .bind(&draft.car_name)
            .bind(draft.deposit)
            .bind(draft.start_date)
            .bind(draft.end_date)
            .bind(draft.status.as_str())
            .fetch_one(&self.pool)
            .await?;

        let tx = Transaction::try_from(row)?;
        tracing::debug!(transaction_id = %tx.id, status = %tx.status, "row inserted");
        Ok(tx)
    }

    async fn get(&self, id: &Uuid) -> NexusResult<Option<Transaction>> {
        let sql = format!("SELECT {} FROM nexus_transactions WHERE id = $1", COLUMNS);
        let row: Option<TransactionRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn list(&self, query: &ListQuery) -> NexusResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM nexus_transactions \
             WHERE ($1::TEXT IS NULL OR host_client_id = $1) \
             ORDER BY created_at DESC \
             LIMIT $2",
            COLUMNS
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(&query.host_client_id)
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn update_status(
        &self,
        id: &Uuid,
        expected: TransactionStatus,
        change: StatusChange,
    ) -> NexusResult<Transaction> {
        let sql = format!(
            "UPDATE nexus_transactions \
             SET status = $1, rating = $2, renter_id = COALESCE($5, renter_id), \
                 updated_at = now() \
             WHERE id = $3 AND status = $4 \
             RETURNING {}",
            COLUMNS
        );
        let row: Option<TransactionRow> = sqlx::query_as(&sql)
            .bind(change.status.as_str())
            .bind(change.rating.map(|r| r.as_str()))
            .bind(id)
            .bind(expected.as_str())
            .bind(&change.renter_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let tx = Transaction::try_from(row)?;
                tracing::debug!(transaction_id = %tx.id, status = %tx.status, "row updated");
                Ok(tx)
            }
            // Nothing matched: either the id is unknown or the status moved on
            None => match self.get(id).await? {
                None => Err(TransactionError::NotFound { id: *id }.into()),
                Some(current) => Err(TransactionError::StaleTransition {
                    id: *id,
                    expected,
                    actual: current.status,
                }
                .into()),
            },
        }
    }

    async fn rate(&self, id: &Uuid, rating: Rating) -> NexusResult<Transaction> {
        let sql = format!(
            "UPDATE nexus_transactions \
             SET rating = $1, updated_at = now() \
             WHERE id = $2 AND status = $3 AND rating IS NULL \
             RETURNING {}",
            COLUMNS
        );
        let row: Option<TransactionRow> = sqlx::query_as(&sql)
            .bind(rating.as_str())
            .bind(id)
            .bind(TransactionStatus::Completed.as_str())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let tx = Transaction::try_from(row)?;
            tracing::debug!(transaction_id = %tx.id, rating = %rating, "row rated");
            return Ok(tx);
        }

        let current = self
            .get(id)
            .await?
            .ok_or(TransactionError::NotFound { id: *id })?;
        match rating_refusal(&current) {
            Some(refusal) => Err(refusal.into()),
            None => Err(TransactionError::AlreadyRated { id: *id }.into()),
        }
    }
}
