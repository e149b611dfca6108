//! The transaction record and its value types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a transaction.
///
/// Older clients used other spellings for the same states; they are accepted
/// on input and normalised to the canonical names on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Link issued, renter has not acted yet
    #[serde(alias = "pending_deposit", alias = "open")]
    Pending,
    /// Renter acknowledged the terms and locked the deposit
    #[serde(alias = "agreed")]
    Locked,
    /// Deposit released back to the renter
    #[serde(alias = "released")]
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 4] = [
        TransactionStatus::Pending,
        TransactionStatus::Locked,
        TransactionStatus::Completed,
        TransactionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Locked => "locked",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Cancelled
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "pending_deposit" | "open" => Ok(TransactionStatus::Pending),
            "locked" | "agreed" => Ok(TransactionStatus::Locked),
            "completed" | "released" => Ok(TransactionStatus::Completed),
            "cancelled" | "canceled" => Ok(TransactionStatus::Cancelled),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Host's rating of the renter, given when the deposit is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Good,
    Normal,
    Bad,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Good => "good",
            Rating::Normal => "normal",
            Rating::Bad => "bad",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(Rating::Good),
            "normal" => Ok(Rating::Normal),
            "bad" => Ok(Rating::Bad),
            other => Err(format!("unknown rating '{}'", other)),
        }
    }
}

/// A deposit agreement between a host and a renter.
///
/// This is a record only: nothing here moves or holds funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    #[serde(default)]
    pub host_client_id: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
    pub car_name: String,
    /// Unit-less amount, never checked against any ledger
    pub deposit: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub status: TransactionStatus,
    /// Only set on completed transactions
    #[serde(default)]
    pub rating: Option<Rating>,
    /// Renter who locked the deposit, when known
    #[serde(default)]
    pub renter_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Materialise a draft with a fresh id and timestamps.
    ///
    /// Used by stores that assign identifiers client-side.
    pub fn from_draft(draft: TransactionDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            host_client_id: draft.host_client_id,
            host_name: draft.host_name,
            car_name: draft.car_name,
            deposit: draft.deposit,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: draft.status,
            rating: None,
            renter_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a committed status change in place
    pub fn apply(&mut self, change: &StatusChange) {
        self.status = change.status;
        self.rating = change.rating;
        if let Some(renter_id) = &change.renter_id {
            self.renter_id = Some(renter_id.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// Validated fields for a new transaction, before the store assigns an id
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub host_client_id: Option<String>,
    pub host_name: Option<String>,
    pub car_name: String,
    pub deposit: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: TransactionStatus,
}

impl TransactionDraft {
    /// Draft with the default initial status (`locked`)
    pub fn new(car_name: impl Into<String>, deposit: f64) -> Self {
        Self {
            host_client_id: None,
            host_name: None,
            car_name: car_name.into(),
            deposit,
            start_date: None,
            end_date: None,
            status: TransactionStatus::Locked,
        }
    }

    pub fn with_host(mut self, client_id: Option<String>, name: Option<String>) -> Self {
        self.host_client_id = client_id;
        self.host_name = name;
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }
}

/// The fields a store writes when a status change is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: TransactionStatus,
    pub rating: Option<Rating>,
    /// Recorded on the lock; `None` leaves the stored value alone
    pub renter_id: Option<String>,
}

/// Listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only records created by this host
    pub host_client_id: Option<String>,
    pub limit: usize,
}

impl ListQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            host_client_id: None,
            limit,
        }
    }

    pub fn for_host(mut self, host_client_id: impl Into<String>) -> Self {
        self.host_client_id = Some(host_client_id.into());
        self
    }

    /// Whether a record falls inside this query's host scope
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.host_client_id
            .as_deref()
            .is_none_or(|host| tx.host_client_id.as_deref() == Some(host))
    }
}
