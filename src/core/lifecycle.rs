//! Status state machine for transactions
//!
//! ```text
//! pending ──lock──▶ locked ──complete(+rating?)──▶ completed
//!    │                 │
//!    └──cancel──▶ cancelled ◀──cancel──┘
//! ```
//!
//! Terminal states accept no further transition. A rating may only ride on
//! the transition into `completed`.
//!
//! Committing a transition is split in two steps so the confirmation policy
//! lives in data rather than in a modal: [`plan`] validates a request and
//! returns a [`TransitionPreview`]; the caller shows the prompt and hands the
//! preview back to be committed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{NexusResult, TransactionError, ValidationError};
use crate::core::transaction::{Rating, StatusChange, Transaction, TransactionStatus};

/// Who is expected to trigger a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Host,
    Renter,
}

/// Whether `from → to` is an edge of the state machine
pub fn can_transition(from: TransactionStatus, to: TransactionStatus) -> bool {
    use TransactionStatus::*;

    matches!(
        (from, to),
        (Pending, Locked) | (Pending, Cancelled) | (Locked, Completed) | (Locked, Cancelled)
    )
}

/// The party that triggers the edge into `to`
pub fn actor_for(to: TransactionStatus) -> Actor {
    match to {
        TransactionStatus::Locked => Actor::Renter,
        _ => Actor::Host,
    }
}

/// Target statuses reachable from `from`
pub fn next_states(from: TransactionStatus) -> Vec<TransactionStatus> {
    TransactionStatus::ALL
        .into_iter()
        .filter(|to| can_transition(from, *to))
        .collect()
}

/// A requested status change, not yet validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: TransactionStatus,
    #[serde(default)]
    pub rating: Option<Rating>,
    /// Who is locking; only accepted on the transition into `locked`
    #[serde(default)]
    pub renter_id: Option<String>,
}

impl TransitionRequest {
    pub fn to(status: TransactionStatus) -> Self {
        Self {
            status,
            rating: None,
            renter_id: None,
        }
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_renter(mut self, renter_id: impl Into<String>) -> Self {
        self.renter_id = Some(renter_id.into());
        self
    }
}

/// A validated transition waiting for confirmation.
///
/// Serialisable so an HTTP client can echo it back to the confirm endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPreview {
    pub transaction_id: Uuid,
    pub from: TransactionStatus,
    pub to: TransactionStatus,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub renter_id: Option<String>,
    pub actor: Actor,
    /// Yes/no question to show before committing
    #[serde(default)]
    pub prompt: String,
}

impl TransitionPreview {
    pub fn change(&self) -> StatusChange {
        StatusChange {
            status: self.to,
            rating: self.rating,
            renter_id: self.renter_id.clone(),
        }
    }
}

/// Validate `request` against the current state of `tx`
pub fn plan(tx: &Transaction, request: TransitionRequest) -> NexusResult<TransitionPreview> {
    if request.rating.is_some() && request.status != TransactionStatus::Completed {
        return Err(TransactionError::RatingNotAllowed {
            target: request.status,
        }
        .into());
    }
    check_renter(request.status, request.renter_id.as_deref())?;

    if !can_transition(tx.status, request.status) {
        return Err(TransactionError::InvalidTransition {
            id: tx.id,
            from: tx.status,
            to: request.status,
        }
        .into());
    }

    Ok(TransitionPreview {
        transaction_id: tx.id,
        from: tx.status,
        to: request.status,
        rating: request.rating,
        actor: actor_for(request.status),
        prompt: prompt_for(tx, &request),
        renter_id: request.renter_id,
    })
}

/// A renter id may only ride on the lock
pub fn check_renter(to: TransactionStatus, renter_id: Option<&str>) -> NexusResult<()> {
    if renter_id.is_some() && to != TransactionStatus::Locked {
        return Err(ValidationError::FieldError {
            field: "renter_id".to_string(),
            message: format!("a renter can only be recorded when locking (target: '{}')", to),
        }
        .into());
    }
    Ok(())
}

fn prompt_for(tx: &Transaction, request: &TransitionRequest) -> String {
    let deposit = format_deposit(tx.deposit);
    match request.status {
        TransactionStatus::Locked => format!(
            "Agree to lock a deposit of {} for {}?",
            deposit, tx.car_name
        ),
        TransactionStatus::Completed => match request.rating {
            Some(rating) => format!(
                "Release the deposit of {} for {} and rate the renter '{}'?",
                deposit, tx.car_name, rating
            ),
            None => format!("Release the deposit of {} for {}?", deposit, tx.car_name),
        },
        TransactionStatus::Cancelled => format!(
            "Cancel the transaction for {} (deposit {})?",
            tx.car_name, deposit
        ),
        TransactionStatus::Pending => format!("Reopen the transaction for {}?", tx.car_name),
    }
}

/// Deposit as shown to users: integers without decimals, otherwise two places
pub fn format_deposit(deposit: f64) -> String {
    if deposit.fract() == 0.0 {
        format!("{:.0} USDC", deposit)
    } else {
        format!("{:.2} USDC", deposit)
    }
}
