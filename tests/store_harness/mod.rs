//! Shared test harness for transaction store backends
//!
//! Provides draft builders and assertion helpers, plus two macros:
//! - `transaction_store_tests!` checks a `TransactionStore` against the
//!   storage contract directly
//! - `rest_api_tests!` drives the same store through the full HTTP router
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod store_harness;
//! use store_harness::*;
//!
//! transaction_store_tests!(InMemoryTransactionStore::new());
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod store_contract_tests;

#[macro_use]
pub mod rest_api_tests;

use chrono::NaiveDate;
use nexus::core::transaction::{Transaction, TransactionDraft, TransactionStatus};
use std::time::Duration;

/// A `locked` draft with only the required fields
pub fn draft(car: &str, deposit: f64) -> TransactionDraft {
    TransactionDraft::new(car, deposit)
}

/// A draft carrying every optional field
pub fn full_draft(host_client_id: &str, car: &str, deposit: f64) -> TransactionDraft {
    TransactionDraft::new(car, deposit)
        .with_host(Some(host_client_id.to_string()), Some("Host Taro".to_string()))
        .with_dates(
            NaiveDate::from_ymd_opt(2025, 11, 25),
            NaiveDate::from_ymd_opt(2025, 11, 26),
        )
}

pub fn pending_draft(car: &str, deposit: f64) -> TransactionDraft {
    TransactionDraft::new(car, deposit).with_status(TransactionStatus::Pending)
}

/// Gap between inserts so `created_at` strictly increases on every backend
pub async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

/// Assert that a list contains exactly `n` items.
pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}

/// Assert that records are sorted newest first
pub fn assert_newest_first(list: &[Transaction]) {
    for pair in list.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "Expected newest first, got {} before {}",
            pair[0].created_at,
            pair[1].created_at
        );
    }
}
