//! # Nexus deposit recording
//!
//! Records deposit agreements between car hosts and renters. A host creates a
//! transaction (car, dates, deposit) and shares a link; the renter opens the
//! link, reviews the terms and records a "lock". This is a recording layer
//! only: nothing here moves or holds funds.
//!
//! ## Features
//!
//! - **Status state machine**: `pending → locked → completed`, with
//!   cancellation from either open state and an optional rating on release
//! - **Two-step transitions**: validate into a preview, then confirm it
//! - **Pluggable stores**: in-memory, JSON file, PostgreSQL (`postgres`
//!   feature), all behind [`TransactionStore`](core::TransactionStore)
//! - **Share links**: the record's terms encoded as `/tx?...` query parameters
//! - **YAML configuration** with `NEXUS_*` environment overrides
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nexus::prelude::*;
//!
//! let service = TransactionService::new(Arc::new(InMemoryTransactionStore::new()));
//!
//! let tx = service
//!     .create(TransactionDraft::new("Prius", 200.0).with_status(TransactionStatus::Pending))
//!     .await?;
//!
//! let preview = service
//!     .request_transition(&tx.id, TransitionRequest::to(TransactionStatus::Locked))
//!     .await?;
//! println!("{}", preview.prompt);
//! let locked = service.confirm_transition(&preview).await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{NexusError, NexusResult},
        identity::{Role, User, current_user},
        lifecycle::{Actor, TransitionPreview, TransitionRequest},
        runtime::{RuntimeDetector, RuntimeEnvironment},
        service::TransactionService,
        share_link::{RenterView, ShareLink},
        store::TransactionStore,
        transaction::{ListQuery, Rating, Transaction, TransactionDraft, TransactionStatus},
    };

    // === Storage ===
    pub use crate::storage::{FileTransactionStore, InMemoryTransactionStore};
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresTransactionStore;

    // === Config ===
    pub use crate::config::{NexusConfig, StorageBackend};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, NaiveDate, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
