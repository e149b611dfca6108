//! Core module containing the transaction model, lifecycle rules and the
//! storage contract

pub mod error;
pub mod extractors;
pub mod identity;
pub mod lifecycle;
pub mod runtime;
pub mod service;
pub mod share_link;
pub mod store;
pub mod transaction;
pub mod validation;

pub use error::{NexusError, NexusResult};
pub use extractors::{DetectedRuntime, QueryParams, TransactionId};
pub use identity::{Role, User, current_user};
pub use lifecycle::{Actor, TransitionPreview, TransitionRequest};
pub use runtime::{RuntimeDetector, RuntimeEnvironment};
pub use service::TransactionService;
pub use share_link::{RenterView, ShareLink};
pub use store::TransactionStore;
pub use transaction::{
    ListQuery, Rating, StatusChange, Transaction, TransactionDraft, TransactionStatus,
};
pub use validation::Validated;
