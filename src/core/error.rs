//! Typed error handling for nexus
//!
//! Every fallible operation in the crate returns [`NexusResult`]. Errors are
//! grouped by category so HTTP handlers can map them to a status code and a
//! stable machine-readable code without string matching.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed or missing input fields
//! - [`TransactionError`]: lifecycle violations and unknown records
//! - [`ShareLinkError`]: share links that cannot be decoded
//! - [`StorageError`]: storage backend failures
//! - [`ConfigError`]: configuration parsing and validation
//!
//! # Example
//!
//! ```rust,ignore
//! match service.transition(&id, TransitionRequest::to(TransactionStatus::Completed)).await {
//!     Ok(tx) => println!("completed {}", tx.id),
//!     Err(NexusError::Transaction(TransactionError::InvalidTransition { from, to, .. })) => {
//!         println!("cannot go from {} to {}", from, to);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::core::transaction::TransactionStatus;

/// The main error type for nexus
#[derive(Debug, Error)]
pub enum NexusError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    ShareLink(#[from] ShareLinkError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Should not happen in normal operation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body returned by every failing HTTP endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub ok: bool,
    /// Human-readable error message
    pub error: String,
    /// Error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl NexusError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            NexusError::Validation(_) => StatusCode::BAD_REQUEST,
            NexusError::Transaction(e) => e.status_code(),
            NexusError::ShareLink(_) => StatusCode::BAD_REQUEST,
            NexusError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NexusError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NexusError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            NexusError::Validation(_) => "VALIDATION_ERROR",
            NexusError::Transaction(e) => e.error_code(),
            NexusError::ShareLink(_) => "INVALID_SHARE_LINK",
            NexusError::Storage(_) => "STORAGE_ERROR",
            NexusError::Config(_) => "CONFIG_ERROR",
            NexusError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            ok: false,
            error: self.to_string(),
            code: self.error_code().to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            NexusError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            NexusError::Transaction(TransactionError::NotFound { id }) => {
                Some(serde_json::json!({ "id": id.to_string() }))
            }
            NexusError::Transaction(TransactionError::InvalidTransition { id, from, to }) => {
                Some(serde_json::json!({
                    "id": id.to_string(),
                    "from": from,
                    "to": to,
                }))
            }
            NexusError::Transaction(TransactionError::StaleTransition {
                id,
                expected,
                actual,
            }) => Some(serde_json::json!({
                "id": id.to_string(),
                "expected": expected,
                "actual": actual,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for NexusError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Validation error for field '{field}': {message}")]
    FieldError { field: String, message: String },

    #[error("Validation errors: {}", join_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Invalid query string: {message}")]
    InvalidQuery { message: String },

    #[error("Invalid transaction id: '{value}'")]
    InvalidId { value: String },

    #[error("At least one of 'status' or 'rating' must be provided")]
    EmptyPatch,
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn join_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Transaction Errors
// =============================================================================

/// Errors raised by the transaction lifecycle
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Transaction with id '{id}' not found")]
    NotFound { id: Uuid },

    #[error("Transaction '{id}' cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// The record changed between preview and confirmation
    #[error("Transaction '{id}' is '{actual}', expected '{expected}'")]
    StaleTransition {
        id: Uuid,
        expected: TransactionStatus,
        actual: TransactionStatus,
    },

    #[error("A rating can only be attached when completing a transaction (target: '{target}')")]
    RatingNotAllowed { target: TransactionStatus },

    #[error("Transaction '{id}' has already been rated")]
    AlreadyRated { id: Uuid },
}

impl TransactionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TransactionError::NotFound { .. } => StatusCode::NOT_FOUND,
            TransactionError::InvalidTransition { .. } => StatusCode::CONFLICT,
            TransactionError::StaleTransition { .. } => StatusCode::CONFLICT,
            TransactionError::RatingNotAllowed { .. } => StatusCode::BAD_REQUEST,
            TransactionError::AlreadyRated { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TransactionError::NotFound { .. } => "TRANSACTION_NOT_FOUND",
            TransactionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            TransactionError::StaleTransition { .. } => "STALE_TRANSITION",
            TransactionError::RatingNotAllowed { .. } => "RATING_NOT_ALLOWED",
            TransactionError::AlreadyRated { .. } => "ALREADY_RATED",
        }
    }
}

// =============================================================================
// Share Link Errors
// =============================================================================

/// A share link that cannot be turned into a renter view
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShareLinkError {
    #[error("Invalid link: missing '{param}' parameter")]
    MissingParam { param: &'static str },

    #[error("Invalid link: '{param}' has invalid value '{value}'")]
    InvalidParam { param: &'static str, value: String },

    #[error("Invalid link: {message}")]
    Malformed { message: String },
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to connect to {backend}: {message}")]
    ConnectionError { backend: String, message: String },

    #[error("{backend} query error: {message}")]
    QueryError { backend: String, message: String },

    #[error("{backend} I/O error: {message}")]
    IoError { backend: String, message: String },

    #[error("Data integrity error: {message}")]
    IntegrityError { message: String },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config{}: {message}", .file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    #[error("Missing required field '{field}' in {context}")]
    MissingField { field: String, context: String },

    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for NexusError {
    fn from(err: serde_json::Error) -> Self {
        NexusError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for NexusError {
    fn from(err: serde_yaml::Error) -> Self {
        NexusError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for NexusError {
    fn from(err: sqlx::Error) -> Self {
        NexusError::Storage(StorageError::QueryError {
            backend: "PostgreSQL".to_string(),
            message: err.to_string(),
        })
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for nexus operations
pub type NexusResult<T> = Result<T, NexusError>;
