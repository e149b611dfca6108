//! Axum extractors for request metadata
//!
//! - [`DetectedRuntime`] resolves the environment badge once per request
//! - [`TransactionId`] parses the `{id}` path segment into a UUID
//! - [`QueryParams`] parses the query string, rejecting with a JSON error body

use axum::extract::{FromRef, FromRequestParts, Path, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::core::error::{NexusError, ValidationError};
use crate::core::runtime::{RuntimeDetector, RuntimeEnvironment};

/// Runtime environment of the caller, detected from its headers, with its
/// badge label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedRuntime {
    pub environment: RuntimeEnvironment,
    pub badge: String,
}

impl<S> FromRequestParts<S> for DetectedRuntime
where
    S: Send + Sync,
    RuntimeDetector: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let detector = RuntimeDetector::from_ref(state);
        let environment = detector.detect(&parts.headers);
        Ok(DetectedRuntime {
            environment,
            badge: detector.badge(environment),
        })
    }
}

/// Typed query string; a bad one is a `VALIDATION_ERROR`
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = NexusError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                NexusError::Validation(ValidationError::InvalidQuery {
                    message: e.body_text(),
                })
            })?;
        Ok(QueryParams(params))
    }
}

/// Transaction id from the `{id}` path segment.
///
/// A malformed id is a validation error (400), not a missing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionId(pub Uuid);

impl<S> FromRequestParts<S> for TransactionId
where
    S: Send + Sync,
{
    type Rejection = NexusError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                NexusError::Validation(ValidationError::InvalidId {
                    value: e.body_text(),
                })
            })?;

        Uuid::parse_str(&raw)
            .map(TransactionId)
            .map_err(|_| ValidationError::InvalidId { value: raw }.into())
    }
}
