//! Axum extractor for validated payloads
//!
//! This module provides the `Validated<T>` extractor that filters and
//! validates request bodies before they reach handlers.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde_json::Value;

use super::ValidatedPayload;
use crate::core::error::{NexusError, ValidationError};

/// Axum extractor that validates and deserialises a JSON body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_transaction(
///     Validated(payload): Validated<CreateTransactionRequest>,
/// ) -> Result<impl IntoResponse, NexusError> {
///     // payload is already validated and typed
/// }
/// ```
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: ValidatedPayload + Send,
{
    type Rejection = NexusError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<Value> =
            Json::from_request(req, state).await.map_err(|e| {
                NexusError::Validation(ValidationError::InvalidJson {
                    message: e.body_text(),
                })
            })?;

        T::from_json(payload).map(Validated)
    }
}
