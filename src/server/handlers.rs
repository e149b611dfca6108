//! HTTP handlers for transactions, share links, identity and environment
//!
//! Every JSON response carries an `ok` flag. Failures go through
//! [`NexusError`]'s `IntoResponse` and come out as
//! `{ok: false, error, code, details?}`.

use axum::{
    Json,
    extract::{FromRef, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::core::error::{NexusError, NexusResult, ValidationError};
use crate::core::extractors::{DetectedRuntime, QueryParams, TransactionId};
use crate::core::identity::{Role, current_user};
use crate::core::lifecycle::{TransitionPreview, TransitionRequest};
use crate::core::runtime::RuntimeDetector;
use crate::core::service::TransactionService;
use crate::core::share_link::{RenterView, ShareLink};
use crate::core::transaction::{Transaction, TransactionStatus};
use crate::core::validation::{CreateTransactionRequest, PatchTransactionRequest, Validated};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: TransactionService,
    pub detector: RuntimeDetector,
    /// Origin prefixed to generated share links
    pub public_origin: Arc<str>,
}

impl FromRef<AppState> for RuntimeDetector {
    fn from_ref(state: &AppState) -> Self {
        state.detector.clone()
    }
}

/// Log a failed request; server-side failures at `error`, caller mistakes at `debug`
fn log_failure(operation: &'static str) -> impl Fn(&NexusError) {
    move |err| {
        if err.status_code().is_server_error() {
            tracing::error!(operation, code = err.error_code(), error = %err, "request failed");
        } else {
            tracing::debug!(operation, code = err.error_code(), error = %err, "request rejected");
        }
    }
}

fn transaction_body(tx: Transaction) -> Json<Value> {
    Json(json!({ "ok": true, "transaction": tx }))
}

/// `POST /transactions`
pub async fn create_transaction(
    State(state): State<AppState>,
    Validated(payload): Validated<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Value>), NexusError> {
    let tx = state
        .service
        .create(payload.into())
        .await
        .inspect_err(log_failure("create_transaction"))?;

    Ok((StatusCode::CREATED, transaction_body(tx)))
}

/// Query string of `GET /transactions`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Only records created by this host client id
    pub host: Option<String>,
    /// Kept as text so a bad value becomes a field error rather than a
    /// bare extractor rejection
    pub limit: Option<String>,
}

impl ListParams {
    fn limit(&self) -> NexusResult<Option<usize>> {
        self.limit
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<usize>().map_err(|_| {
                    NexusError::from(ValidationError::FieldError {
                        field: "limit".to_string(),
                        message: format!("'limit' must be a positive integer (value: {})", raw),
                    })
                })
            })
            .transpose()
    }
}

/// `GET /transactions?host=&limit=`
pub async fn list_transactions(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Value>, NexusError> {
    let limit = params.limit()?;
    let host = params.host.as_deref().map(str::trim).filter(|h| !h.is_empty());

    let transactions = state
        .service
        .list(host, limit)
        .await
        .inspect_err(log_failure("list_transactions"))?;

    Ok(Json(json!({
        "ok": true,
        "transactions": transactions,
    })))
}

/// `GET /transactions/{id}`
pub async fn get_transaction(
    State(state): State<AppState>,
    TransactionId(id): TransactionId,
) -> Result<Json<Value>, NexusError> {
    let tx = state
        .service
        .get_by_id(&id)
        .await
        .inspect_err(log_failure("get_transaction"))?;
    Ok(transaction_body(tx))
}

/// The renter recorded on a lock when the caller names none
fn stub_renter(status: Option<TransactionStatus>, renter_id: Option<String>) -> Option<String> {
    match status {
        Some(TransactionStatus::Locked) => {
            renter_id.or_else(|| Some(current_user(Role::Renter).id))
        }
        _ => renter_id,
    }
}

/// `PATCH /transactions/{id}`
pub async fn patch_transaction(
    State(state): State<AppState>,
    TransactionId(id): TransactionId,
    Validated(mut patch): Validated<PatchTransactionRequest>,
) -> Result<Json<Value>, NexusError> {
    patch.renter_id = stub_renter(patch.status, patch.renter_id.take());
    let tx = state
        .service
        .patch(&id, patch)
        .await
        .inspect_err(log_failure("patch_transaction"))?;
    Ok(transaction_body(tx))
}

/// `POST /transactions/{id}/transitions`: validate only, nothing is written
pub async fn request_transition(
    State(state): State<AppState>,
    TransactionId(id): TransactionId,
    Validated(mut request): Validated<TransitionRequest>,
) -> Result<Json<Value>, NexusError> {
    request.renter_id = stub_renter(Some(request.status), request.renter_id.take());
    let preview = state
        .service
        .request_transition(&id, request)
        .await
        .inspect_err(log_failure("request_transition"))?;

    Ok(Json(json!({ "ok": true, "preview": preview })))
}

/// `POST /transactions/{id}/transitions/confirm`
pub async fn confirm_transition(
    State(state): State<AppState>,
    TransactionId(id): TransactionId,
    Validated(preview): Validated<TransitionPreview>,
) -> Result<Json<Value>, NexusError> {
    if preview.transaction_id != id {
        return Err(ValidationError::FieldError {
            field: "transaction_id".to_string(),
            message: format!("preview is for '{}', not '{}'", preview.transaction_id, id),
        }
        .into());
    }

    let tx = state
        .service
        .confirm_transition(&preview)
        .await
        .inspect_err(log_failure("confirm_transition"))?;
    Ok(transaction_body(tx))
}

/// `GET /transactions/{id}/share-link`
pub async fn share_link(
    State(state): State<AppState>,
    TransactionId(id): TransactionId,
) -> Result<Json<Value>, NexusError> {
    let tx = state
        .service
        .get_by_id(&id)
        .await
        .inspect_err(log_failure("share_link"))?;

    let link = ShareLink::for_transaction(&tx);
    Ok(Json(json!({
        "ok": true,
        "url": link.to_url(&state.public_origin),
        "link": link,
    })))
}

/// `GET /tx?...`: the renter's view of a share link.
///
/// An undecodable link is terminal; the response says `invalid_link` and
/// offers nothing to retry.
pub async fn renter_view(runtime: DetectedRuntime, RawQuery(query): RawQuery) -> Response {
    match ShareLink::decode(query.as_deref().unwrap_or_default()) {
        Ok(link) => {
            let view = RenterView::new(link, runtime);
            Json(json!({
                "ok": true,
                "state": "review",
                "link": view.link,
                "deposit": view.deposit_label,
                "period": view.period,
                "environment": view.environment,
                "badge": view.badge,
            }))
            .into_response()
        }
        Err(err) => {
            let err = NexusError::from(err);
            tracing::debug!(code = err.error_code(), error = %err, "invalid share link opened");
            (
                err.status_code(),
                Json(json!({
                    "ok": false,
                    "state": "invalid_link",
                    "error": err.to_string(),
                    "code": err.error_code(),
                    "environment": runtime.environment,
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MeParams {
    pub role: Option<String>,
}

/// `GET /me?role=host|renter`
pub async fn me(QueryParams(params): QueryParams<MeParams>) -> Result<Json<Value>, NexusError> {
    let role = match params.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => raw.parse::<Role>().map_err(|message| ValidationError::FieldError {
            field: "role".to_string(),
            message,
        })?,
        None => Role::default(),
    };

    Ok(Json(json!({ "ok": true, "user": current_user(role) })))
}

/// `GET /environment`
pub async fn environment(runtime: DetectedRuntime) -> Json<Value> {
    Json(json!({
        "ok": true,
        "environment": runtime.environment,
        "badge": runtime.badge,
    }))
}
