//! Route table for the deposit-recording API

use crate::server::handlers::{
    AppState, confirm_transition, create_transaction, environment, get_transaction,
    list_transactions, me, patch_transaction, renter_view, request_transition, share_link,
};
use axum::{Json, Router, routing::get, routing::post};
use serde_json::{Value, json};

/// Build the transaction, share-link, identity and environment routes
///
/// - POST/GET /transactions - Create / list (newest first)
/// - GET/PATCH /transactions/{id} - Fetch / update status or rating
/// - POST /transactions/{id}/transitions - Preview a transition
/// - POST /transactions/{id}/transitions/confirm - Commit a preview
/// - GET /transactions/{id}/share-link - Share URL for a record
/// - GET /tx - Renter view of a share link
/// - GET /me - Stub identity
/// - GET /environment - Runtime badge
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/transactions",
            post(create_transaction).get(list_transactions),
        )
        .route(
            "/transactions/{id}",
            get(get_transaction).patch(patch_transaction),
        )
        .route("/transactions/{id}/transitions", post(request_transition))
        .route(
            "/transactions/{id}/transitions/confirm",
            post(confirm_transition),
        )
        .route("/transactions/{id}/share-link", get(share_link))
        .route("/tx", get(renter_view))
        .route("/me", get(me))
        .route("/environment", get(environment))
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "ok": true,
        "status": "ok",
        "service": "nexus-deposit"
    }))
}
