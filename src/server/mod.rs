//! HTTP server for the deposit-recording API
//!
//! This module provides a `ServerBuilder` that wires a transaction store,
//! the runtime detector and the share-link origin into an Axum router with:
//! - Transaction CRUD and two-step transition routes
//! - Share-link and renter-view routes
//! - Identity, environment and health routes

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
