//! Volume API Library
//!
//! Provisions NFS-backed PersistentVolumes and PersistentVolumeClaims for
//! tenants, from templates held by a tenant registry. Exposed as a library so
//! the binary and the integration tests build the same router.

// Core modules
pub mod config;
pub mod error;
pub mod validation;

// Application state
pub mod state;
pub use state::AppState;

// Tenant registry
pub mod tenant;

// Kubernetes integration
pub mod kubernetes;

// Volume provisioning
pub mod volumes;

// Logging configuration
pub mod logging;

// Health checks and readiness probes
pub mod health;

// Graceful shutdown handling
pub mod shutdown;

use axum::{http::StatusCode, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::{ErrorResponse, PrettyJson};

async fn not_found() -> (StatusCode, PrettyJson<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        PrettyJson(ErrorResponse::new(404, "resource not found")),
    )
}

/// Build the full HTTP router over shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(volumes::volume_routes())
        .merge(health::health_routes())
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
