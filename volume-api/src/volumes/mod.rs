//! Volume provisioning
//!
//! Naming, manifest synthesis, the request pipeline and its HTTP routes.

pub mod handlers;
pub mod manifest;
pub mod naming;
pub mod pipeline;

use axum::{routing::post, Router};
use std::sync::Arc;

use volume_common::ResourceKind;

use crate::state::AppState;

pub use manifest::{Manifest, ManifestSynthesizer};
pub use pipeline::VolumePipeline;

/// Routes prefix shared by both resource collections
pub const VOLUMES_PREFIX: &str = "/service/v1/volumes";

pub fn collection_path(kind: ResourceKind) -> String {
    format!("{}/{}", VOLUMES_PREFIX, kind.collection())
}

/// PV and PVC routes
pub fn volume_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &collection_path(ResourceKind::Pv),
            post(handlers::create_pv)
                .get(handlers::get_pv)
                .delete(handlers::delete_pv),
        )
        .route(
            &collection_path(ResourceKind::Pvc),
            post(handlers::create_pvc)
                .get(handlers::get_pvc)
                .delete(handlers::delete_pvc),
        )
}
