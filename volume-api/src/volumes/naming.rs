//! Deterministic names, labels and paths
//!
//! Creation and lookup both derive names from the same (tenant, username, tag)
//! triple, which is what lets GET and DELETE find what POST created.

use volume_common::ResourceKind;

/// Label key carried by PVs and selected on by matching claims
pub const PV_LABEL_KEY: &str = "pv";

pub fn pv_name(tenant: &str, username: &str, tag: &str) -> String {
    format!("pv-{}-{}-{}", tenant, username, tag)
}

pub fn pvc_name(tenant: &str, username: &str, tag: &str) -> String {
    format!("pvc-{}-{}-{}", tenant, username, tag)
}

/// Value of the `pv` label on a volume, and of the selector on a matching claim
pub fn pv_label(tenant: &str, username: &str, tag: &str) -> String {
    pv_name(tenant, username, tag)
}

pub fn resource_name(kind: ResourceKind, tenant: &str, username: &str, tag: &str) -> String {
    match kind {
        ResourceKind::Pv => pv_name(tenant, username, tag),
        ResourceKind::Pvc => pvc_name(tenant, username, tag),
    }
}

/// Join the export prefix and a request path with a single `/`
pub fn storage_path(prefix: &str, request_path: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        request_path.trim_start_matches('/')
    )
}
