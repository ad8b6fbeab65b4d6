//! Common types shared by the volume service and its clients

pub mod request;

pub use request::{CreateVolumeRequest, VolumeQuery, VolumeRequest};

use serde::{Deserialize, Serialize};

/// Tag used when a request does not carry one
pub const DEFAULT_TAG: &str = "default";

/// The two resource kinds the service manages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pv,
    Pvc,
}

impl ResourceKind {
    /// Kubernetes object kind
    pub fn k8s_kind(&self) -> &'static str {
        match self {
            ResourceKind::Pv => "PersistentVolume",
            ResourceKind::Pvc => "PersistentVolumeClaim",
        }
    }

    /// URL collection segment ("pvs" / "pvcs")
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Pv => "pvs",
            ResourceKind::Pvc => "pvcs",
        }
    }

    /// Template a creation request of this kind is built from
    pub fn template_kind(&self, match_labels: bool) -> TemplateKind {
        match (self, match_labels) {
            (ResourceKind::Pv, _) => TemplateKind::Pv,
            (ResourceKind::Pvc, true) => TemplateKind::MatchPvc,
            (ResourceKind::Pvc, false) => TemplateKind::Pvc,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.k8s_kind())
    }
}

/// Template slots a tenant can configure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Pv,
    Pvc,
    MatchPvc,
}

impl TemplateKind {
    /// Key of the template in the tenant registry's template map
    pub fn key(&self) -> &'static str {
        match self {
            TemplateKind::Pv => "pv",
            TemplateKind::Pvc => "pvc",
            TemplateKind::MatchPvc => "match_pvc",
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors raised while turning a request into a manifest
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no tenant parameter specified")]
    MissingTenant,

    #[error("no username parameter specified")]
    MissingUsername,

    #[error("no path parameter specified for pv")]
    MissingPath,

    #[error("invalid {field} '{value}': {reason}")]
    InvalidIdentifier {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("tenant registry returned status {status}: {body}")]
    TenantLookupFailed { status: u16, body: String },

    #[error("tenant registry unreachable: {0}")]
    TenantServiceUnavailable(String),

    #[error("tenant record is malformed: {0}")]
    TenantRecordInvalid(String),

    #[error("tenant template '{0}' is not configured")]
    TemplateMissing(TemplateKind),

    #[error("tenant template is malformed: {0}")]
    InvalidTemplate(String),

    #[error("System error: {0}")]
    System(String),
}

pub type Result<T> = std::result::Result<T, Error>;
