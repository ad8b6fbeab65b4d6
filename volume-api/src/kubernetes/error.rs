//! Kubernetes error types and ApiError mapping
//!
//! API-reported failures surface to the caller as 4xx; everything else is a
//! server fault.

use crate::error::ApiError;
use thiserror::Error;

/// Kubernetes-specific errors
#[derive(Debug, Error)]
pub enum K8sError {
    /// The API server rejected the request
    #[error("{reason} ({code}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// Transport or client-side failure from kube-rs
    #[error("Kubernetes client error: {0}")]
    Client(String),

    /// Invalid kubeconfig or in-cluster environment
    #[error("Invalid kubeconfig: {0}")]
    InvalidKubeconfig(String),

    /// Synthesized manifest does not describe a valid object
    #[error("Invalid manifest for {kind}: {message}")]
    InvalidManifest { kind: String, message: String },

    /// Internal system error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<kube::Error> for K8sError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => K8sError::Api {
                code: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => K8sError::Client(other.to_string()),
        }
    }
}

impl From<K8sError> for ApiError {
    fn from(err: K8sError) -> Self {
        match err {
            K8sError::Api {
                code,
                reason,
                message,
            } => {
                let status = if (400..500).contains(&code) { code } else { 400 };
                let detail = if message.is_empty() { reason } else { message };
                ApiError::Kubernetes { status, detail }
            }
            K8sError::InvalidManifest { .. } => ApiError::Misconfigured(err.to_string()),
            K8sError::Client(_) | K8sError::InvalidKubeconfig(_) | K8sError::Internal(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

/// Result type alias for Kubernetes operations
pub type K8sResult<T> = std::result::Result<T, K8sError>;
