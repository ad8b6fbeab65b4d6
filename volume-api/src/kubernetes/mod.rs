//! Kubernetes integration
//!
//! - Client construction from kubeconfig or in-cluster credentials
//! - PV / PVC create, status and delete
//! - Error mapping onto API responses

pub mod client;
pub mod error;
pub mod volumes;

pub use client::K8sClient;
pub use error::{K8sError, K8sResult};
pub use volumes::{ResourceState, VolumeGateway};
