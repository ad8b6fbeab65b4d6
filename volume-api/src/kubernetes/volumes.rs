//! PersistentVolume and PersistentVolumeClaim operations
//!
//! The `VolumeGateway` trait is the seam between request handling and the
//! cluster; `K8sClient` implements it against the Kubernetes API.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim};
use kube::api::{Api, DeleteParams, PostParams};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use volume_common::ResourceKind;

use crate::kubernetes::client::K8sClient;
use crate::kubernetes::error::{K8sError, K8sResult};
use crate::volumes::manifest::Manifest;

/// Object as returned by the API server
pub type ResourceState = Value;

/// Create, read and delete volumes in the cluster
#[async_trait]
pub trait VolumeGateway: Send + Sync {
    /// Submit a manifest. `namespace` is ignored for cluster-scoped PVs.
    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        manifest: &Manifest,
    ) -> K8sResult<ResourceState>;

    /// Read an object's status
    async fn read_status(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> K8sResult<ResourceState>;

    /// Delete an object
    async fn delete(&self, kind: ResourceKind, name: &str, namespace: &str) -> K8sResult<()>;

    /// Check that the backend is reachable
    async fn ready(&self) -> K8sResult<()> {
        Ok(())
    }
}

#[async_trait]
impl VolumeGateway for K8sClient {
    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        manifest: &Manifest,
    ) -> K8sResult<ResourceState> {
        match kind {
            ResourceKind::Pv => create_pv(self, manifest).await,
            ResourceKind::Pvc => create_pvc(self, namespace, manifest).await,
        }
    }

    async fn read_status(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> K8sResult<ResourceState> {
        match kind {
            ResourceKind::Pv => read_pv_status(self, name).await,
            ResourceKind::Pvc => read_pvc_status(self, namespace, name).await,
        }
    }

    async fn delete(&self, kind: ResourceKind, name: &str, namespace: &str) -> K8sResult<()> {
        match kind {
            ResourceKind::Pv => delete_pv(self, name).await,
            ResourceKind::Pvc => delete_pvc(self, namespace, name).await,
        }
    }

    async fn ready(&self) -> K8sResult<()> {
        self.inner().apiserver_version().await?;
        Ok(())
    }
}

// ============================================================================
// PersistentVolume Operations
// ============================================================================

/// Create a PV (cluster-scoped)
pub async fn create_pv(client: &K8sClient, manifest: &Manifest) -> K8sResult<ResourceState> {
    let pv: PersistentVolume = decode(ResourceKind::Pv, manifest)?;
    let pvs: Api<PersistentVolume> = Api::all(client.inner().clone());

    let created = pvs.create(&PostParams::default(), &pv).await?;
    encode(&created)
}

/// Read a PV's status
pub async fn read_pv_status(client: &K8sClient, name: &str) -> K8sResult<ResourceState> {
    let pvs: Api<PersistentVolume> = Api::all(client.inner().clone());

    let pv = pvs.get_status(name).await?;
    encode(&pv)
}

/// Delete a PV
pub async fn delete_pv(client: &K8sClient, name: &str) -> K8sResult<()> {
    let pvs: Api<PersistentVolume> = Api::all(client.inner().clone());
    pvs.delete(name, &DeleteParams::default()).await?;

    Ok(())
}

// ============================================================================
// PersistentVolumeClaim Operations
// ============================================================================

/// Create a PVC in a namespace
pub async fn create_pvc(
    client: &K8sClient,
    namespace: &str,
    manifest: &Manifest,
) -> K8sResult<ResourceState> {
    let pvc: PersistentVolumeClaim = decode(ResourceKind::Pvc, manifest)?;
    let pvcs: Api<PersistentVolumeClaim> = Api::namespaced(client.inner().clone(), namespace);

    let created = pvcs.create(&PostParams::default(), &pvc).await?;
    encode(&created)
}

/// Read a PVC's status
pub async fn read_pvc_status(
    client: &K8sClient,
    namespace: &str,
    name: &str,
) -> K8sResult<ResourceState> {
    let pvcs: Api<PersistentVolumeClaim> = Api::namespaced(client.inner().clone(), namespace);

    let pvc = pvcs.get_status(name).await?;
    encode(&pvc)
}

/// Delete a PVC
pub async fn delete_pvc(client: &K8sClient, namespace: &str, name: &str) -> K8sResult<()> {
    let pvcs: Api<PersistentVolumeClaim> = Api::namespaced(client.inner().clone(), namespace);
    pvcs.delete(name, &DeleteParams::default()).await?;

    Ok(())
}

fn decode<K: DeserializeOwned>(kind: ResourceKind, manifest: &Manifest) -> K8sResult<K> {
    serde_json::from_value(manifest.as_value().clone()).map_err(|e| K8sError::InvalidManifest {
        kind: kind.k8s_kind().to_string(),
        message: e.to_string(),
    })
}

fn encode<K: Serialize>(object: &K) -> K8sResult<ResourceState> {
    serde_json::to_value(object)
        .map_err(|e| K8sError::Internal(format!("Failed to encode API response: {}", e)))
}
