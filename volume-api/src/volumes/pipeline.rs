//! Request pipeline
//!
//! Every volume operation runs the same stages in order:
//!
//! 1. validate the payload or query
//! 2. resolve the tenant through the registry
//! 3. synthesize a manifest (creation only)
//! 4. call the Kubernetes gateway
//!
//! Each stage hands a typed context to the next one, so a later stage cannot
//! run without the output of the earlier ones. The first failure stops the
//! pipeline.

use volume_common::{CreateVolumeRequest, ResourceKind, VolumeQuery, VolumeRequest};

use super::manifest::{Manifest, ManifestSynthesizer};
use super::naming::resource_name;
use crate::error::ApiError;
use crate::kubernetes::{ResourceState, VolumeGateway};
use crate::state::AppState;
use crate::tenant::{TenantRecord, TenantRegistry};
use crate::validation::RequestValidator;

/// A validated request together with its tenant record
#[derive(Debug, Clone)]
pub struct Resolved {
    pub request: VolumeRequest,
    pub tenant: TenantRecord,
}

impl Resolved {
    pub fn namespace(&self) -> &str {
        &self.tenant.namespace
    }

    /// Name of the object this request addresses
    pub fn resource_name(&self) -> String {
        resource_name(
            self.request.kind,
            &self.request.tenant,
            &self.request.username,
            &self.request.tag,
        )
    }
}

/// A tenant namespace with its manifest, ready to submit
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub namespace: String,
    pub manifest: Manifest,
}

/// Runs volume operations against the registry and the cluster
pub struct VolumePipeline<'a> {
    validator: &'a RequestValidator,
    tenants: &'a dyn TenantRegistry,
    gateway: &'a dyn VolumeGateway,
    synthesizer: ManifestSynthesizer,
}

impl<'a> VolumePipeline<'a> {
    pub fn new(
        validator: &'a RequestValidator,
        tenants: &'a dyn TenantRegistry,
        gateway: &'a dyn VolumeGateway,
        synthesizer: ManifestSynthesizer,
    ) -> Self {
        Self {
            validator,
            tenants,
            gateway,
            synthesizer,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            &state.validator,
            state.tenants.as_ref(),
            state.gateway.as_ref(),
            ManifestSynthesizer::new(&state.config.nfs),
        )
    }

    /// Create a PV or PVC and return the object the API server stored
    pub async fn create(
        &self,
        kind: ResourceKind,
        payload: CreateVolumeRequest,
    ) -> Result<ResourceState, ApiError> {
        let request = self.validator.validate_create(kind, payload)?;
        crate::log_volume_operation!("create", request);

        let resolved = self.resolve(request).await?;
        let synthesized = self.synthesize(resolved)?;

        let state = self
            .gateway
            .create(kind, &synthesized.namespace, &synthesized.manifest)
            .await?;

        tracing::info!(
            kind = %kind,
            name = synthesized.manifest.name().unwrap_or_default(),
            namespace = %synthesized.namespace,
            "Volume created"
        );

        Ok(state)
    }

    /// Read the status of a previously created PV or PVC
    pub async fn read(
        &self,
        kind: ResourceKind,
        query: VolumeQuery,
    ) -> Result<ResourceState, ApiError> {
        let request = self.validator.validate_lookup(kind, query)?;
        crate::log_volume_operation!("read", request);

        let resolved = self.resolve(request).await?;
        let name = resolved.resource_name();

        let state = self
            .gateway
            .read_status(kind, &name, resolved.namespace())
            .await?;
        Ok(state)
    }

    /// Delete a PV or PVC
    pub async fn delete(&self, kind: ResourceKind, query: VolumeQuery) -> Result<(), ApiError> {
        let request = self.validator.validate_lookup(kind, query)?;
        crate::log_volume_operation!("delete", request);

        let resolved = self.resolve(request).await?;
        let name = resolved.resource_name();

        self.gateway
            .delete(kind, &name, resolved.namespace())
            .await?;

        tracing::info!(kind = %kind, name = %name, namespace = resolved.namespace(), "Volume deleted");
        Ok(())
    }

    async fn resolve(&self, request: VolumeRequest) -> Result<Resolved, ApiError> {
        let tenant = self.tenants.lookup(&request.tenant).await?;
        Ok(Resolved { request, tenant })
    }

    fn synthesize(&self, resolved: Resolved) -> Result<Synthesized, ApiError> {
        let manifest = self
            .synthesizer
            .synthesize(&resolved.request, &resolved.tenant)?;

        Ok(Synthesized {
            namespace: resolved.tenant.namespace,
            manifest,
        })
    }
}
