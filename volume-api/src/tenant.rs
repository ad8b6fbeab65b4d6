//! Tenant registry client
//!
//! Looks up a tenant's namespace and manifest templates. Records are fetched
//! fresh on every call; nothing is cached.

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use volume_common::{Error, Result, TemplateKind};

use crate::config::TenantRegistryConfig;

/// A tenant's namespace and templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub namespace: String,
    #[serde(default)]
    pub resources: TenantResources,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantResources {
    #[serde(default)]
    pub templates: TemplateSet,
}

/// Unfilled manifests keyed by template slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_pvc: Option<Value>,
}

impl TenantRecord {
    pub fn templates(&self) -> &TemplateSet {
        &self.resources.templates
    }
}

impl TemplateSet {
    /// Template for a slot, if the tenant configured one
    pub fn get(&self, kind: TemplateKind) -> Option<&Value> {
        match kind {
            TemplateKind::Pv => self.pv.as_ref(),
            TemplateKind::Pvc => self.pvc.as_ref(),
            TemplateKind::MatchPvc => self.match_pvc.as_ref(),
        }
        .filter(|template| !template.is_null())
    }
}

/// Source of tenant records
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    async fn lookup(&self, tenant: &str) -> Result<TenantRecord>;
}

/// Tenant registry reached over HTTP
pub struct HttpTenantRegistry {
    client: reqwest::Client,
    base_url: Url,
    key_header: HeaderName,
    shared_key: HeaderValue,
}

impl HttpTenantRegistry {
    pub fn new(config: &TenantRegistryConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| {
            Error::System(format!("Invalid tenant registry URL '{}': {}", config.url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::System(format!(
                "Tenant registry URL '{}' cannot be used as a base",
                config.url
            )));
        }

        let key_header = HeaderName::from_bytes(config.key_header.as_bytes()).map_err(|e| {
            Error::System(format!("Invalid key header '{}': {}", config.key_header, e))
        })?;
        let mut shared_key = HeaderValue::from_str(&config.shared_key)
            .map_err(|e| Error::System(format!("Invalid shared key: {}", e)))?;
        shared_key.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::System(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            key_header,
            shared_key,
        })
    }

    /// `{base}/tenants/{tenant}` with the tenant id percent-encoded
    pub fn tenant_url(&self, tenant: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["tenants", tenant]);
        }
        url
    }
}

#[async_trait]
impl TenantRegistry for HttpTenantRegistry {
    async fn lookup(&self, tenant: &str) -> Result<TenantRecord> {
        let url = self.tenant_url(tenant);
        tracing::debug!(tenant, url = %url, "Looking up tenant");

        let response = self
            .client
            .get(url)
            .header(self.key_header.clone(), self.shared_key.clone())
            .send()
            .await
            .map_err(|e| Error::TenantServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TenantLookupFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::TenantServiceUnavailable(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| Error::TenantRecordInvalid(e.to_string()))
    }
}
