//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use volume_api::config::VolumeServiceConfig;
use volume_api::kubernetes::{K8sError, K8sResult, ResourceState, VolumeGateway};
use volume_api::tenant::HttpTenantRegistry;
use volume_api::volumes::Manifest;
use volume_api::{build_router, AppState};
use volume_common::ResourceKind;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SHARED_KEY: &str = "test-key";
pub const NFS_SERVER: &str = "10.0.0.5";
pub const NFS_PREFIX: &str = "/exports";

/// One call made against the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub operation: &'static str,
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

/// In-memory stand-in for the Kubernetes API
///
/// PVs are stored without a namespace, like the real cluster-scoped object.
#[derive(Default)]
pub struct RecordingGateway {
    objects: Mutex<HashMap<(ResourceKind, String, String), Value>>,
    calls: Mutex<Vec<GatewayCall>>,
    fail_with: Mutex<Option<(u16, String, String)>>,
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every following call fail with this API status
    pub fn fail_with(&self, code: u16, reason: &str, message: &str) {
        *self.fail_with.lock().unwrap() = Some((code, reason.to_string(), message.to_string()));
    }

    fn scope(kind: ResourceKind, namespace: &str) -> String {
        match kind {
            ResourceKind::Pv => String::new(),
            ResourceKind::Pvc => namespace.to_string(),
        }
    }

    fn record(&self, operation: &'static str, kind: ResourceKind, namespace: &str, name: &str) -> K8sResult<()> {
        self.calls.lock().unwrap().push(GatewayCall {
            operation,
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });

        match self.fail_with.lock().unwrap().clone() {
            Some((code, reason, message)) => Err(K8sError::Api { code, reason, message }),
            None => Ok(()),
        }
    }

    fn not_found(kind: ResourceKind, name: &str) -> K8sError {
        K8sError::Api {
            code: 404,
            reason: "NotFound".to_string(),
            message: format!("{} \"{}\" not found", kind.collection(), name),
        }
    }
}

#[async_trait]
impl VolumeGateway for RecordingGateway {
    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        manifest: &Manifest,
    ) -> K8sResult<ResourceState> {
        let name = manifest.name().unwrap_or_default().to_string();
        self.record("create", kind, namespace, &name)?;

        let key = (kind, Self::scope(kind, namespace), name.clone());
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(K8sError::Api {
                code: 409,
                reason: "AlreadyExists".to_string(),
                message: format!("{} \"{}\" already exists", kind.collection(), name),
            });
        }

        let mut stored = manifest.as_value().clone();
        stored["status"] = json!({"phase": "Pending"});
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn read_status(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> K8sResult<ResourceState> {
        self.record("read", kind, namespace, name)?;

        self.objects
            .lock()
            .unwrap()
            .get(&(kind, Self::scope(kind, namespace), name.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found(kind, name))
    }

    async fn delete(&self, kind: ResourceKind, name: &str, namespace: &str) -> K8sResult<()> {
        self.record("delete", kind, namespace, name)?;

        self.objects
            .lock()
            .unwrap()
            .remove(&(kind, Self::scope(kind, namespace), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(kind, name))
    }
}

/// Record for tenant `acme`, with all three templates
pub fn acme_record() -> Value {
    json!({
        "namespace": "acme-ns",
        "resources": {
            "templates": {
                "pv": {
                    "apiVersion": "v1",
                    "kind": "PersistentVolume",
                    "metadata": {"name": "{}", "labels": {"pv": "{}"}},
                    "spec": {
                        "capacity": {"storage": "10Gi"},
                        "accessModes": ["ReadWriteMany"],
                        "persistentVolumeReclaimPolicy": "Retain",
                        "nfs": {"server": "{}", "path": "{}"}
                    }
                },
                "pvc": {
                    "apiVersion": "v1",
                    "kind": "PersistentVolumeClaim",
                    "metadata": {"name": "{}"},
                    "spec": {
                        "accessModes": ["ReadWriteMany"],
                        "resources": {"requests": {"storage": "10Gi"}}
                    }
                },
                "match_pvc": {
                    "apiVersion": "v1",
                    "kind": "PersistentVolumeClaim",
                    "metadata": {"name": "{}"},
                    "spec": {
                        "accessModes": ["ReadWriteMany"],
                        "storageClassName": "",
                        "resources": {"requests": {"storage": "10Gi"}},
                        "selector": {"matchLabels": {"pv": "{}"}}
                    }
                }
            }
        }
    })
}

/// Tenant registry serving `acme` (and `plain`, which has no match template)
pub async fn tenant_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tenants/acme"))
        .and(header("moopkey", SHARED_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_record()))
        .mount(&server)
        .await;

    let mut plain = acme_record();
    plain["namespace"] = json!("plain-ns");
    plain["resources"]["templates"]["match_pvc"] = Value::Null;
    Mock::given(method("GET"))
        .and(path("/tenants/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plain))
        .mount(&server)
        .await;

    server
}

/// URL of a local port nothing listens on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn test_config(registry_url: &str) -> VolumeServiceConfig {
    let mut config = VolumeServiceConfig::default();
    config.tenant_registry.url = registry_url.to_string();
    config.tenant_registry.shared_key = SHARED_KEY.to_string();
    config.nfs.server = NFS_SERVER.to_string();
    config.nfs.prefix = NFS_PREFIX.to_string();
    config
}

/// Router wired to a wiremock registry and an in-memory gateway
pub fn test_app(registry: &MockServer, gateway: Arc<RecordingGateway>) -> Router {
    let config = test_config(&registry.uri());
    let tenants = HttpTenantRegistry::new(&config.tenant_registry).unwrap();
    build_router(Arc::new(AppState::new(config, Arc::new(tenants), gateway)))
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }

    app.clone()
        .oneshot(
            request
                .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_text(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn json_body(res: Response<Body>) -> Value {
    serde_json::from_str(&body_text(res).await).unwrap()
}
