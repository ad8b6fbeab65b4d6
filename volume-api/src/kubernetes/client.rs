//! Kubernetes client wrapper
//!
//! Wraps the kube-rs Client together with the API server it talks to.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use super::error::{K8sError, K8sResult};
use crate::config::KubernetesConfig;

/// Wrapper around kube-rs Client
#[derive(Clone)]
pub struct K8sClient {
    inner: Client,
    api_server: String,
}

impl K8sClient {
    /// Build a client according to the configured credential mode
    pub async fn from_config(config: &KubernetesConfig) -> K8sResult<Self> {
        if config.in_cluster {
            return Self::from_incluster();
        }

        match config.kubeconfig {
            Some(ref path) => {
                let yaml = tokio::fs::read_to_string(path).await.map_err(|e| {
                    K8sError::InvalidKubeconfig(format!(
                        "Failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_kubeconfig(&yaml, config.context.as_deref()).await
            }
            None => Self::from_default_kubeconfig(config.context.as_deref()).await,
        }
    }

    /// Create client from kubeconfig YAML with optional context
    pub async fn from_kubeconfig(kubeconfig_yaml: &str, context: Option<&str>) -> K8sResult<Self> {
        let kubeconfig = Kubeconfig::from_yaml(kubeconfig_yaml).map_err(|e| {
            K8sError::InvalidKubeconfig(format!("Failed to parse kubeconfig: {}", e))
        })?;

        let api_server = Self::extract_api_server(&kubeconfig, context)?;

        let config = Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: context.map(String::from),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create config: {}", e)))?;

        Self::from_kube_config(config, api_server)
    }

    /// Create client from `$KUBECONFIG` or `~/.kube/config`
    pub async fn from_default_kubeconfig(context: Option<&str>) -> K8sResult<Self> {
        let config = Config::from_kubeconfig(&KubeConfigOptions {
            context: context.map(String::from),
            ..Default::default()
        })
        .await
        .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to load kubeconfig: {}", e)))?;

        let api_server = config.cluster_url.to_string();
        Self::from_kube_config(config, api_server)
    }

    /// Create client from in-cluster configuration (for running inside K8s)
    pub fn from_incluster() -> K8sResult<Self> {
        let config = Config::incluster().map_err(|e| {
            K8sError::InvalidKubeconfig(format!("Failed to get in-cluster config: {}", e))
        })?;

        let api_server = config.cluster_url.to_string();
        Self::from_kube_config(config, api_server)
    }

    fn from_kube_config(config: Config, api_server: String) -> K8sResult<Self> {
        let client = Client::try_from(config)
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            inner: client,
            api_server,
        })
    }

    /// Extract API server URL from kubeconfig
    fn extract_api_server(kubeconfig: &Kubeconfig, context_name: Option<&str>) -> K8sResult<String> {
        let context_name = context_name
            .map(String::from)
            .or_else(|| kubeconfig.current_context.clone())
            .ok_or_else(|| {
                K8sError::InvalidKubeconfig("No context specified and no current-context".into())
            })?;

        let context = kubeconfig
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| {
                K8sError::InvalidKubeconfig(format!("Context '{}' not found", context_name))
            })?;

        let cluster_name = context
            .context
            .as_ref()
            .map(|c| c.cluster.as_str())
            .ok_or_else(|| K8sError::InvalidKubeconfig("Context has no cluster reference".into()))?;

        let cluster = kubeconfig
            .clusters
            .iter()
            .find(|c| c.name == cluster_name)
            .ok_or_else(|| {
                K8sError::InvalidKubeconfig(format!("Cluster '{}' not found", cluster_name))
            })?;

        cluster
            .cluster
            .as_ref()
            .and_then(|c| c.server.clone())
            .ok_or_else(|| K8sError::InvalidKubeconfig("Cluster has no server URL".into()))
    }

    /// Get the inner kube-rs Client
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Get API server URL
    pub fn api_server(&self) -> &str {
        &self.api_server
    }
}

impl std::fmt::Debug for K8sClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("K8sClient")
            .field("api_server", &self.api_server)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
- name: dev-cluster
  cluster:
    server: https://10.0.0.1:6443
- name: prod-cluster
  cluster:
    server: https://10.0.0.2:6443
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: admin
- name: prod
  context:
    cluster: prod-cluster
    user: admin
users:
- name: admin
  user:
    token: abc
"#;

    #[test]
    fn test_extract_api_server_current_context() {
        let kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();
        let server = K8sClient::extract_api_server(&kubeconfig, None).unwrap();
        assert_eq!(server, "https://10.0.0.1:6443");
    }

    #[test]
    fn test_extract_api_server_explicit_context() {
        let kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();
        let server = K8sClient::extract_api_server(&kubeconfig, Some("prod")).unwrap();
        assert_eq!(server, "https://10.0.0.2:6443");
    }

    #[test]
    fn test_extract_api_server_unknown_context() {
        let kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();
        let err = K8sClient::extract_api_server(&kubeconfig, Some("staging")).unwrap_err();
        assert!(err.to_string().contains("staging"));
    }
}
