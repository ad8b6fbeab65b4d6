//! Configuration management for the volume service
//!
//! Settings are resolved in three layers:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML, or YAML when the file ends in `.yaml`/`.yml`)
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeServiceConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Tenant registry connection
    pub tenant_registry: TenantRegistryConfig,
    /// NFS backing storage
    pub nfs: NfsConfig,
    /// Kubernetes API credentials
    pub kubernetes: KubernetesConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Request validation
    pub validation: ValidationConfig,
    /// Problems found while loading, logged once logging is up
    #[serde(skip)]
    pub warnings: Vec<String>,
}

/// Top-level sections a config file may contain
const SECTIONS: &[&str] = &[
    "server",
    "tenant_registry",
    "nfs",
    "kubernetes",
    "logging",
    "validation",
];

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Verbose logging
    pub debug: bool,
}

/// Tenant registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantRegistryConfig {
    /// Base URL; tenants are fetched from `{url}/tenants/{tenant}`
    pub url: String,
    /// Shared secret sent on every lookup
    pub shared_key: String,
    /// Header carrying the shared secret
    pub key_header: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// NFS server that backs every PV
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NfsConfig {
    /// Server address written into `spec.nfs.server`
    pub server: String,
    /// Export prefix; request paths are placed below it
    pub prefix: String,
}

/// Kubernetes API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    /// Use the service account mounted into the pod
    pub in_cluster: bool,
    /// Kubeconfig file; falls back to the default lookup when unset
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context; falls back to current-context when unset
    pub context: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for JSON log files; console only when unset
    pub file_path: Option<PathBuf>,
    /// Emit console output as JSON
    pub json_format: bool,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Require tenant, username and tag to be DNS-1123 labels
    pub strict_identifiers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            debug: false,
        }
    }
}

impl Default for TenantRegistryConfig {
    fn default() -> Self {
        Self {
            url: "http://tenant-service:8080".to_string(),
            shared_key: String::new(),
            key_header: "moopkey".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for NfsConfig {
    fn default() -> Self {
        Self {
            server: "nfs-server".to_string(),
            prefix: "/exports".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            json_format: false,
        }
    }
}

impl VolumeServiceConfig {
    /// Load configuration from the first config file found, then apply
    /// environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e.to_string()))?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );

        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config: Self = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;

        config.warn_unknown_sections(table.keys().map(String::as_str));
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config: Self = if value.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::Parse(e.to_string()))?
        };

        if let Some(mapping) = value.as_mapping() {
            config.warn_unknown_sections(mapping.keys().filter_map(serde_yaml::Value::as_str));
        }
        Ok(config)
    }

    /// Record top-level keys that no section reads, such as the flat
    /// `tenant_service_url` / `nfs_server` layout
    fn warn_unknown_sections<'a>(&mut self, keys: impl Iterator<Item = &'a str>) {
        for key in keys.filter(|key| !SECTIONS.contains(key)) {
            self.warnings.push(format!(
                "Ignoring unknown config key '{}'; expected one of: {}",
                key,
                SECTIONS.join(", ")
            ));
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("VOLUME_SERVICE_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("/etc/volume-service/config.toml")),
            Some(PathBuf::from("./config.toml")),
            Some(PathBuf::from("./config.yaml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = var("VOLUME_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("VOLUME_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => self.warn_invalid_env("VOLUME_PORT", &port),
            }
        }
        if let Some(debug) = var("VOLUME_DEBUG") {
            match parse_flag(&debug) {
                Some(debug) => self.server.debug = debug,
                None => self.warn_invalid_env("VOLUME_DEBUG", &debug),
            }
        }

        // Tenant registry
        if let Some(url) = var("VOLUME_TENANT_SERVICE_URL") {
            self.tenant_registry.url = url;
        }
        if let Some(key) = var("VOLUME_SHARED_KEY").or_else(|| var("MOOPKEY")) {
            self.tenant_registry.shared_key = key;
        }

        // NFS
        if let Some(server) = var("VOLUME_NFS_SERVER") {
            self.nfs.server = server;
        }
        if let Some(prefix) = var("VOLUME_NFS_PREFIX") {
            self.nfs.prefix = prefix;
        }

        // Kubernetes
        if let Some(in_cluster) = var("VOLUME_IN_CLUSTER") {
            match parse_flag(&in_cluster) {
                Some(in_cluster) => self.kubernetes.in_cluster = in_cluster,
                None => self.warn_invalid_env("VOLUME_IN_CLUSTER", &in_cluster),
            }
        }
        if let Some(path) = var("VOLUME_KUBECONFIG") {
            self.kubernetes.kubeconfig = Some(PathBuf::from(path));
        }

        // Logging
        if let Some(level) = var("VOLUME_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(path) = var("VOLUME_LOG_PATH") {
            self.logging.file_path = Some(PathBuf::from(path));
        }
    }

    fn warn_invalid_env(&mut self, key: &str, value: &str) {
        self.warnings
            .push(format!("Ignoring {}='{}': not a valid value", key, value));
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("Port cannot be 0".to_string()));
        }

        let registry = reqwest::Url::parse(&self.tenant_registry.url).map_err(|e| {
            ConfigError::Validation(format!(
                "Tenant registry URL '{}' is invalid: {}",
                self.tenant_registry.url, e
            ))
        })?;
        if !matches!(registry.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "Tenant registry URL must be http or https, got '{}'",
                registry.scheme()
            )));
        }

        if self.tenant_registry.key_header.is_empty() {
            return Err(ConfigError::Validation(
                "Tenant registry key header cannot be empty".to_string(),
            ));
        }

        if self.nfs.server.is_empty() {
            return Err(ConfigError::Validation(
                "NFS server cannot be empty".to_string(),
            ));
        }

        if self
            .logging
            .level
            .parse::<tracing::level_filters::LevelFilter>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file {0:?}: {1}")]
    FileRead(PathBuf, String),
    /// Failed to parse configuration
    #[error("Failed to parse config: {0}")]
    Parse(String),
    /// Configuration validation failed
    #[error("Config validation failed: {0}")]
    Validation(String),
}

/// Boolean env values: true/false, 1/0, yes/no, on/off
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
