//! Liveness and readiness probes
//!
//! Liveness only reports that the process is serving. Readiness also checks
//! that the Kubernetes API answers.

use axum::{extract::State, http::StatusCode, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::error::PrettyJson;
use crate::kubernetes::VolumeGateway;
use crate::state::AppState;

/// Overall system health status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

/// Liveness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub alive: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: i64,
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub reason: Option<String>,
    pub components: Vec<ComponentHealth>,
    pub timestamp: i64,
}

/// Health checker for service dependencies
pub struct HealthChecker {
    start_time: Instant,
    version: String,
}

impl HealthChecker {
    pub fn new(version: &str) -> Self {
        Self {
            start_time: Instant::now(),
            version: version.to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn liveness(&self) -> LivenessResponse {
        LivenessResponse {
            alive: true,
            version: self.version.clone(),
            uptime_seconds: self.uptime_seconds(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Check that the Kubernetes API is reachable
    pub async fn check_kubernetes(&self, gateway: &dyn VolumeGateway) -> ComponentHealth {
        let start = Instant::now();

        match gateway.ready().await {
            Ok(()) => ComponentHealth {
                name: "kubernetes".to_string(),
                status: HealthStatus::Healthy,
                message: Some("API server reachable".to_string()),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            },
            Err(e) => ComponentHealth {
                name: "kubernetes".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(format!("API server unreachable: {}", e)),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            },
        }
    }

    fn aggregate_status(components: &[ComponentHealth]) -> HealthStatus {
        if components
            .iter()
            .any(|c| c.status == HealthStatus::Unhealthy)
        {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        }
    }

    /// Ready unless some component is unhealthy
    pub fn readiness(&self, components: Vec<ComponentHealth>) -> ReadinessResponse {
        let reason = match Self::aggregate_status(&components) {
            HealthStatus::Unhealthy => components
                .iter()
                .find(|c| c.status == HealthStatus::Unhealthy)
                .map(|c| format!("{} not ready", c.name)),
            _ => None,
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
            components,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

async fn liveness_probe(State(state): State<Arc<AppState>>) -> PrettyJson<LivenessResponse> {
    PrettyJson(state.health.liveness())
}

async fn readiness_probe(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, PrettyJson<ReadinessResponse>) {
    let kubernetes = state.health.check_kubernetes(state.gateway.as_ref()).await;
    let response = state.health.readiness(vec![kubernetes]);

    let status = if response.ready {
        StatusCode::OK
    } else {
        tracing::warn!(reason = ?response.reason, "Readiness check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, PrettyJson(response))
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
}
