///! Error responses for the HTTP surface
///!
///! Every failure is rendered as `{"error": "<message>"}`, pretty-printed with
///! sorted keys, the same as successful JSON bodies.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Client-facing message for tenant registry failures
pub const TENANT_FAILURE_MESSAGE: &str = "tenant service returned failure";
/// Client-facing message for Kubernetes API failures
pub const KUBERNETES_FAILURE_MESSAGE: &str = "Kubernetes API request failed";
/// Client-facing message for unexpected failures
pub const SERVICE_FAILURE_MESSAGE: &str = "Volume service failed.";

/// Standard API error body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// HTTP status code, carried in the status line only
    #[serde(skip)]
    pub status: u16,

    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }
}

/// API error types with standardized responses
#[derive(Debug)]
pub enum ApiError {
    /// 400, request is missing or has malformed fields
    BadRequest(String),

    /// 502, tenant registry answered with a failure
    TenantLookup(String),

    /// 503, tenant registry could not be reached
    TenantUnavailable(String),

    /// 4xx, the Kubernetes API rejected the call
    Kubernetes { status: u16, detail: String },

    /// 500, tenant data cannot produce a manifest
    Misconfigured(String),

    /// 500, anything unforeseen; detail stays in the logs
    Internal(String),
}

impl ApiError {
    /// Convert error to ErrorResponse, logging server-side detail
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(msg) => {
                debug!("Rejected request: {}", msg);
                ErrorResponse::new(400, msg.clone())
            }
            ApiError::TenantLookup(detail) => {
                error!("Tenant lookup failed: {}", detail);
                ErrorResponse::new(502, TENANT_FAILURE_MESSAGE)
            }
            ApiError::TenantUnavailable(detail) => {
                error!("Tenant registry unavailable: {}", detail);
                ErrorResponse::new(503, TENANT_FAILURE_MESSAGE)
            }
            ApiError::Kubernetes { status, detail } => {
                error!(status = *status, "Kubernetes API request failed: {}", detail);
                ErrorResponse::new(*status, format!("{}: {}", KUBERNETES_FAILURE_MESSAGE, detail))
            }
            ApiError::Misconfigured(msg) => {
                error!("Tenant configuration error: {}", msg);
                ErrorResponse::new(500, msg.clone())
            }
            ApiError::Internal(detail) => {
                error!(severity = "critical", "Program error: {}", detail);
                ErrorResponse::new(500, SERVICE_FAILURE_MESSAGE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = self.to_error_response();
        let status_code = StatusCode::from_u16(error_response.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status_code, PrettyJson(error_response)).into_response()
    }
}

impl From<volume_common::Error> for ApiError {
    fn from(err: volume_common::Error) -> Self {
        use volume_common::Error;

        match err {
            Error::MissingTenant
            | Error::MissingUsername
            | Error::MissingPath
            | Error::InvalidIdentifier { .. } => ApiError::BadRequest(err.to_string()),
            Error::TenantLookupFailed { .. } | Error::TenantRecordInvalid(_) => {
                ApiError::TenantLookup(err.to_string())
            }
            Error::TenantServiceUnavailable(_) => ApiError::TenantUnavailable(err.to_string()),
            Error::TemplateMissing(_) | Error::InvalidTemplate(_) => {
                ApiError::Misconfigured(err.to_string())
            }
            Error::System(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}

/// JSON body pretty-printed with a one-space indent and sorted keys
#[derive(Debug, Clone)]
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> PrettyJson<T> {
    pub fn render(&self) -> Result<String, serde_json::Error> {
        let value = sort_keys(serde_json::to_value(&self.0)?);
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Rebuild every object with its keys in order, independent of how
/// serde_json's map is backed
fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                error!(severity = "critical", "Failed to serialize response: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                    "{\n \"error\": \"Volume service failed.\"\n}",
                )
                    .into_response()
            }
        }
    }
}
