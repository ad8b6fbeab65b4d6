///! Request validation
///! Turns raw request payloads into normalized `VolumeRequest`s

use regex::Regex;
use std::sync::LazyLock;
use volume_common::{
    CreateVolumeRequest, Error, ResourceKind, VolumeQuery, VolumeRequest, DEFAULT_TAG,
};

/// Longest identifier segment accepted in strict mode (DNS-1123 label)
pub const MAX_SEGMENT_LENGTH: usize = 63;

static DNS_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap()
});

/// Validation result type
pub type ValidationResult<T> = Result<T, Error>;

/// Validator for volume requests
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator {
    strict_identifiers: bool,
}

impl RequestValidator {
    pub fn new(strict_identifiers: bool) -> Self {
        Self { strict_identifiers }
    }

    /// Validate a creation body
    pub fn validate_create(
        &self,
        kind: ResourceKind,
        payload: CreateVolumeRequest,
    ) -> ValidationResult<VolumeRequest> {
        let tenant = required(payload.tenant).ok_or(Error::MissingTenant)?;
        let username = required(payload.username).ok_or(Error::MissingUsername)?;

        let path = match kind {
            ResourceKind::Pv => Some(required(payload.path).ok_or(Error::MissingPath)?),
            ResourceKind::Pvc => None,
        };

        let request = VolumeRequest {
            kind,
            tenant,
            username,
            tag: tag_or_default(payload.tag),
            match_labels: kind == ResourceKind::Pvc && payload.match_labels.unwrap_or(false),
            path,
        };

        self.check_identifiers(&request)?;
        Ok(request)
    }

    /// Validate query parameters of a read or delete
    pub fn validate_lookup(
        &self,
        kind: ResourceKind,
        query: VolumeQuery,
    ) -> ValidationResult<VolumeRequest> {
        let tenant = required(query.tenant).ok_or(Error::MissingTenant)?;
        let username = required(query.username).ok_or(Error::MissingUsername)?;

        let request = VolumeRequest::new(kind, tenant, username).with_tag(tag_or_default(query.tag));

        self.check_identifiers(&request)?;
        Ok(request)
    }

    fn check_identifiers(&self, request: &VolumeRequest) -> ValidationResult<()> {
        if !self.strict_identifiers {
            return Ok(());
        }

        validate_segment("tenant", &request.tenant)?;
        validate_segment("username", &request.username)?;
        validate_segment("tag", &request.tag)?;

        if let Some(ref path) = request.path {
            validate_export_path(path)?;
        }

        Ok(())
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn tag_or_default(tag: Option<String>) -> String {
    required(tag).unwrap_or_else(|| DEFAULT_TAG.to_string())
}

/// Check that an identifier can be embedded in a resource name
pub fn validate_segment(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.len() > MAX_SEGMENT_LENGTH {
        return Err(Error::InvalidIdentifier {
            field,
            value: value.to_string(),
            reason: format!("longer than {} characters", MAX_SEGMENT_LENGTH),
        });
    }

    if !DNS_LABEL_REGEX.is_match(value) {
        return Err(Error::InvalidIdentifier {
            field,
            value: value.to_string(),
            reason: "must consist of lower case alphanumeric characters or '-'".to_string(),
        });
    }

    Ok(())
}

/// Reject export paths that climb out of the NFS prefix
pub fn validate_export_path(path: &str) -> ValidationResult<()> {
    if path.split('/').any(|component| component == "..") {
        return Err(Error::InvalidIdentifier {
            field: "path",
            value: path.to_string(),
            reason: "must not contain '..'".to_string(),
        });
    }

    Ok(())
}
