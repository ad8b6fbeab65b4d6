///! Request payloads accepted by the volume endpoints

use serde::{Deserialize, Serialize};

use crate::{ResourceKind, DEFAULT_TAG};

/// Body of `POST /pvs` and `POST /pvcs`
///
/// Every field is optional on the wire so that missing fields surface as
/// validation errors rather than deserialization failures. Unknown fields are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateVolumeRequest {
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default, rename = "match")]
    pub match_labels: Option<bool>,
}

/// Query string of `GET` and `DELETE` on `/pvs` and `/pvcs`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeQuery {
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

/// A validated, normalized request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRequest {
    pub kind: ResourceKind,
    pub tenant: String,
    pub username: String,
    pub tag: String,
    /// Bind the claim by label selector (PVC creation only)
    pub match_labels: bool,
    /// Export path below the NFS prefix (PV creation only)
    pub path: Option<String>,
}

impl VolumeRequest {
    pub fn new(kind: ResourceKind, tenant: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            kind,
            tenant: tenant.into(),
            username: username.into(),
            tag: DEFAULT_TAG.to_string(),
            match_labels: false,
            path: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_match(mut self, match_labels: bool) -> Self {
        self.match_labels = match_labels;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_match_keyword() {
        let req: CreateVolumeRequest = serde_json::from_str(
            r#"{"tenant": "acme", "username": "alice", "match": true, "extra": 1}"#,
        )
        .unwrap();
        assert_eq!(req.tenant.as_deref(), Some("acme"));
        assert_eq!(req.match_labels, Some(true));
        assert!(req.path.is_none());
    }

    #[test]
    fn test_builder_defaults() {
        let req = VolumeRequest::new(ResourceKind::Pvc, "acme", "alice");
        assert_eq!(req.tag, "default");
        assert!(!req.match_labels);
        assert!(req.path.is_none());
    }
}
