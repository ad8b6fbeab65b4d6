//! Manifest synthesis
//!
//! Fills a tenant's template with the names, namespace, labels and NFS
//! location derived for a request. Templates are never modified in place: each
//! synthesis works on its own deep copy.

use serde::Serialize;
use serde_json::{Map, Value};
use volume_common::{Error, Result, TemplateKind, VolumeRequest};

use super::naming::{pv_label, resource_name, storage_path, PV_LABEL_KEY};
use crate::config::NfsConfig;
use crate::tenant::TenantRecord;

/// A fully substituted resource body, ready to submit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Manifest(Value);

impl Manifest {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// String at a JSON pointer such as `/metadata/name`
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.0.pointer(pointer).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_at("/metadata/name")
    }

    pub fn namespace(&self) -> Option<&str> {
        self.str_at("/metadata/namespace")
    }
}

/// Builds manifests from tenant templates
#[derive(Debug, Clone)]
pub struct ManifestSynthesizer {
    nfs_server: String,
    nfs_prefix: String,
}

impl ManifestSynthesizer {
    pub fn new(nfs: &NfsConfig) -> Self {
        Self {
            nfs_server: nfs.server.clone(),
            nfs_prefix: nfs.prefix.clone(),
        }
    }

    /// Produce the manifest for a validated creation request
    pub fn synthesize(&self, request: &VolumeRequest, tenant: &TenantRecord) -> Result<Manifest> {
        let template_kind = request.kind.template_kind(request.match_labels);
        let template = tenant
            .templates()
            .get(template_kind)
            .ok_or(Error::TemplateMissing(template_kind))?;

        if !template.is_object() {
            return Err(Error::InvalidTemplate(format!(
                "template '{}' is not an object",
                template_kind
            )));
        }

        let mut body = template.clone();
        replace_markers(
            &mut body,
            &[
                ("{tenant}", request.tenant.as_str()),
                ("{username}", request.username.as_str()),
                ("{tag}", request.tag.as_str()),
                ("{namespace}", tenant.namespace.as_str()),
            ],
        );

        insert_if_absent(&mut body, "apiVersion", "v1")?;
        insert_if_absent(&mut body, "kind", request.kind.k8s_kind())?;

        let name = resource_name(request.kind, &request.tenant, &request.username, &request.tag);
        let label = pv_label(&request.tenant, &request.username, &request.tag);

        set_str(&mut body, &["metadata", "name"], &name)?;
        set_str(&mut body, &["metadata", "namespace"], &tenant.namespace)?;

        match template_kind {
            TemplateKind::Pv => {
                let path = request.path.as_deref().ok_or(Error::MissingPath)?;
                set_str(&mut body, &["metadata", "labels", PV_LABEL_KEY], &label)?;
                set_str(&mut body, &["spec", "nfs", "server"], &self.nfs_server)?;
                set_str(
                    &mut body,
                    &["spec", "nfs", "path"],
                    &storage_path(&self.nfs_prefix, path),
                )?;
            }
            TemplateKind::MatchPvc => {
                set_str(
                    &mut body,
                    &["spec", "selector", "matchLabels", PV_LABEL_KEY],
                    &label,
                )?;
            }
            TemplateKind::Pvc => {}
        }

        tracing::debug!(kind = %request.kind, name = %name, "Synthesized manifest");

        Ok(Manifest(body))
    }
}

/// Replace named markers in every string value of the document
fn replace_markers(value: &mut Value, markers: &[(&str, &str)]) {
    match value {
        Value::String(s) => {
            if s.contains('{') {
                *s = substitute(s, markers);
            }
        }
        Value::Array(items) => {
            for item in items {
                replace_markers(item, markers);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                replace_markers(item, markers);
            }
        }
        _ => {}
    }
}

/// Single left-to-right pass; replacement text is never rescanned
fn substitute(input: &str, markers: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    'scan: while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let tail = &rest[start..];

        for (marker, replacement) in markers {
            if let Some(after) = tail.strip_prefix(marker) {
                output.push_str(replacement);
                rest = after;
                continue 'scan;
            }
        }

        output.push('{');
        rest = &tail[1..];
    }

    output.push_str(rest);
    output
}

fn insert_if_absent(body: &mut Value, key: &str, value: &str) -> Result<()> {
    let map = as_object(body, key)?;
    map.entry(key.to_string())
        .or_insert_with(|| Value::String(value.to_string()));
    Ok(())
}

/// Set a string at `path`, creating intermediate objects as needed
fn set_str(body: &mut Value, path: &[&str], value: &str) -> Result<()> {
    let (last, parents) = path
        .split_last()
        .ok_or_else(|| Error::System("empty manifest path".to_string()))?;

    let mut current = body;
    for (depth, key) in parents.iter().enumerate() {
        let map = as_object(current, &path[..depth].join("."))?;
        let child = map
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if child.is_null() {
            *child = Value::Object(Map::new());
        }
        current = child;
    }

    as_object(current, &parents.join("."))?
        .insert(last.to_string(), Value::String(value.to_string()));
    Ok(())
}

fn as_object<'a>(value: &'a mut Value, location: &str) -> Result<&'a mut Map<String, Value>> {
    value.as_object_mut().ok_or_else(|| {
        let location = if location.is_empty() { "<root>" } else { location };
        Error::InvalidTemplate(format!("'{}' is not an object", location))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::{TemplateSet, TenantResources};
    use serde_json::json;
    use volume_common::ResourceKind;

    fn nfs() -> NfsConfig {
        NfsConfig {
            server: "10.0.0.5".to_string(),
            prefix: "/exports".to_string(),
        }
    }

    fn tenant(templates: TemplateSet) -> TenantRecord {
        TenantRecord {
            namespace: "acme-ns".to_string(),
            resources: TenantResources { templates },
        }
    }

    fn full_templates() -> TemplateSet {
        TemplateSet {
            pv: Some(json!({
                "apiVersion": "v1",
                "kind": "PersistentVolume",
                "metadata": {"name": "pv-{}-{}-{}", "labels": {"pv": "{}-{}-{}"}},
                "spec": {
                    "capacity": {"storage": "10Gi"},
                    "accessModes": ["ReadWriteMany"],
                    "nfs": {"server": "{}", "path": "{}/{}"}
                }
            })),
            pvc: Some(json!({
                "apiVersion": "v1",
                "kind": "PersistentVolumeClaim",
                "metadata": {"name": "pvc-{}-{}-{}"},
                "spec": {"accessModes": ["ReadWriteMany"], "resources": {"requests": {"storage": "10Gi"}}}
            })),
            match_pvc: Some(json!({
                "metadata": {"name": "pvc-{}-{}-{}", "annotations": {"owner": "{username}@{tenant}"}},
                "spec": {"selector": {"matchLabels": {"pv": "{}-{}-{}"}}}
            })),
        }
    }

    #[test]
    fn test_pv_manifest() {
        let request = VolumeRequest::new(ResourceKind::Pv, "acme", "alice").with_path("/data/alice");
        let manifest = ManifestSynthesizer::new(&nfs())
            .synthesize(&request, &tenant(full_templates()))
            .unwrap();

        assert_eq!(manifest.name(), Some("pv-acme-alice-default"));
        assert_eq!(manifest.namespace(), Some("acme-ns"));
        assert_eq!(manifest.str_at("/metadata/labels/pv"), Some("pv-acme-alice-default"));
        assert_eq!(manifest.str_at("/spec/nfs/server"), Some("10.0.0.5"));
        assert_eq!(manifest.str_at("/spec/nfs/path"), Some("/exports/data/alice"));
        assert_eq!(manifest.str_at("/spec/capacity/storage"), Some("10Gi"));
    }

    #[test]
    fn test_pvc_manifest() {
        let request = VolumeRequest::new(ResourceKind::Pvc, "acme", "alice").with_tag("scratch");
        let manifest = ManifestSynthesizer::new(&nfs())
            .synthesize(&request, &tenant(full_templates()))
            .unwrap();

        assert_eq!(manifest.name(), Some("pvc-acme-alice-scratch"));
        assert_eq!(manifest.namespace(), Some("acme-ns"));
        assert!(manifest.as_value().pointer("/spec/selector").is_none());
        assert!(manifest.as_value().pointer("/spec/nfs").is_none());
    }

    #[test]
    fn test_match_pvc_selects_pv_label() {
        let templates = tenant(full_templates());
        let synthesizer = ManifestSynthesizer::new(&nfs());

        let pv = synthesizer
            .synthesize(
                &VolumeRequest::new(ResourceKind::Pv, "acme", "alice").with_path("data"),
                &templates,
            )
            .unwrap();
        let claim = synthesizer
            .synthesize(
                &VolumeRequest::new(ResourceKind::Pvc, "acme", "alice").with_match(true),
                &templates,
            )
            .unwrap();

        assert_eq!(
            claim.str_at("/spec/selector/matchLabels/pv"),
            pv.str_at("/metadata/labels/pv")
        );
        assert_eq!(claim.str_at("/kind"), Some("PersistentVolumeClaim"));
        assert_eq!(claim.str_at("/apiVersion"), Some("v1"));
        assert_eq!(
            claim.str_at("/metadata/annotations/owner"),
            Some("alice@acme")
        );
    }

    #[test]
    fn test_missing_match_template() {
        let templates = TemplateSet {
            match_pvc: None,
            ..full_templates()
        };
        let request = VolumeRequest::new(ResourceKind::Pvc, "acme", "alice").with_match(true);
        let err = ManifestSynthesizer::new(&nfs())
            .synthesize(&request, &tenant(templates))
            .unwrap_err();

        assert!(matches!(err, Error::TemplateMissing(TemplateKind::MatchPvc)));
    }

    #[test]
    fn test_template_is_not_mutated() {
        let record = tenant(full_templates());
        let before = record.clone();
        let request = VolumeRequest::new(ResourceKind::Pv, "acme", "alice").with_path("data");

        ManifestSynthesizer::new(&nfs())
            .synthesize(&request, &record)
            .unwrap();

        assert_eq!(record, before);
    }

    #[test]
    fn test_missing_sections_are_created() {
        let templates = TemplateSet {
            pv: Some(json!({"spec": {"capacity": {"storage": "1Gi"}}})),
            ..Default::default()
        };
        let request = VolumeRequest::new(ResourceKind::Pv, "acme", "bob").with_path("bob");
        let manifest = ManifestSynthesizer::new(&nfs())
            .synthesize(&request, &tenant(templates))
            .unwrap();

        assert_eq!(manifest.name(), Some("pv-acme-bob-default"));
        assert_eq!(manifest.str_at("/spec/nfs/path"), Some("/exports/bob"));
        assert_eq!(manifest.str_at("/kind"), Some("PersistentVolume"));
    }

    #[test]
    fn test_marker_shaped_identifiers_are_kept_verbatim() {
        let templates = TemplateSet {
            pvc: Some(json!({
                "metadata": {"annotations": {
                    "owner": "{tenant}",
                    "user": "{username}/{tag}",
                    "raw": "{} and {unknown}"
                }}
            })),
            ..Default::default()
        };
        let request =
            VolumeRequest::new(ResourceKind::Pvc, "{username}", "alice").with_tag("{tenant}");
        let manifest = ManifestSynthesizer::new(&nfs())
            .synthesize(&request, &tenant(templates))
            .unwrap();

        assert_eq!(
            manifest.str_at("/metadata/annotations/owner"),
            Some("{username}")
        );
        assert_eq!(
            manifest.str_at("/metadata/annotations/user"),
            Some("alice/{tenant}")
        );
        assert_eq!(
            manifest.str_at("/metadata/annotations/raw"),
            Some("{} and {unknown}")
        );
        assert_eq!(manifest.name(), Some("pvc-{username}-alice-{tenant}"));
    }

    #[test]
    fn test_substitute_single_pass() {
        let markers = [("{tenant}", "{tag}"), ("{tag}", "v1")];
        assert_eq!(substitute("{tenant}-{tag}", &markers), "{tag}-v1");
        assert_eq!(substitute("{{tag}}", &markers), "{v1}");
        assert_eq!(substitute("plain", &markers), "plain");
        assert_eq!(substitute("trailing {", &markers), "trailing {");
    }

    #[test]
    fn test_malformed_template() {
        let templates = TemplateSet {
            pvc: Some(json!({"metadata": "pvc"})),
            ..Default::default()
        };
        let request = VolumeRequest::new(ResourceKind::Pvc, "acme", "alice");
        let err = ManifestSynthesizer::new(&nfs())
            .synthesize(&request, &tenant(templates))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate(_)));

        let templates = TemplateSet {
            pvc: Some(json!(["not", "an", "object"])),
            ..Default::default()
        };
        let err = ManifestSynthesizer::new(&nfs())
            .synthesize(&request, &tenant(templates))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate(_)));
    }
}
