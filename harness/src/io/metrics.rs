//! Per-run metrics document: validated read-modify-write.
//!
//! All updates are validated and merged into an in-memory copy first; the
//! document on disk is rewritten exactly once, and only when every update was
//! accepted.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::vocabulary::FailureVocabulary;
use crate::error::MetricsError;

/// Non-fatal events observed while applying updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsWarning {
    /// The update introduced a key the document did not have.
    InsertedField { key: String },
}

impl fmt::Display for MetricsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsWarning::InsertedField { key } => {
                write!(f, "key '{key}' not found in metrics; adding it")
            }
        }
    }
}

/// Result of a successful [`apply_updates`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsUpdate {
    /// The merged document as written to disk.
    pub document: Map<String, Value>,
    pub warnings: Vec<MetricsWarning>,
}

/// Load a metrics document, requiring a top-level JSON object.
pub fn load_document(path: &Path) -> Result<Map<String, Value>, MetricsError> {
    debug!(path = %path.display(), "loading metrics document");
    let contents = fs::read(path).map_err(|source| MetricsError::DocumentAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_slice(&contents).map_err(|err| MetricsError::MalformedDocument {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    match value {
        Value::Object(document) => Ok(document),
        other => Err(MetricsError::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object, got {}", json_type(&other)),
        }),
    }
}

/// Validate `updates` against `vocabulary`, merge them in caller order, and
/// rewrite the document.
///
/// On any validation failure the file is left untouched.
pub fn apply_updates(
    path: &Path,
    updates: &Map<String, Value>,
    vocabulary: &FailureVocabulary,
) -> Result<MetricsUpdate, MetricsError> {
    let mut document = load_document(path)?;
    let mut warnings = Vec::new();

    for (key, value) in updates {
        vocabulary.check_update(key, value)?;
        if document.insert(key.clone(), value.clone()).is_none() {
            debug!(key = %key, "inserting new metrics field");
            warnings.push(MetricsWarning::InsertedField { key: key.clone() });
        }
    }

    write_document(path, &document)?;
    debug!(
        path = %path.display(),
        updated = updates.len(),
        inserted = warnings.len(),
        "metrics document written"
    );
    Ok(MetricsUpdate { document, warnings })
}

/// Atomically write a document (temp file + rename) with 4-space indentation.
///
/// Symlinks are resolved first so the link target is replaced, not the link.
/// An existing read-only document is refused. Non-ASCII text is written as-is;
/// key order is preserved.
pub fn write_document(path: &Path, document: &Map<String, Value>) -> Result<(), MetricsError> {
    let access = |source: io::Error| MetricsError::DocumentAccess {
        path: path.to_path_buf(),
        source,
    };

    let (target, permissions) = match fs::canonicalize(path) {
        Ok(target) => {
            let permissions = fs::metadata(&target).map_err(access)?.permissions();
            if permissions.readonly() {
                return Err(access(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "document is read-only",
                )));
            }
            (target, Some(permissions))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => (path.to_path_buf(), None),
        Err(err) => return Err(access(err)),
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|err| access(err.into()))?;

    let tmp_path = target.with_extension("json.tmp");
    fs::write(&tmp_path, &buf).map_err(access)?;
    let replaced = match permissions {
        Some(permissions) => fs::set_permissions(&tmp_path, permissions),
        None => Ok(()),
    }
    .and_then(|()| fs::rename(&tmp_path, &target));
    if let Err(err) = replaced {
        let _ = fs::remove_file(&tmp_path);
        return Err(access(err));
    }
    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{metrics_fixture, updates};
    use serde_json::json;

    #[test]
    fn primary_failure_update_persists() {
        let (_temp, path) = metrics_fixture(&json!({"success": false, "primary_failure": null}));

        let result = apply_updates(
            &path,
            &updates(json!({"primary_failure": "captcha"})),
            &FailureVocabulary::default(),
        )
        .expect("apply");

        assert_eq!(result.document["primary_failure"], json!("captcha"));
        assert!(result.warnings.is_empty());
        let reloaded = load_document(&path).expect("reload");
        assert_eq!(reloaded, result.document);
    }

    /// A rejected update must not touch the file at all.
    #[test]
    fn invalid_primary_leaves_file_byte_identical() {
        let (_temp, path) = metrics_fixture(&json!({"success": false, "note": "café"}));
        let before = fs::read(&path).expect("read before");

        let err = apply_updates(
            &path,
            &updates(json!({"primary_failure": "not_a_real_reason"})),
            &FailureVocabulary::default(),
        )
        .expect_err("must be rejected");

        assert!(err.to_string().contains("\"not_a_real_reason\""));
        assert_eq!(fs::read(&path).expect("read after"), before);
    }

    /// Validation failure on a later key discards earlier accepted keys too.
    #[test]
    fn batch_is_all_or_nothing() {
        let (_temp, path) = metrics_fixture(&json!({"primary_failure": "interrupted"}));
        let before = fs::read(&path).expect("read before");

        let err = apply_updates(
            &path,
            &updates(json!({
                "primary_failure": "captcha",
                "secondary_failure": ["captcha", "bogus"]
            })),
            &FailureVocabulary::default(),
        )
        .expect_err("must be rejected");

        match err {
            MetricsError::InvalidFailureReason { field, invalid, .. } => {
                assert_eq!(field, "secondary_failure");
                assert_eq!(invalid, vec!["\"bogus\"".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read(&path).expect("read after"), before);
    }

    #[test]
    fn inserted_keys_are_reported_as_warnings() {
        let (_temp, path) = metrics_fixture(&json!({"success": true}));

        let result = apply_updates(
            &path,
            &updates(json!({"success": false, "secondary_failure": null, "notes": "x"})),
            &FailureVocabulary::default(),
        )
        .expect("apply");

        assert_eq!(
            result.warnings,
            vec![
                MetricsWarning::InsertedField {
                    key: "secondary_failure".to_string()
                },
                MetricsWarning::InsertedField {
                    key: "notes".to_string()
                },
            ]
        );
        assert_eq!(
            result.warnings[1].to_string(),
            "key 'notes' not found in metrics; adding it"
        );
    }

    /// Untouched fields, their order, and non-ASCII text survive a rewrite.
    #[test]
    fn rewrite_preserves_untouched_fields_and_formatting() {
        let (_temp, path) = metrics_fixture(&json!({
            "query": "Look for a studio apartment under £700",
            "steps": 12,
            "ratio": 0.5,
            "urls": ["https://example.com/ä"],
            "primary_failure": null
        }));

        apply_updates(
            &path,
            &updates(json!({"primary_failure": "limit_reached"})),
            &FailureVocabulary::default(),
        )
        .expect("apply");

        let contents = fs::read_to_string(&path).expect("read");
        let expected = "{\n    \"query\": \"Look for a studio apartment under £700\",\n    \"steps\": 12,\n    \"ratio\": 0.5,\n    \"urls\": [\n        \"https://example.com/ä\"\n    ],\n    \"primary_failure\": \"limit_reached\"\n}";
        assert_eq!(contents, expected);
    }

    #[test]
    fn non_object_document_is_malformed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("metrics.json");
        fs::write(&path, "[1, 2]").expect("write");

        let err = load_document(&path).expect_err("array is not a document");
        assert!(matches!(err, MetricsError::MalformedDocument { .. }));
        assert!(err.to_string().contains("expected a JSON object, got array"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("metrics.json");
        fs::write(&path, "{not json").expect("write");

        let err = apply_updates(&path, &Map::new(), &FailureVocabulary::default())
            .expect_err("must fail");
        assert!(matches!(err, MetricsError::MalformedDocument { .. }));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("metrics.json");
        fs::write(&path, b"{\"note\": \"\xff\"}").expect("write");

        let err = apply_updates(
            &path,
            &updates(json!({"primary_failure": "captcha"})),
            &FailureVocabulary::default(),
        )
        .expect_err("must fail");
        assert!(matches!(err, MetricsError::MalformedDocument { .. }));
    }

    /// Writing through a symlink replaces the target and keeps the link.
    #[cfg(unix)]
    #[test]
    fn update_through_symlink_keeps_link() {
        let (temp, real) = metrics_fixture(&json!({"primary_failure": null}));
        let link = temp.path().join("latest.json");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");

        apply_updates(
            &link,
            &updates(json!({"primary_failure": "captcha"})),
            &FailureVocabulary::default(),
        )
        .expect("apply");

        let meta = fs::symlink_metadata(&link).expect("link metadata");
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            load_document(&real).expect("reload")["primary_failure"],
            json!("captcha")
        );
        assert!(!temp.path().join("latest.json.tmp").exists());
    }

    #[test]
    fn read_only_document_is_not_replaced() {
        let (_temp, path) = metrics_fixture(&json!({"primary_failure": null}));
        let mut permissions = fs::metadata(&path).expect("metadata").permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).expect("set read-only");
        let before = fs::read(&path).expect("read before");

        let err = apply_updates(
            &path,
            &updates(json!({"primary_failure": "captcha"})),
            &FailureVocabulary::default(),
        )
        .expect_err("must fail");

        match err {
            MetricsError::DocumentAccess { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read(&path).expect("read after"), before);
    }

    /// A failed rename leaves no temp file behind.
    #[test]
    fn failed_replace_removes_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("metrics.json");
        fs::create_dir(&path).expect("dir in place of document");
        fs::write(path.join("keep"), "x").expect("populate dir");

        let err = write_document(&path, &Map::new()).expect_err("must fail");
        assert!(matches!(err, MetricsError::DocumentAccess { .. }));
        assert!(!temp.path().join("metrics.json.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn missing_document_is_access_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("missing.json");

        let err = apply_updates(&path, &Map::new(), &FailureVocabulary::default())
            .expect_err("must fail");
        assert!(matches!(err, MetricsError::DocumentAccess { .. }));
        assert!(!path.exists());
    }
}
