//! Test-only helpers for metrics documents and run-log fixtures.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tempfile::TempDir;

use crate::io::metrics::write_document;

/// Write `document` as `metrics.json` inside a fresh temp dir.
///
/// The returned `TempDir` must be kept alive for the path to stay valid.
pub fn metrics_fixture(document: &Value) -> (TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("metrics.json");
    let map = document
        .as_object()
        .cloned()
        .expect("metrics fixture must be a JSON object");
    write_document(&path, &map).expect("write metrics fixture");
    (temp, path)
}

/// Convert a `json!({...})` literal into an ordered update map.
pub fn updates(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("updates must be a JSON object, got {other}"),
    }
}
