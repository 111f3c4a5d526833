use std::collections::HashMap;

use serde_json::Value;

use crate::ResolvedPackage;

/// Decodes a registry version document into a `ResolvedPackage`. Returns
/// `None` for malformed JSON, registry-reported errors, or documents missing
/// a concrete version or tarball URL; callers never cache a `None`.
///
/// The returned package keeps the *requested* name, not whatever the
/// registry reports.
pub fn parse_package_metadata(name: &str, body: &str) -> Option<ResolvedPackage> {
    let doc: Value = match serde_json::from_str(body) {
        Ok(doc) => doc,
        Err(e) => {
            quill_logger::error(&format!("Failed to parse registry response for {name}: {e}"));
            return None;
        }
    };

    if let Some(registry_error) = doc.get("error").and_then(Value::as_str) {
        quill_logger::error(&format!("Registry error for {name}: {registry_error}"));
        return None;
    }

    let version = doc
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let tarball = doc["dist"]["tarball"].as_str().unwrap_or("").to_string();

    let dependencies: HashMap<String, String> = doc
        .get("dependencies")
        .and_then(Value::as_object)
        .map(|deps| {
            deps.iter()
                .filter_map(|(dep_name, requirement)| {
                    requirement
                        .as_str()
                        .map(|r| (dep_name.clone(), r.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    if version.is_empty() || tarball.is_empty() {
        quill_logger::error(&format!(
            "Incomplete metadata for {name}: version '{version}', tarball '{tarball}'"
        ));
        return None;
    }

    Some(ResolvedPackage {
        name: name.to_string(),
        version,
        tarball,
        dependencies,
    })
}
