//! GNOME source cache manifests (`cache.json`)
//!
//! The manifest is a JSON array whose element 1 maps project → version →
//! format → relative path, and whose element 2 maps project → ordered
//! version list.

use serde_json::Value;
use xsdeps_errors::ResolveError;

/// Relative path of the newest `tar.xz` source of `project`
///
/// # Errors
///
/// Returns `ResolveError::MalformedManifest` naming the first missing piece.
pub fn latest_tar_xz(manifest: &Value, project: &str, url: &str) -> Result<String, ResolveError> {
    let missing = |what: String| ResolveError::MalformedManifest {
        url: url.to_string(),
        missing: what,
    };

    let latest = manifest
        .get(2)
        .and_then(|versions| versions.get(project))
        .and_then(Value::as_array)
        .and_then(|list| list.last())
        .and_then(Value::as_str)
        .ok_or_else(|| missing(format!("version list for {project}")))?;

    manifest
        .get(1)
        .and_then(|sources| sources.get(project))
        .and_then(|versions| versions.get(latest))
        .and_then(|formats| formats.get("tar.xz"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(format!("tar.xz source for {project} {latest}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_listed_version_wins() {
        let manifest = json!([
            4,
            {"libxml2": {
                "2.13.8": {"tar.xz": "2.13/libxml2-2.13.8.tar.xz"},
                "2.14.6": {"tar.xz": "2.14/libxml2-2.14.6.tar.xz"}
            }},
            {"libxml2": ["2.13.8", "2.14.6"]},
            []
        ]);
        assert_eq!(
            latest_tar_xz(&manifest, "libxml2", "u").unwrap(),
            "2.14/libxml2-2.14.6.tar.xz"
        );
    }

    #[test]
    fn test_missing_pieces_are_named() {
        let manifest = json!([4, {"libxslt": {}}, {"libxslt": ["1.1.43"]}]);
        let err = latest_tar_xz(&manifest, "libxslt", "u").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MalformedManifest { ref missing, .. } if missing.contains("1.1.43")
        ));

        let err = latest_tar_xz(&json!({}), "libxslt", "u").unwrap_err();
        assert!(matches!(err, ResolveError::MalformedManifest { .. }));
    }
}
