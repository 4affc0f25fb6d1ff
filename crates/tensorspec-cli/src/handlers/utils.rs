//! Shared utilities for command handlers

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Whether the path names a YAML document
pub fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("yaml") | Some("yml"))
}

/// Read a JSON or YAML document into an untyped value
pub fn load_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "read document");

    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_yaml_and_json() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("spec.yml");
        fs::write(&yaml, "driver: array\ndtype: uint8\narray: [1, 2]\n").unwrap();
        assert_eq!(
            load_document(&yaml).unwrap(),
            json!({"driver": "array", "dtype": "uint8", "array": [1, 2]})
        );

        let json_path = dir.path().join("spec.json");
        fs::write(&json_path, r#"[{"driver": "auto"}]"#).unwrap();
        assert!(load_document(&json_path).unwrap().is_array());
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = load_document(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(missing.exit_code(), 3);

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{driver").unwrap();
        assert_eq!(load_document(&broken).unwrap_err().exit_code(), 4);
    }
}
