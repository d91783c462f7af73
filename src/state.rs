//! JSON state files.
//!
//! One file holds one resource: its type, ID and attributes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tpv_provider::ResourceState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateFile {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(flatten)]
    pub state: ResourceState,
}

impl StateFile {
    pub fn new(resource_type: impl Into<String>, state: ResourceState) -> Self {
        Self { resource_type: resource_type.into(), state }
    }
}

/// Load a state file; a missing file means no prior state.
pub fn load(path: &Path) -> Result<Option<StateFile>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read state '{}': {e}", path.display()))?;
    let file = serde_json::from_str(&raw)
        .map_err(|e| format!("state '{}' is not valid: {e}", path.display()))?;
    Ok(Some(file))
}

/// Load a state file that must exist and belong to `resource_type`.
pub fn load_existing(path: &Path, resource_type: &str) -> Result<StateFile, String> {
    let file = load(path)?.ok_or_else(|| format!("no state at '{}'", path.display()))?;
    check_type(&file, resource_type)?;
    Ok(file)
}

pub fn check_type(file: &StateFile, resource_type: &str) -> Result<(), String> {
    if file.resource_type != resource_type {
        return Err(format!(
            "state holds a {} but {resource_type} was requested",
            file.resource_type
        ));
    }
    Ok(())
}

pub fn save(path: &Path, file: &StateFile) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(file).map_err(|e| e.to_string())?;
    std::fs::write(path, raw).map_err(|e| format!("cannot write state '{}': {e}", path.display()))
}

pub fn remove(path: &Path) -> Result<(), String> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("cannot remove state '{}': {e}", path.display())),
    }
}

/// Read a JSON document (resource configuration or data-source arguments).
pub fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("'{}' is not valid JSON: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dns.json");
        assert!(load(&path).unwrap().is_none());

        let attrs = json!({"servers": ["10.0.0.1"]}).as_object().cloned().unwrap();
        let file = StateFile::new("vsphere_vcenter_dns", ResourceState { id: "tf-vcenter-dns".into(), attributes: attrs });
        save(&path, &file).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["type"], "vsphere_vcenter_dns");
        assert_eq!(raw["id"], "tf-vcenter-dns");

        assert_eq!(load_existing(&path, "vsphere_vcenter_dns").unwrap(), file);
        let err = load_existing(&path, "vsphere_nas_datastore").unwrap_err();
        assert!(err.contains("state holds a vsphere_vcenter_dns"));

        remove(&path).unwrap();
        remove(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn missing_state_is_an_error_when_required() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_existing(&dir.path().join("none.json"), "vsphere_vcenter_dns").unwrap_err();
        assert!(err.starts_with("no state at"));
    }

    #[test]
    fn rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(read_json(&path).unwrap_err().contains("is not valid JSON"));
        assert!(load(&path).unwrap_err().contains("is not valid"));
    }
}
