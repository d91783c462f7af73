//! Per-operation view of a resource's ID, prior state and attributes.

use crate::schema::{is_set, Attributes};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted state of one resource or data-source instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceState {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Working data handed to resource operations.
///
/// `prior` is the state recorded before the operation; `attrs` starts as
/// the planned configuration and ends as the new state.
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    id: String,
    prior: Attributes,
    attrs: Attributes,
}

impl ResourceData {
    pub fn new(id: impl Into<String>, prior: Attributes, attrs: Attributes) -> Self {
        Self { id: id.into(), prior, attrs }
    }

    /// A new instance built from configuration alone.
    pub fn from_config(config: Attributes) -> Self {
        Self::new(String::new(), Attributes::new(), config)
    }

    /// An existing instance, with configuration equal to its state.
    pub fn from_state(state: &ResourceState) -> Self {
        Self::new(state.id.clone(), state.attributes.clone(), state.attributes.clone())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key).filter(|v| !v.is_null())
    }

    /// The value, if it is set and not the zero value of its type.
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        let v = self.attrs.get(key);
        match v {
            Some(Value::Bool(false)) => None,
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
            _ if is_set(v) => v,
            _ => None,
        }
    }

    /// String value; empty when unset.
    pub fn get_str(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Set members, sorted and de-duplicated.
    pub fn get_string_set(&self, key: &str) -> Vec<String> {
        let mut items = self.get_string_list(key);
        items.sort();
        items.dedup();
        items
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        strings_of(self.get(key))
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    pub fn set_string_set<I, S>(&mut self, key: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
        items.sort();
        items.dedup();
        self.set(key, items);
    }

    pub fn remove(&mut self, key: &str) {
        self.attrs.remove(key);
    }

    pub fn has_change(&self, key: &str) -> bool {
        let (old, new) = self.get_change(key);
        old != new
    }

    /// Prior and planned value; unset and null compare equal.
    pub fn get_change(&self, key: &str) -> (Option<Value>, Option<Value>) {
        let old = self.prior.get(key).filter(|v| !v.is_null()).cloned();
        let new = self.get(key).cloned();
        (old, new)
    }

    /// Prior string-set value for `key`.
    pub fn prior_string_set(&self, key: &str) -> Vec<String> {
        let mut items = strings_of(self.prior.get(key));
        items.sort();
        items.dedup();
        items
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    pub fn into_state(self) -> ResourceState {
        ResourceState { id: self.id, attributes: self.attrs }
    }
}

fn strings_of(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(v: Value) -> Attributes {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn get_ok_skips_zero_values() {
        let d = ResourceData::from_config(attrs(json!({
            "name": "",
            "port": 0,
            "enabled": false,
            "servers": [],
            "iscsi_name": "iqn.1998-01.com.vmware:esxi-01"
        })));
        assert!(d.get_ok("name").is_none());
        assert!(d.get_ok("port").is_none());
        assert!(d.get_ok("enabled").is_none());
        assert!(d.get_ok("servers").is_none());
        assert!(d.get_ok("missing").is_none());
        assert_eq!(d.get_ok("iscsi_name").and_then(Value::as_str), Some("iqn.1998-01.com.vmware:esxi-01"));
    }

    #[test]
    fn change_tracking() {
        let prior = attrs(json!({"name": "nfs-01", "folder": "ds"}));
        let planned = attrs(json!({"name": "nfs-02", "folder": "ds", "extra": null}));
        let d = ResourceData::new("datastore-1", prior, planned);
        assert!(d.has_change("name"));
        assert!(!d.has_change("folder"));
        assert!(!d.has_change("extra"));
        assert_eq!(d.get_change("name"), (Some(json!("nfs-01")), Some(json!("nfs-02"))));
    }

    #[test]
    fn string_sets_are_sorted() {
        let mut d = ResourceData::default();
        d.set_string_set("servers", ["10.0.0.2", "10.0.0.1", "10.0.0.2"]);
        assert_eq!(d.get_string_set("servers"), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(d.get_str("missing"), "");
    }

    #[test]
    fn into_state_carries_id() {
        let mut d = ResourceData::default();
        d.set_id("tf-vcenter-dns");
        d.set("servers", vec!["10.0.0.1"]);
        let state = d.into_state();
        assert_eq!(state.id, "tf-vcenter-dns");
        assert_eq!(state.attributes["servers"], json!(["10.0.0.1"]));
    }
}
