//! Attribute metadata and configuration validation.
//!
//! A schema is only as rich as resource logic needs: value types, the
//! required / optional / computed split, defaults, replacement-forcing
//! attributes and the `exactly_one_of` / `conflicts_with` constraints.

use crate::error::{ProviderError, ProviderResult};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Attribute map as stored in state and passed as configuration.
pub type Attributes = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Bool,
    Int,
    /// Unordered, de-duplicated strings
    StringSet,
    /// Ordered strings
    StringList,
}

impl ValueType {
    fn accepts(self, v: &Value) -> bool {
        match self {
            Self::String => v.is_string(),
            Self::Bool => v.is_boolean(),
            Self::Int => v.is_i64() || v.is_u64(),
            Self::StringSet | Self::StringList => v
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
        }
    }
}

/// Metadata for a single attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub value_type: ValueType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: &'static str,
    pub exactly_one_of: Vec<&'static str>,
    pub conflicts_with: Vec<&'static str>,
    /// Normalises string values before they reach state
    pub state_func: Option<fn(&str) -> String>,
}

impl Attribute {
    fn base(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            description: "",
            exactly_one_of: Vec::new(),
            conflicts_with: Vec::new(),
            state_func: None,
        }
    }

    pub fn required(value_type: ValueType) -> Self {
        Self { required: true, ..Self::base(value_type) }
    }

    pub fn optional(value_type: ValueType) -> Self {
        Self { optional: true, ..Self::base(value_type) }
    }

    pub fn computed(value_type: ValueType) -> Self {
        Self { computed: true, ..Self::base(value_type) }
    }

    /// Optional in configuration, filled in from the endpoint when unset.
    pub fn with_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, v: impl Into<Value>) -> Self {
        self.default = Some(v.into());
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn exactly_one_of(mut self, others: &[&'static str]) -> Self {
        self.exactly_one_of = others.to_vec();
        self
    }

    pub fn conflicts_with(mut self, others: &[&'static str]) -> Self {
        self.conflicts_with = others.to_vec();
        self
    }

    pub fn state_func(mut self, f: fn(&str) -> String) -> Self {
        self.state_func = Some(f);
        self
    }

    fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

/// Whether a configuration value counts as set.
pub fn is_set(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

/// The full attribute set of a resource or data source.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    /// Add every attribute of `other`, replacing duplicates.
    pub fn merge(mut self, other: Schema) -> Self {
        self.attributes.extend(other.attributes);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (*k, v))
    }

    /// Check configuration against the schema, reporting every problem.
    pub fn validate(&self, config: &Attributes) -> ProviderResult<()> {
        let mut problems = Vec::new();
        let mut conflicts = BTreeSet::new();

        for (key, value) in config {
            let Some(attr) = self.attributes.get(key.as_str()) else {
                problems.push(format!("unsupported argument '{key}'"));
                continue;
            };
            if value.is_null() {
                continue;
            }
            if attr.is_computed_only() {
                problems.push(format!("'{key}' is computed and cannot be set"));
            } else if !attr.value_type.accepts(value) {
                problems.push(format!("'{key}' must be of type {:?}", attr.value_type));
            }
        }

        for (name, attr) in &self.attributes {
            let value = config.get(*name);

            if attr.required && attr.default.is_none() && value.map_or(true, Value::is_null) {
                problems.push(format!("the argument '{name}' is required, but no definition was found"));
            }

            if !attr.exactly_one_of.is_empty() {
                let mut group: Vec<&str> = vec![*name];
                group.extend(attr.exactly_one_of.iter().copied());
                let set = group.iter().filter(|k| is_set(config.get(**k))).count();
                let listed = group.join(",");
                if set == 0 {
                    problems.push(format!("one of `{listed}` must be specified"));
                } else if set > 1 {
                    problems.push(format!("only one of `{listed}` can be specified"));
                }
            }

            if is_set(value) {
                for other in &attr.conflicts_with {
                    if is_set(config.get(*other)) {
                        let pair = if name < other { (*name, *other) } else { (*other, *name) };
                        conflicts.insert(pair);
                    }
                }
            }
        }
        for (a, b) in conflicts {
            problems.push(format!("'{a}' conflicts with '{b}'"));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::validation(problems.join("; ")))
        }
    }

    /// Fill unset attributes that carry a default.
    pub fn apply_defaults(&self, config: &mut Attributes) {
        for (name, attr) in &self.attributes {
            if let Some(default) = &attr.default {
                if config.get(*name).map_or(true, Value::is_null) {
                    config.insert(name.to_string(), default.clone());
                }
            }
        }
    }

    /// Sort and de-duplicate sets, run state functions, drop nulls.
    pub fn normalize(&self, config: &mut Attributes) {
        config.retain(|_, v| !v.is_null());
        for (name, attr) in &self.attributes {
            let Some(value) = config.get_mut(*name) else { continue };
            match (attr.value_type, value) {
                (ValueType::StringSet, Value::Array(items)) => {
                    items.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
                    items.dedup();
                }
                (ValueType::String, Value::String(s)) => {
                    if let Some(f) = attr.state_func {
                        *s = f(s);
                    }
                }
                _ => {}
            }
        }
    }

    /// `force_new` attributes whose planned value differs from state.
    ///
    /// An unset optional+computed attribute keeps its state value and does
    /// not count as a change.
    pub fn requires_replacement(&self, prior: &Attributes, planned: &Attributes) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .filter(|(name, attr)| {
                let old = prior.get(**name).filter(|v| !v.is_null());
                let new = planned.get(**name).filter(|v| !v.is_null());
                if new.is_none() && attr.computed {
                    return false;
                }
                old != new
            })
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Attributes that only the endpoint fills in.
    pub fn computed_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes.iter().filter(|(_, a)| a.computed).map(|(k, _)| *k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .attr(
                "host_system_id",
                Attribute::optional(ValueType::String).force_new().exactly_one_of(&["hostname"]),
            )
            .attr("hostname", Attribute::optional(ValueType::String).force_new())
            .attr("servers", Attribute::optional(ValueType::StringSet))
            .attr("level", Attribute::optional(ValueType::String).default_value("info"))
            .attr("folder", Attribute::optional(ValueType::String).conflicts_with(&["cluster"]))
            .attr("cluster", Attribute::optional(ValueType::String).conflicts_with(&["folder"]))
            .attr("adapter_id", Attribute::computed(ValueType::String))
            .attr("iscsi_name", Attribute::optional(ValueType::String).with_computed().force_new())
    }

    fn obj(v: Value) -> Attributes {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn accepts_minimal_config() {
        schema().validate(&obj(json!({"hostname": "esxi-01.lab"}))).unwrap();
    }

    #[test]
    fn exactly_one_of_rejects_none_and_both() {
        let err = schema().validate(&obj(json!({}))).unwrap_err();
        assert!(err.message.contains("one of `host_system_id,hostname` must be specified"));

        let err = schema()
            .validate(&obj(json!({"hostname": "a", "host_system_id": "host-1"})))
            .unwrap_err();
        assert!(err.message.contains("only one of"));
    }

    #[test]
    fn empty_string_does_not_count_as_set() {
        let err = schema().validate(&obj(json!({"hostname": ""}))).unwrap_err();
        assert!(err.message.contains("must be specified"));
    }

    #[test]
    fn rejects_unknown_computed_and_mistyped() {
        let err = schema()
            .validate(&obj(json!({
                "hostname": "a",
                "bogus": 1,
                "adapter_id": "vmhba65",
                "servers": "10.0.0.1"
            })))
            .unwrap_err();
        assert!(err.message.contains("unsupported argument 'bogus'"));
        assert!(err.message.contains("'adapter_id' is computed"));
        assert!(err.message.contains("'servers' must be of type StringSet"));
    }

    #[test]
    fn conflicts_reported_once() {
        let err = schema()
            .validate(&obj(json!({"hostname": "a", "folder": "f", "cluster": "group-p1"})))
            .unwrap_err();
        assert_eq!(err.message.matches("conflicts with").count(), 1);
    }

    #[test]
    fn required_attribute() {
        let s = Schema::new().attr("servers", Attribute::required(ValueType::StringSet));
        let err = s.validate(&Attributes::new()).unwrap_err();
        assert!(err.message.contains("'servers' is required"));
    }

    #[test]
    fn defaults_and_normalisation() {
        let s = schema().attr(
            "folder",
            Attribute::optional(ValueType::String).state_func(|p| p.trim_matches('/').to_string()),
        );
        let mut cfg = obj(json!({"servers": ["b", "a", "b"], "folder": "/dc/ds/", "hostname": null}));
        s.apply_defaults(&mut cfg);
        s.normalize(&mut cfg);
        assert_eq!(cfg["servers"], json!(["a", "b"]));
        assert_eq!(cfg["level"], "info");
        assert_eq!(cfg["folder"], "dc/ds");
        assert!(!cfg.contains_key("hostname"));
    }

    #[test]
    fn replacement_detection() {
        let prior = obj(json!({"hostname": "a", "iscsi_name": "iqn.1998-01.com.vmware:a", "servers": ["x"]}));
        let same = obj(json!({"hostname": "a", "servers": ["y"]}));
        assert!(schema().requires_replacement(&prior, &same).is_empty());

        let moved = obj(json!({"hostname": "b"}));
        assert_eq!(schema().requires_replacement(&prior, &moved), vec!["hostname".to_string()]);

        let switched = obj(json!({"host_system_id": "host-1"}));
        let changed = schema().requires_replacement(&prior, &switched);
        assert_eq!(changed, vec!["host_system_id".to_string(), "hostname".to_string()]);
    }
}
