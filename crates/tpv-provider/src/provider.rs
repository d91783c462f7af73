//! Resource registry and lifecycle driver.
//!
//! The `Provider` owns one endpoint connection and dispatches plan/apply,
//! refresh, destroy, import and data-source reads to the registered types.

use crate::data_sources;
use crate::error::{ProviderError, ProviderResult};
use crate::resource::{DataSource, Resource};
use crate::resource_data::{ResourceData, ResourceState};
use crate::resources;
use crate::schema::{Attributes, Schema};

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tpv_vsphere::VsphereApi;

pub struct Provider {
    api: Arc<dyn VsphereApi>,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl Provider {
    /// A provider serving every built-in resource and data source.
    pub fn new(api: Arc<dyn VsphereApi>) -> Self {
        let resources = resources::all().into_iter().map(|r| (r.type_name(), r)).collect();
        let data_sources = data_sources::all().into_iter().map(|d| (d.type_name(), d)).collect();
        Self { api, resources, data_sources }
    }

    pub fn api(&self) -> &dyn VsphereApi {
        self.api.as_ref()
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn data_source_types(&self) -> Vec<&'static str> {
        self.data_sources.keys().copied().collect()
    }

    fn resource(&self, type_name: &str) -> ProviderResult<&dyn Resource> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::unknown_type(type_name))
    }

    fn data_source(&self, type_name: &str) -> ProviderResult<&dyn DataSource> {
        self.data_sources
            .get(type_name)
            .map(|d| d.as_ref())
            .ok_or_else(|| ProviderError::unknown_type(type_name))
    }

    /// Check a resource configuration without touching the endpoint.
    pub fn validate(&self, type_name: &str, config: &Value) -> ProviderResult<()> {
        let schema = self.resource(type_name)?.schema();
        plan(&schema, config).map(|_| ())
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Converge one resource toward `config`.
    ///
    /// No prior state means create. A changed `force_new` attribute means
    /// delete then create. Anything else is an in-place update.
    pub async fn apply(
        &self,
        type_name: &str,
        prior: Option<&ResourceState>,
        config: &Value,
    ) -> ProviderResult<ResourceState> {
        let resource = self.resource(type_name)?;
        let schema = resource.schema();
        let mut planned = plan(&schema, config)?;
        let api = self.api();

        let prior = match prior.filter(|p| !p.id.is_empty()) {
            Some(p) => p,
            None => return self.create(resource, planned).await,
        };

        let replace = schema.requires_replacement(&prior.attributes, &planned);
        if !replace.is_empty() {
            log::info!(
                "{type_name} {}: {} forces replacement",
                prior.id,
                replace.join(", ")
            );
            let mut old = ResourceData::from_state(prior);
            resource.delete(api, &mut old).await?;
            return self.create(resource, planned).await;
        }

        for key in schema.computed_keys() {
            if !planned.contains_key(key) {
                if let Some(v) = prior.attributes.get(key) {
                    planned.insert(key.to_string(), v.clone());
                }
            }
        }

        log::debug!("Updating {type_name} {}", prior.id);
        let mut d = ResourceData::new(prior.id.clone(), prior.attributes.clone(), planned);
        resource.update(api, &mut d).await?;
        Ok(d.into_state())
    }

    async fn create(&self, resource: &dyn Resource, planned: Attributes) -> ProviderResult<ResourceState> {
        log::debug!("Creating {}", resource.type_name());
        let mut d = ResourceData::from_config(planned);
        resource.create(self.api(), &mut d).await?;
        if d.id().is_empty() {
            return Err(ProviderError::not_found(format!(
                "{} was created but no ID was recorded",
                resource.type_name()
            )));
        }
        Ok(d.into_state())
    }

    /// Re-read a resource. `None` means it no longer exists.
    pub async fn refresh(&self, type_name: &str, state: &ResourceState) -> ProviderResult<Option<ResourceState>> {
        let resource = self.resource(type_name)?;
        let mut d = ResourceData::from_state(state);
        resource.read(self.api(), &mut d).await?;
        if d.id().is_empty() {
            log::warn!("{type_name} {} is gone, dropping it from state", state.id);
            return Ok(None);
        }
        Ok(Some(d.into_state()))
    }

    pub async fn destroy(&self, type_name: &str, state: &ResourceState) -> ProviderResult<()> {
        let resource = self.resource(type_name)?;
        let mut d = ResourceData::from_state(state);
        resource.delete(self.api(), &mut d).await?;
        log::info!("Destroyed {type_name} {}", state.id);
        Ok(())
    }

    /// Adopt an existing object by ID, then read its full state.
    pub async fn import(&self, type_name: &str, id: &str) -> ProviderResult<ResourceState> {
        let resource = self.resource(type_name)?;
        let mut d = ResourceData::new(id, Attributes::new(), Attributes::new());
        resource.import(self.api(), &mut d).await?;
        resource.read(self.api(), &mut d).await?;
        if d.id().is_empty() {
            return Err(ProviderError::not_found(format!(
                "cannot import non-existent {type_name} '{id}'"
            )));
        }
        Ok(d.into_state())
    }

    pub async fn read_data_source(&self, type_name: &str, config: &Value) -> ProviderResult<ResourceState> {
        let source = self.data_source(type_name)?;
        let planned = plan(&source.schema(), config)?;
        let mut d = ResourceData::from_config(planned);
        source.read(self.api(), &mut d).await?;
        Ok(d.into_state())
    }
}

/// Validate, default and normalize a raw configuration.
fn plan(schema: &Schema, config: &Value) -> ProviderResult<Attributes> {
    let mut attrs = match config {
        Value::Object(map) => map.clone(),
        Value::Null => Attributes::new(),
        other => {
            return Err(ProviderError::validation(format!(
                "configuration must be an object, got {other}"
            )))
        }
    };
    attrs.retain(|_, v| !v.is_null());
    schema.validate(&attrs)?;
    schema.apply_defaults(&mut attrs);
    schema.normalize(&mut attrs);
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use tpv_vsphere::SimulatedVsphere;

    fn lab() -> (Arc<SimulatedVsphere>, Provider, String) {
        let sim = Arc::new(SimulatedVsphere::vcenter());
        let dc = sim.add_datacenter("dc1");
        let id = sim.add_host(&dc, "esxi-01.lab").unwrap();
        let provider = Provider::new(sim.clone());
        (sim, provider, id)
    }

    #[test]
    fn registers_builtin_types() {
        let (_, provider, _) = lab();
        assert_eq!(
            provider.resource_types(),
            vec![
                "vsphere_host_config_snmp",
                "vsphere_host_config_syslog",
                "vsphere_iscsi_software_adapter",
                "vsphere_nas_datastore",
                "vsphere_vcenter_dns",
            ]
        );
        assert_eq!(
            provider.data_source_types(),
            vec![
                "vsphere_host_config_date_time",
                "vsphere_host_config_syslog",
                "vsphere_iscsi_software_adapter",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_type_is_rejected() {
        let (_, provider, _) = lab();
        let err = provider.apply("vsphere_nope", None, &json!({})).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::UnknownType);
        let err = provider.read_data_source("vsphere_nope", &json!({})).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::UnknownType);
    }

    #[tokio::test]
    async fn validation_runs_before_the_endpoint() {
        let (_, provider, id) = lab();
        let config = json!({"host_system_id": id, "hostname": "esxi-01.lab", "log_host": "x"});
        let err = provider.apply("vsphere_host_config_syslog", None, &config).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Validation);
        assert!(err.message.contains("only one of"));
        assert_err!(provider.validate("vsphere_host_config_syslog", &json!([1, 2])));
    }

    #[tokio::test]
    async fn update_in_place_keeps_id() {
        let (sim, provider, id) = lab();
        let config = json!({"host_system_id": id, "log_host": "udp://a:514"});
        let state = provider.apply("vsphere_host_config_syslog", None, &config).await.unwrap();
        assert_eq!(state.attributes["log_level"], json!("info"));

        let config = json!({"host_system_id": id, "log_host": "udp://b:514"});
        let next = provider.apply("vsphere_host_config_syslog", Some(&state), &config).await.unwrap();
        assert_eq!(next.id, state.id);
        assert_eq!(
            sim.advanced_option(&id, tpv_vsphere::types::SYSLOG_LOG_HOST_KEY),
            Some(json!("udp://b:514"))
        );
    }

    #[tokio::test]
    async fn force_new_change_replaces() {
        let (sim, provider, id) = lab();
        let dc = sim.add_datacenter("dc2");
        let other = sim.add_host(&dc, "esxi-02.lab").unwrap();

        let state = provider
            .apply("vsphere_iscsi_software_adapter", None, &json!({"host_system_id": id}))
            .await
            .unwrap();
        let next = provider
            .apply("vsphere_iscsi_software_adapter", Some(&state), &json!({"host_system_id": other}))
            .await
            .unwrap();

        assert!(next.id.starts_with(&other));
        assert!(!sim.storage(&id).unwrap().software_internet_scsi_enabled);
        assert!(sim.storage(&other).unwrap().software_internet_scsi_enabled);
    }

    #[tokio::test]
    async fn refresh_drops_vanished_datastore() {
        let (sim, provider, id) = lab();
        let config = json!({
            "name": "nfs01",
            "host_system_ids": [id],
            "remote_hosts": ["nas.lab"],
            "remote_path": "/export/nfs01"
        });
        let state = provider.apply("vsphere_nas_datastore", None, &config).await.unwrap();
        assert_ok!(provider.refresh("vsphere_nas_datastore", &state).await);

        sim.remove_datastore(&id, &state.id).await.unwrap();
        let refreshed = provider.refresh("vsphere_nas_datastore", &state).await.unwrap();
        assert!(refreshed.is_none());
    }

    #[tokio::test]
    async fn import_then_destroy() {
        let (sim, provider, id) = lab();
        let state = provider
            .apply("vsphere_host_config_syslog", None, &json!({"hostname": "esxi-01.lab", "log_host": "udp://a:514"}))
            .await
            .unwrap();

        let imported = provider.import("vsphere_host_config_syslog", &id).await.unwrap();
        assert_eq!(imported.id, id);
        assert_eq!(imported.attributes["log_host"], json!("udp://a:514"));

        assert_ok!(provider.destroy("vsphere_host_config_syslog", &state).await);
        assert_eq!(
            sim.advanced_option(&id, tpv_vsphere::types::SYSLOG_LOG_HOST_KEY),
            Some(json!(""))
        );
    }

    #[tokio::test]
    async fn data_source_read() {
        let (_, provider, id) = lab();
        let state = provider
            .read_data_source("vsphere_host_config_date_time", &json!({"host_system_id": id}))
            .await
            .unwrap();
        assert_eq!(state.id, id);
        assert_eq!(state.attributes["protocol"], json!("ntp"));
    }
}
