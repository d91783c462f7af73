//! `vsphere_host_config_snmp`: the SNMP agent of a host.

use crate::error::{ProviderError, ProviderResult};
use crate::host;
use crate::resource::Resource;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, ValueType};

use async_trait::async_trait;
use tpv_vsphere::types::{HostSnmpConfig, SnmpTrapTarget};
use tpv_vsphere::VsphereApi;

pub const TYPE_NAME: &str = "vsphere_host_config_snmp";

const DEFAULT_SNMP_PORT: u16 = 161;

pub struct HostConfigSnmp;

fn expand_snmp_config(d: &ResourceData) -> ProviderResult<HostSnmpConfig> {
    let port = d.get_int("port").unwrap_or(i64::from(DEFAULT_SNMP_PORT));
    let port = u16::try_from(port)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| ProviderError::validation(format!("'port' must be between 1 and 65535, got {port}")))?;

    let trap_targets = d
        .get_string_set("trap_targets")
        .iter()
        .map(|raw| SnmpTrapTarget::parse(raw).map_err(|e| ProviderError::validation(e.message)))
        .collect::<ProviderResult<Vec<_>>>()?;

    Ok(HostSnmpConfig {
        enabled: d.get("enabled").and_then(|v| v.as_bool()).unwrap_or(true),
        port,
        read_only_communities: d.get_string_set("read_only_communities"),
        trap_targets,
        sys_location: d.get_str("sys_location").to_string(),
        sys_contact: d.get_str("sys_contact").to_string(),
    })
}

fn flatten_snmp_config(d: &mut ResourceData, cfg: &HostSnmpConfig) {
    d.set("enabled", cfg.enabled);
    d.set("port", cfg.port);
    d.set_string_set("read_only_communities", cfg.read_only_communities.iter().cloned());
    d.set_string_set("trap_targets", cfg.trap_targets.iter().map(ToString::to_string));
    d.set("sys_location", cfg.sys_location.clone());
    d.set("sys_contact", cfg.sys_contact.clone());
}

#[async_trait]
impl Resource for HostConfigSnmp {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        host::selector_schema(true)
            .attr(
                "enabled",
                Attribute::optional(ValueType::Bool).default_value(true).describe("Whether the SNMP agent runs."),
            )
            .attr(
                "port",
                Attribute::optional(ValueType::Int)
                    .default_value(DEFAULT_SNMP_PORT)
                    .describe("UDP port the agent listens on."),
            )
            .attr(
                "read_only_communities",
                Attribute::optional(ValueType::StringSet).sensitive().describe("Read-only community strings."),
            )
            .attr(
                "trap_targets",
                Attribute::optional(ValueType::StringSet).describe("Trap receivers as <host>:<port>/<community>."),
            )
            .attr("sys_location", Attribute::optional(ValueType::String))
            .attr("sys_contact", Attribute::optional(ValueType::String))
    }

    async fn create(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, ident) = host::resolve(api, d, "snmp").await?;
        let cfg = expand_snmp_config(d)?;
        log::info!("Configuring SNMP agent on host {} (enabled: {})", host.name, cfg.enabled);
        api.reconfigure_snmp(&host.host, &cfg)
            .await
            .map_err(|e| ProviderError::api(format!("error configuring snmp on host '{}'", host.name), e))?;
        d.set_id(ident.value);
        self.read(api, d).await
    }

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, ident) = host::resolve(api, d, "snmp read").await?;
        let cfg = api
            .snmp_config(&host.host)
            .await
            .map_err(|e| ProviderError::api(format!("error reading snmp config of host '{}'", host.name), e))?;
        flatten_snmp_config(d, &cfg);
        d.set_id(ident.value.clone());
        host::record_identifier(d, &ident);
        Ok(())
    }

    async fn update(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, _) = host::resolve(api, d, "snmp update").await?;
        let cfg = expand_snmp_config(d)?;
        api.reconfigure_snmp(&host.host, &cfg)
            .await
            .map_err(|e| ProviderError::api(format!("error updating snmp on host '{}'", host.name), e))?;
        self.read(api, d).await
    }

    async fn delete(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, _) = host::resolve(api, d, "snmp delete").await?;
        api.reset_snmp(&host.host)
            .await
            .map_err(|e| ProviderError::api(format!("error resetting snmp on host '{}'", host.name), e))
    }

    async fn import(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        host::import_by_host(api, d, "snmp import").await
    }
}
