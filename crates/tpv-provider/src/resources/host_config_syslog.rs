//! `vsphere_host_config_syslog`: remote syslog target of a host.

use crate::error::{ProviderError, ProviderResult};
use crate::host;
use crate::resource::Resource;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, ValueType};

use async_trait::async_trait;
use tpv_vsphere::types::{
    HostSummary, OptionValue, SYSLOG_LOG_HOST_KEY as LOG_HOST_KEY, SYSLOG_LOG_LEVEL_KEY as LOG_LEVEL_KEY,
};
use tpv_vsphere::VsphereApi;

pub const TYPE_NAME: &str = "vsphere_host_config_syslog";

const SYSLOG_PREFIX: &str = "Syslog.global.";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["error", "warning", "info", "verbose", "debug"];

pub struct HostConfigSyslog;

/// Read `log_host` / `log_level` into `d` and set the ID from the host identifier.
pub(crate) async fn read_syslog(api: &dyn VsphereApi, d: &mut ResourceData, context: &str) -> ProviderResult<()> {
    let (host, ident) = host::resolve(api, d, context).await?;
    let options = api
        .advanced_options(&host.host, SYSLOG_PREFIX)
        .await
        .map_err(|e| ProviderError::api(format!("error reading syslog options of host '{}'", host.name), e))?;

    let value = |key: &str| {
        options
            .iter()
            .find(|o| o.key == key)
            .and_then(OptionValue::as_str)
            .unwrap_or_default()
            .to_string()
    };
    d.set("log_host", value(LOG_HOST_KEY));
    let level = value(LOG_LEVEL_KEY);
    d.set("log_level", if level.is_empty() { DEFAULT_LOG_LEVEL.to_string() } else { level });

    d.set_id(ident.value.clone());
    host::record_identifier(d, &ident);
    Ok(())
}

async fn write_syslog(api: &dyn VsphereApi, host: &HostSummary, log_host: &str, log_level: &str) -> ProviderResult<()> {
    if !LOG_LEVELS.contains(&log_level) {
        return Err(ProviderError::validation(format!(
            "'log_level' must be one of {}, got '{log_level}'",
            LOG_LEVELS.join(", ")
        )));
    }
    log::info!("Setting syslog target of host {} to {log_host:?} ({log_level})", host.name);
    let options = [OptionValue::new(LOG_HOST_KEY, log_host), OptionValue::new(LOG_LEVEL_KEY, log_level)];
    api.update_advanced_options(&host.host, &options)
        .await
        .map_err(|e| ProviderError::api(format!("error updating syslog options of host '{}'", host.name), e))
}

#[async_trait]
impl Resource for HostConfigSyslog {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        host::selector_schema(true)
            .attr(
                "log_host",
                Attribute::required(ValueType::String).describe("The remote host to send logs to, e.g. udp://10.0.0.5:514."),
            )
            .attr(
                "log_level",
                Attribute::optional(ValueType::String)
                    .default_value(DEFAULT_LOG_LEVEL)
                    .describe("The log level for the syslog daemon."),
            )
    }

    async fn create(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, ident) = host::resolve(api, d, "syslog").await?;
        write_syslog(api, &host, d.get_str("log_host"), d.get_str("log_level")).await?;
        d.set_id(ident.value);
        self.read(api, d).await
    }

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        read_syslog(api, d, "syslog read").await
    }

    async fn update(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        if d.has_change("log_host") || d.has_change("log_level") {
            let (host, _) = host::resolve(api, d, "syslog update").await?;
            write_syslog(api, &host, d.get_str("log_host"), d.get_str("log_level")).await?;
        }
        self.read(api, d).await
    }

    async fn delete(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, _) = host::resolve(api, d, "syslog delete").await?;
        write_syslog(api, &host, "", DEFAULT_LOG_LEVEL).await
    }

    async fn import(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        host::import_by_host(api, d, "syslog import").await
    }
}
