//! `vsphere_host_config_date_time`: NTP and clock settings of a host.

use crate::error::{ProviderError, ProviderResult};
use crate::host;
use crate::resource::DataSource;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, ValueType};

use async_trait::async_trait;
use tpv_vsphere::VsphereApi;

pub const TYPE_NAME: &str = "vsphere_host_config_date_time";

pub struct HostConfigDateTime;

#[async_trait]
impl DataSource for HostConfigDateTime {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        host::selector_schema(false)
            .attr(
                "ntp_servers",
                Attribute::computed(ValueType::StringSet).describe("NTP servers configured on the host."),
            )
            .attr(
                "protocol",
                Attribute::computed(ValueType::String).describe("Protocol used to keep the clock in sync."),
            )
            .attr("events_disabled", Attribute::computed(ValueType::Bool))
            .attr("fallback_disabled", Attribute::computed(ValueType::Bool))
    }

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, ident) = host::resolve(api, d, "'vsphere_host_config_date_time' on data source read").await?;

        log::info!("Reading date time configuration for data source on host '{}'", host.name);

        let info = api.date_time_info(&host.host).await.map_err(|e| {
            ProviderError::api(format!("error trying to gather datetime properties from host '{}'", host.name), e)
        })?;

        d.set_id(ident.value.clone());
        host::record_identifier(d, &ident);
        d.set("protocol", info.system_clock_protocol);
        d.set("events_disabled", info.disable_events);
        d.set("fallback_disabled", info.disable_fallback);
        d.set_string_set("ntp_servers", info.ntp_servers);
        Ok(())
    }
}
