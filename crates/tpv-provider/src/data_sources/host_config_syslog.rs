//! `vsphere_host_config_syslog` data source.

use crate::error::ProviderResult;
use crate::host;
use crate::resource::DataSource;
use crate::resource_data::ResourceData;
use crate::resources::host_config_syslog::{read_syslog, TYPE_NAME};
use crate::schema::{Attribute, Schema, ValueType};

use async_trait::async_trait;
use tpv_vsphere::VsphereApi;

pub struct HostConfigSyslogData;

#[async_trait]
impl DataSource for HostConfigSyslogData {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        host::selector_schema(false)
            .attr("log_host", Attribute::computed(ValueType::String))
            .attr("log_level", Attribute::computed(ValueType::String))
    }

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        read_syslog(api, d, "'vsphere_host_config_syslog' on data source read").await
    }
}
