//! `vsphere_vcenter_dns`: the static DNS servers of the vCenter appliance.

use crate::error::{ProviderError, ProviderResult};
use crate::resource::Resource;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, ValueType};

use async_trait::async_trait;
use serde_json::json;
use tpv_vsphere::VsphereApi;

pub const TYPE_NAME: &str = "vsphere_vcenter_dns";

/// The appliance has exactly one DNS configuration.
pub const VCENTER_DNS_ID: &str = "tf-vcenter-dns";

const STATIC_MODE: &str = "is_static";

pub struct VcenterDns;

/// PUT the server list, trying the `config`-wrapped body older appliances
/// expect before the flat body newer ones expect.
async fn put_servers(api: &dyn VsphereApi, servers: &[String]) -> ProviderResult<()> {
    let wrapped = json!({"config": {"mode": STATIC_MODE, "servers": servers}});
    if let Err(first) = api.put_dns_servers(&wrapped).await {
        log::debug!("Wrapped DNS payload rejected ({first}), retrying with flat payload");
        let flat = json!({"mode": STATIC_MODE, "servers": servers});
        api.put_dns_servers(&flat).await.map_err(|e| {
            ProviderError::api("error making update request for dns server config", e)
        })?;
    }
    Ok(())
}

async fn read_servers(api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
    let cfg = api
        .dns_servers()
        .await
        .map_err(|e| ProviderError::api("error retrieving dns servers response", e))?;
    d.set_string_set("servers", cfg.servers);
    Ok(())
}

#[async_trait]
impl Resource for VcenterDns {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new().attr(
            "servers",
            Attribute::required(ValueType::StringSet).describe("List of the DNS servers to use."),
        )
    }

    async fn create(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        put_servers(api, &d.get_string_set("servers")).await?;
        d.set_id(VCENTER_DNS_ID);
        Ok(())
    }

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        read_servers(api, d).await
    }

    async fn update(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        put_servers(api, &d.get_string_set("servers")).await
    }

    async fn delete(&self, api: &dyn VsphereApi, _d: &mut ResourceData) -> ProviderResult<()> {
        put_servers(api, &[]).await.map_err(|e| ProviderError {
            message: format!("error deleting dns server config: {}", e.message),
            ..e
        })
    }

    async fn import(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        read_servers(api, d).await?;
        d.set_id(VCENTER_DNS_ID);
        Ok(())
    }
}
