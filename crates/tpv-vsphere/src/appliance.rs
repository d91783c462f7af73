//! vCenter appliance networking settings.

use crate::error::VsphereResult;
use crate::types::DnsServerConfig;
use crate::vsphere::VsphereClient;

pub const DNS_SERVERS_PATH: &str = "/api/appliance/networking/dns/servers";

/// Appliance operations.
pub struct ApplianceManager<'a> {
    client: &'a VsphereClient,
}

impl<'a> ApplianceManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    pub async fn get_dns_servers(&self) -> VsphereResult<DnsServerConfig> {
        self.client.get::<DnsServerConfig>(DNS_SERVERS_PATH).await
    }

    /// PUT a raw body; the accepted shape differs between appliance versions.
    pub async fn put_dns_servers(&self, body: &serde_json::Value) -> VsphereResult<()> {
        self.client.put(DNS_SERVERS_PATH, body).await
    }
}
