//! ESXi host inventory and host configuration via the REST API.

use crate::error::{VsphereError, VsphereResult};
use crate::types::*;
use crate::vsphere::VsphereClient;

use serde::{Deserialize, Serialize};

/// Path prefix for per-host configuration endpoints.
pub(crate) fn esx_host_path(host_id: &str) -> String {
    format!("/api/esx/hosts/{host_id}")
}

/// Host inventory and configuration operations.
pub struct HostManager<'a> {
    client: &'a VsphereClient,
}

#[derive(Serialize)]
struct EnterMaintenanceSpec {
    timeout: u64,
    evacuate_powered_off_vms: bool,
}

#[derive(Serialize)]
struct ExitMaintenanceSpec {
    timeout: u64,
}

#[derive(Serialize)]
struct AdvancedOptionsUpdate<'o> {
    options: &'o [OptionValue],
}

#[derive(Deserialize)]
struct AdvancedOptionsList {
    #[serde(default)]
    options: Vec<OptionValue>,
}

impl<'a> HostManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    // ── Inventory ───────────────────────────────────────────────────

    /// List all datacenters. A standalone host exposes only its implicit one.
    pub async fn list_datacenters(&self, api_type: ApiType) -> VsphereResult<Vec<DatacenterSummary>> {
        match api_type {
            ApiType::VirtualCenter => {
                self.client
                    .get::<Vec<DatacenterSummary>>("/api/vcenter/datacenter")
                    .await
            }
            ApiType::HostAgent => Ok(vec![DatacenterSummary {
                datacenter: HA_DATACENTER.to_string(),
                name: HA_DATACENTER.to_string(),
            }]),
        }
    }

    /// List hosts in a datacenter.
    pub async fn list_hosts_in_datacenter(
        &self,
        api_type: ApiType,
        datacenter: &str,
    ) -> VsphereResult<Vec<HostSummary>> {
        let (path, params) = host_listing_request(api_type, HostFilter::Datacenter(datacenter));
        self.client.get_with_params::<Vec<HostSummary>>(path, &params).await
    }

    /// Look a host up by managed-object ID.
    pub async fn get_host(&self, api_type: ApiType, host_id: &str) -> VsphereResult<HostSummary> {
        let (path, params) = host_listing_request(api_type, HostFilter::Host(host_id));
        let hosts = self.client.get_with_params::<Vec<HostSummary>>(path, &params).await?;
        hosts
            .into_iter()
            .find(|h| h.host == host_id)
            .ok_or_else(|| VsphereError::managed_object_not_found("HostSystem", host_id))
    }

    /// Connection state and maintenance flag.
    pub async fn get_runtime(&self, host_id: &str) -> VsphereResult<HostRuntimeInfo> {
        let path = format!("{}/runtime", esx_host_path(host_id));
        self.client
            .get::<HostRuntimeInfo>(&path)
            .await
            .map_err(|e| not_found_as_missing_host(e, host_id))
    }

    // ── Maintenance mode ────────────────────────────────────────────

    /// Start entering maintenance mode; returns the task ID.
    pub async fn enter_maintenance_mode(
        &self,
        host_id: &str,
        timeout_secs: u64,
        evacuate: bool,
    ) -> VsphereResult<String> {
        let path = format!("{}/maintenance?action=enter&vmw-task=true", esx_host_path(host_id));
        let spec = EnterMaintenanceSpec { timeout: timeout_secs, evacuate_powered_off_vms: evacuate };
        self.client.post::<_, String>(&path, &spec).await
    }

    /// Start exiting maintenance mode; returns the task ID.
    pub async fn exit_maintenance_mode(&self, host_id: &str, timeout_secs: u64) -> VsphereResult<String> {
        let path = format!("{}/maintenance?action=exit&vmw-task=true", esx_host_path(host_id));
        self.client
            .post::<_, String>(&path, &ExitMaintenanceSpec { timeout: timeout_secs })
            .await
    }

    // ── Configuration ───────────────────────────────────────────────

    pub async fn get_date_time(&self, host_id: &str) -> VsphereResult<HostDateTimeInfo> {
        let path = format!("{}/date-time", esx_host_path(host_id));
        self.client.get::<HostDateTimeInfo>(&path).await
    }

    /// Advanced options whose key starts with `prefix`.
    pub async fn get_advanced_options(
        &self,
        host_id: &str,
        prefix: &str,
    ) -> VsphereResult<Vec<OptionValue>> {
        let path = format!("{}/advanced-options", esx_host_path(host_id));
        let list = self
            .client
            .get_with_params::<AdvancedOptionsList>(&path, &[("prefix".into(), prefix.to_string())])
            .await?;
        Ok(list.options)
    }

    pub async fn update_advanced_options(
        &self,
        host_id: &str,
        options: &[OptionValue],
    ) -> VsphereResult<()> {
        let path = format!("{}/advanced-options", esx_host_path(host_id));
        self.client.patch(&path, &AdvancedOptionsUpdate { options }).await
    }

    pub async fn get_snmp(&self, host_id: &str) -> VsphereResult<HostSnmpConfig> {
        let path = format!("{}/snmp", esx_host_path(host_id));
        self.client.get::<HostSnmpConfig>(&path).await
    }

    pub async fn set_snmp(&self, host_id: &str, config: &HostSnmpConfig) -> VsphereResult<()> {
        let path = format!("{}/snmp", esx_host_path(host_id));
        self.client.put(&path, config).await
    }

    pub async fn reset_snmp(&self, host_id: &str) -> VsphereResult<()> {
        let path = format!("{}/snmp?action=reset", esx_host_path(host_id));
        self.client.post_empty(&path).await
    }
}

/// What a host listing is narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostFilter<'f> {
    Datacenter(&'f str),
    Host(&'f str),
}

/// Listing path and query for the endpoint type.
///
/// vCenter serves `/api/vcenter/host` with datacenter / host filters. A
/// standalone ESXi host only lists itself under `/api/esx/hosts`, and the
/// caller picks the wanted ID out of that list.
pub(crate) fn host_listing_request(api_type: ApiType, filter: HostFilter<'_>) -> (&'static str, Vec<(String, String)>) {
    match (api_type, filter) {
        (ApiType::VirtualCenter, HostFilter::Datacenter(dc)) => {
            ("/api/vcenter/host", vec![("datacenters".into(), dc.to_string())])
        }
        (ApiType::VirtualCenter, HostFilter::Host(id)) => ("/api/vcenter/host", vec![("hosts".into(), id.to_string())]),
        (ApiType::HostAgent, _) => ("/api/esx/hosts", Vec::new()),
    }
}

/// Per-host endpoints answer 404 when the host itself is gone.
pub(crate) fn not_found_as_missing_host(e: VsphereError, host_id: &str) -> VsphereError {
    if e.kind == crate::error::VsphereErrorKind::NotFound {
        VsphereError::managed_object_not_found("HostSystem", host_id)
    } else {
        e
    }
}
